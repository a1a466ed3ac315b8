//! Workspace template override loading.

use coderag_core::{AppError, AppResult};
use std::path::Path;

/// Relative path of the per-workspace template override.
const TEMPLATE_OVERRIDE: &str = ".coderag/prompt.hbs";

/// Load the workspace's prompt template override, if one exists.
///
/// Returns `None` when the workspace has no override, so callers fall back
/// to [`crate::builder::DEFAULT_TEMPLATE`]. An override that exists but
/// cannot be read or lacks a `{{context}}` variable is an error: silently
/// dropping a broken override would synthesize from the wrong prompt.
pub fn load_template(workspace: &Path) -> AppResult<Option<String>> {
    let path = workspace.join(TEMPLATE_OVERRIDE);
    if !path.exists() {
        return Ok(None);
    }

    let template = std::fs::read_to_string(&path)?;
    if !template.contains("{{context}}") {
        return Err(AppError::Prompt(format!(
            "Template override {} has no {{{{context}}}} variable",
            path.display()
        )));
    }

    tracing::info!("Using prompt template override: {}", path.display());
    Ok(Some(template))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_override_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_template(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_override_is_loaded() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".coderag")).unwrap();
        std::fs::write(
            dir.path().join(TEMPLATE_OVERRIDE),
            "Custom: {{question}} {{context}}",
        )
        .unwrap();

        let template = load_template(dir.path()).unwrap().unwrap();
        assert!(template.starts_with("Custom:"));
    }

    #[test]
    fn test_override_without_context_variable_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".coderag")).unwrap();
        std::fs::write(dir.path().join(TEMPLATE_OVERRIDE), "Just {{question}}").unwrap();

        assert!(matches!(
            load_template(dir.path()),
            Err(AppError::Prompt(_))
        ));
    }
}
