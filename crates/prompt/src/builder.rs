//! Prompt builder for rendering the synthesis template.

use crate::types::BuiltPrompt;
use coderag_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;

/// Default synthesis template.
///
/// The closing instruction keeps answers anchored to the retrieved text:
/// the synthesizer is asked to cite section numbers rather than answer from
/// its own training data.
pub const DEFAULT_TEMPLATE: &str = "\
You are an expert on building code requirements. Answer the question using \
only the sections provided below.

Question: {{question}}

{{#if context}}
Relevant Building Code Sections:
{{context}}

Based on the above sections and tables, please provide a comprehensive answer.
Always cite specific section numbers when referencing requirements.
{{else}}
No relevant sections were found for this question. State that the retrieved \
code text does not cover it; do not answer from general knowledge.
{{/if}}";

#[derive(Serialize)]
struct TemplateVars<'a> {
    question: &'a str,
    context: &'a str,
}

/// Inputs for prompt construction, carried into the prompt metadata.
pub struct PromptInputs<'a> {
    pub question: &'a str,
    pub context: &'a str,
    pub ranker: &'a str,
    pub primary_sections: Vec<String>,
    pub referenced_sections: Vec<String>,
}

/// Build the synthesis prompt from a question and rendered context.
///
/// `template` is a Handlebars template with `{{question}}` and `{{context}}`
/// variables; pass [`DEFAULT_TEMPLATE`] unless the workspace overrides it.
pub fn build_prompt(template: &str, inputs: PromptInputs<'_>) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        "Building prompt ({} primary, {} referenced sections)",
        inputs.primary_sections.len(),
        inputs.referenced_sections.len()
    );

    let user = render_template(
        template,
        &TemplateVars {
            question: inputs.question,
            context: inputs.context,
        },
    )?;

    Ok(BuiltPrompt::new(
        None,
        user,
        inputs.question.to_string(),
        inputs.ranker.to_string(),
        inputs.primary_sections,
        inputs.referenced_sections,
        inputs.context.len(),
    ))
}

/// Render a Handlebars template with variables.
fn render_template<T: Serialize>(template: &str, variables: &T) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(question: &'a str, context: &'a str) -> PromptInputs<'a> {
        PromptInputs {
            question,
            context,
            ranker: "keyword",
            primary_sections: vec!["9.5.3.1.".to_string()],
            referenced_sections: vec![],
        }
    }

    #[test]
    fn test_default_template_includes_question_and_context() {
        let built = build_prompt(
            DEFAULT_TEMPLATE,
            inputs("minimum ceiling height", "Section text here."),
        )
        .unwrap();

        assert!(built.user.contains("Question: minimum ceiling height"));
        assert!(built.user.contains("Section text here."));
        assert!(built.user.contains("cite specific section numbers"));
    }

    #[test]
    fn test_empty_context_uses_no_results_branch() {
        let built = build_prompt(DEFAULT_TEMPLATE, inputs("obscure question", "")).unwrap();

        assert!(built.user.contains("No relevant sections were found"));
        assert!(!built.user.contains("Relevant Building Code Sections:"));
        assert_eq!(built.metadata.context_chars, 0);
    }

    #[test]
    fn test_custom_template_override() {
        let built = build_prompt("Q={{question}} C={{context}}", inputs("a", "b")).unwrap();
        assert_eq!(built.user, "Q=a C=b");
    }

    #[test]
    fn test_invalid_template_is_a_prompt_error() {
        let result = build_prompt("{{#if}}", inputs("a", "b"));
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_no_html_escaping() {
        let built = build_prompt(
            DEFAULT_TEMPLATE,
            inputs("when is <b>bold</b> ok", "Height > 2.3 m & < 3 m"),
        )
        .unwrap();
        assert!(built.user.contains("<b>bold</b>"));
        assert!(built.user.contains("> 2.3 m & <"));
    }
}
