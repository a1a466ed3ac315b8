//! Prompt types for the synthesis boundary.

use serde::{Deserialize, Serialize};

/// A fully built prompt ready for synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt, recorded alongside run artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Question the prompt was built for
    pub question: String,

    /// Ranker strategy used for retrieval
    pub ranker: String,

    /// Primary section ids in rank order
    #[serde(rename = "primarySections")]
    pub primary_sections: Vec<String>,

    /// Referenced section ids pulled in by expansion
    #[serde(rename = "referencedSections")]
    pub referenced_sections: Vec<String>,

    /// Rendered context size in characters
    #[serde(rename = "contextChars")]
    pub context_chars: usize,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        system: Option<String>,
        user: String,
        question: String,
        ranker: String,
        primary_sections: Vec<String>,
        referenced_sections: Vec<String>,
        context_chars: usize,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                question,
                ranker,
                primary_sections,
                referenced_sections,
                context_chars,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_prompt_creation() {
        let built = BuiltPrompt::new(
            None,
            "User message".to_string(),
            "minimum ceiling height".to_string(),
            "keyword".to_string(),
            vec!["9.5.3.1.".to_string()],
            vec![],
            42,
        );

        assert!(built.system.is_none());
        assert_eq!(built.user, "User message");
        assert_eq!(built.metadata.question, "minimum ceiling height");
        assert_eq!(built.metadata.primary_sections, vec!["9.5.3.1."]);
        assert_eq!(built.metadata.context_chars, 42);
    }

    #[test]
    fn test_metadata_serializes_with_camel_case_keys() {
        let built = BuiltPrompt::new(
            None,
            "u".to_string(),
            "q".to_string(),
            "keyword".to_string(),
            vec![],
            vec![],
            0,
        );
        let json = serde_json::to_string(&built.metadata).unwrap();
        assert!(json.contains("primarySections"));
        assert!(json.contains("contextChars"));
    }
}
