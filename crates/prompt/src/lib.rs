//! Prompt construction for answer synthesis.
//!
//! This crate turns a question and an assembled context string into the
//! final synthesis prompt:
//! - Handlebars template rendering
//! - Built-in default template with a citation instruction
//! - Per-workspace template override (`.coderag/prompt.hbs`)

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, PromptInputs, DEFAULT_TEMPLATE};
pub use loader::load_template;
pub use types::{BuiltPrompt, BuiltPromptMetadata};
