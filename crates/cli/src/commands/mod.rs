//! Command handlers for the CodeRAG CLI.

pub mod ask;
pub mod sections;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use sections::SectionsCommand;
pub use stats::StatsCommand;
