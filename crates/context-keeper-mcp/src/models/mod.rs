//! Data models for project context management.

mod context;

pub use context::{GetContextInput, ProjectContext, SaveContextInput};
