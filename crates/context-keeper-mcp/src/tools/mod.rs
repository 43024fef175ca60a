//! MCP tool implementations.
//!
//! Each tool:
//! 1. Parses and validates its input parameters
//! 2. Reads or writes the project context store
//! 3. Replies with plain text or Markdown

mod context;

pub use context::*;

use crate::error::{ToolError, ToolResult};
use crate::server::oauth::GrantContext;
use crate::store::ContextStore;

/// Tool execution context, built per request after bearer verification.
pub struct ToolContext {
    /// Project context store.
    pub contexts: ContextStore,

    /// Verified grant of the calling client.
    pub grant: GrantContext,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(contexts: ContextStore, grant: GrantContext) -> Self {
        Self { contexts, grant }
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "save_context").
    fn name(&self) -> &'static str;

    /// Tool description for LLM.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given input.
    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<String>;
}

/// Register all tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![Box::new(context::SaveContextTool), Box::new(context::GetContextTool)]
}

/// Find a tool by name and run it.
pub async fn call_tool(
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
    name: &str,
    arguments: serde_json::Value,
) -> ToolResult<String> {
    let tool = tools
        .iter()
        .find(|t| t.name() == name)
        .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

    tracing::info!(tool = %name, client_id = %ctx.grant.client_id, "Executing tool");
    tool.execute(ctx, arguments).await
}
