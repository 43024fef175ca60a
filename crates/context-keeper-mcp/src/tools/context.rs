//! Context tools: save_context, get_context.

use chrono::Utc;
use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::models::{GetContextInput, ProjectContext, SaveContextInput};

/// Save a project's current state.
pub struct SaveContextTool;

#[async_trait::async_trait]
impl McpTool for SaveContextTool {
    fn name(&self) -> &'static str {
        "save_context"
    }

    fn description(&self) -> &'static str {
        "Save the current state of a project."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "project": {"type": "string", "description": "Project name"},
                "status": {"type": "string", "description": "Current status"},
                "completed": {"type": "string", "description": "What has been completed"},
                "working_on": {"type": "string", "description": "What is being worked on now"},
                "next": {"type": "string", "description": "What comes next"},
                "notes": {"type": "string", "description": "Additional notes"}
            },
            "required": ["project", "status"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: SaveContextInput = serde_json::from_value(input)?;
        let project = required("project", params.project)?;

        let status = params.status;
        ctx.contexts
            .save(ProjectContext {
                project: project.clone(),
                status: status.clone(),
                completed: params.completed,
                working_on: params.working_on,
                next: params.next,
                notes: params.notes,
                timestamp: Utc::now(),
                client_id: ctx.grant.client_id.clone(),
            })
            .await;

        tracing::info!(project = %project, client_id = %ctx.grant.client_id, "Saved project context");

        Ok(format!("Saved context for {project}\nStatus: {status}"))
    }
}

/// Fetch a project's saved state.
pub struct GetContextTool;

#[async_trait::async_trait]
impl McpTool for GetContextTool {
    fn name(&self) -> &'static str {
        "get_context"
    }

    fn description(&self) -> &'static str {
        "Get the saved state of a project."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "project": {"type": "string", "description": "Project name"}
            },
            "required": ["project"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: GetContextInput = serde_json::from_value(input)?;
        let project = required("project", params.project)?;

        Ok(match ctx.contexts.get(&project).await {
            Some(saved) => saved.to_markdown(),
            None => format!("Project {project} not found"),
        })
    }
}

fn required(field: &str, value: String) -> ToolResult<String> {
    if value.trim().is_empty() {
        return Err(ToolError::validation(field, "cannot be empty"));
    }
    Ok(value)
}
