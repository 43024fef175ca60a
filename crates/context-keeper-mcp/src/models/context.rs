//! Project context records and the tool inputs that produce them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Saved state of a project, as last reported by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the record was last saved.
    pub timestamp: DateTime<Utc>,
    /// Client whose access token saved the record.
    pub client_id: String,
}

impl ProjectContext {
    /// Render as the Markdown summary returned by `get_context`.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        format!(
            "**{project}**\n\n\
             **Status:** {status}\n\n\
             **Completed:** {completed}\n\n\
             **Working on:** {working_on}\n\n\
             **Next:** {next}\n\n\
             **Notes:** {notes}\n\n\
             **Last updated:** {timestamp}",
            project = self.project,
            status = self.status,
            completed = or_placeholder(self.completed.as_deref(), "Not specified"),
            working_on = or_placeholder(self.working_on.as_deref(), "Not specified"),
            next = or_placeholder(self.next.as_deref(), "Not specified"),
            notes = or_placeholder(self.notes.as_deref(), "None"),
            timestamp = self.timestamp.to_rfc3339(),
        )
    }
}

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(placeholder)
}

/// Input for `save_context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveContextInput {
    /// Project name.
    pub project: String,

    /// Current status.
    pub status: String,

    /// What has been completed.
    #[serde(default)]
    pub completed: Option<String>,

    /// What is being worked on right now.
    #[serde(default)]
    pub working_on: Option<String>,

    /// What comes next.
    #[serde(default)]
    pub next: Option<String>,

    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for `get_context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetContextInput {
    /// Project name.
    pub project: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProjectContext {
        ProjectContext {
            project: "keeper".into(),
            status: "testing".into(),
            completed: Some("oauth".into()),
            working_on: None,
            next: Some(String::new()),
            notes: None,
            timestamp: Utc::now(),
            client_id: "c1".into(),
        }
    }

    #[test]
    fn test_markdown_placeholders() {
        let md = sample().to_markdown();
        assert!(md.starts_with("**keeper**"));
        assert!(md.contains("**Status:** testing"));
        assert!(md.contains("**Completed:** oauth"));
        assert!(md.contains("**Working on:** Not specified"));
        assert!(md.contains("**Next:** Not specified"));
        assert!(md.contains("**Notes:** None"));
    }

    #[test]
    fn test_save_input_requires_status() {
        let result: Result<SaveContextInput, _> = serde_json::from_value(serde_json::json!({"project": "p"}));
        assert!(result.is_err());
    }
}
