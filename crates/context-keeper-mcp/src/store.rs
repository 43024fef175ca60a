//! In-memory project context store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::ProjectContext;

/// Project contexts keyed by project name. Clones share the same map.
#[derive(Clone, Default)]
pub struct ContextStore {
    projects: Arc<RwLock<HashMap<String, ProjectContext>>>,
}

impl ContextStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a project's context, returning the previous one.
    pub async fn save(&self, context: ProjectContext) -> Option<ProjectContext> {
        self.projects.write().await.insert(context.project.clone(), context)
    }

    pub async fn get(&self, project: &str) -> Option<ProjectContext> {
        self.projects.read().await.get(project).cloned()
    }

    /// Number of stored projects.
    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.projects.read().await.is_empty()
    }
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore").finish()
    }
}
