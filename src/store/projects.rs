use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{CreateProjectInput, Project};
use crate::store::{CreateBackend, Entity, ResourceBackend, ResourceStore};
use crate::validation::require_min_len;

// ============================================================================
// Backend
// ============================================================================

impl Entity for Project {
    fn id(&self) -> &str {
        &self.id
    }
}

pub struct ProjectsBackend {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceBackend for ProjectsBackend {
    type Item = Project;
    /// Owning team id.
    type Scope = String;

    async fn list(&self, team_id: &String) -> Result<Vec<Project>, AppError> {
        self.api.projects_by_team(team_id).await
    }
}

#[async_trait]
impl CreateBackend for ProjectsBackend {
    type CreateInput = CreateProjectInput;

    async fn create(&self, input: &CreateProjectInput) -> Result<Project, AppError> {
        require_min_len("project name", &input.name, 2)?;
        self.api.create_project(input).await
    }
}

// ============================================================================
// Store
// ============================================================================

pub type ProjectStore = ResourceStore<ProjectsBackend>;

impl ResourceStore<ProjectsBackend> {
    pub fn with_api(api: Arc<ApiClient>) -> Self {
        ResourceStore::new(ProjectsBackend { api })
    }

    /// `GET /projects/{id}` -- fetch one project directly, used when a view
    /// lands on a project and needs its owning team before the listing is
    /// loaded.
    pub async fn get(&self, id: &str) -> Result<Project, AppError> {
        self.backend.api.project(id).await
    }
}
