use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{AddMemberInput, CreateTeamInput, MemberRole, Team, User};
use crate::store::{CreateBackend, Entity, ResourceBackend, ResourceStore};
use crate::validation::{require_min_len, require_non_empty};

// ============================================================================
// Backend
// ============================================================================

impl Entity for Team {
    fn id(&self) -> &str {
        &self.id
    }
}

pub struct TeamsBackend {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceBackend for TeamsBackend {
    type Item = Team;
    // The teams listing is global, not parented to anything.
    type Scope = ();

    async fn list(&self, _scope: &()) -> Result<Vec<Team>, AppError> {
        self.api.teams().await
    }
}

#[async_trait]
impl CreateBackend for TeamsBackend {
    type CreateInput = CreateTeamInput;

    async fn create(&self, input: &CreateTeamInput) -> Result<Team, AppError> {
        require_min_len("team name", &input.name, 2)?;
        self.api.create_team(input).await
    }
}

// ============================================================================
// Store
// ============================================================================

pub type TeamStore = ResourceStore<TeamsBackend>;

impl ResourceStore<TeamsBackend> {
    pub fn with_api(api: Arc<ApiClient>) -> Self {
        ResourceStore::new(TeamsBackend { api })
    }

    /// `GET /teams/{id}/members`.
    pub async fn members(&self, team_id: &str) -> Result<Vec<User>, AppError> {
        self.backend.api.team_members(team_id).await
    }

    /// Add a user to a team, then re-fetch the team listing: the server
    /// recomputes `members_count`, so the stale collection would otherwise
    /// keep showing the old count.
    pub async fn add_member(
        &self,
        team_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<(), AppError> {
        require_non_empty("user id", user_id)?;
        let input = AddMemberInput {
            user_id: user_id.to_string(),
            role,
        };
        self.backend.api.add_team_member(team_id, &input).await?;
        tracing::info!(team = %team_id, user = %user_id, "Member added");
        self.load(()).await
    }
}
