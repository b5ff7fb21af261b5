use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::RwLock;

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{
    AddMemberInput, AuthResponse, Comment, CreateCommentInput, CreateNotificationInput,
    CreateProjectInput, CreateTaskInput, CreateTeamInput, LoginCredentials, Notification, Project,
    RegisterData, Task, Team, UpdateNotificationInput, UpdateTaskInput, User,
};

// ============================================================================
// Error payload
// ============================================================================

/// Shape the backend uses for error bodies: `{"message": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ============================================================================
// ApiClient
// ============================================================================

/// HTTP client that wraps all Taskboard backend endpoints.
///
/// The bearer token is shared interior state so one client instance can be
/// handed to every store: the session layer sets it after login/register and
/// clears it on logout, and every authenticated call picks up the current
/// value at send time.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a new `ApiClient` against the configured base URL.
    ///
    /// The underlying `reqwest::Client` is configured with the timeout from
    /// `ApiConfig` (30 seconds by default).
    pub fn new(config: &ApiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            base_url: config.base_url.clone(),
            token: RwLock::new(None),
        }
    }

    /// Install the bearer token used by all subsequent authenticated calls.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
    }

    /// Drop the bearer token. Subsequent authenticated calls go out without
    /// an `Authorization` header and will be rejected by the backend.
    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    // --------------------------------------------------------------------
    // Private HTTP helpers
    // --------------------------------------------------------------------

    /// Build a request to the given endpoint path, attaching the bearer
    /// token when one is installed.
    fn authed(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match self.token.read().expect("token lock poisoned").as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Build an unauthenticated request (auth endpoints only).
    fn anon(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
    }

    /// Map a non-2xx response to an `AppError`, reading the backend's
    /// `{"message"}` payload when present.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let code = status.as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.message,
            Err(_) if body.is_empty() => status.to_string(),
            Err(_) => body,
        };

        match code {
            401 | 403 => Err(AppError::Auth(message)),
            404 => Err(AppError::NotFound(message)),
            _ => Err(AppError::Api {
                status: code,
                message,
            }),
        }
    }

    /// Send a request, check the status code, and deserialize the JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        let resp = req.send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Send a request, check the status code, and discard the response body.
    async fn send_ok(&self, req: reqwest::RequestBuilder) -> Result<(), AppError> {
        let resp = req.send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    // --------------------------------------------------------------------
    // Auth
    // --------------------------------------------------------------------

    /// `POST /auth/login` -- exchange credentials for a token + user.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AppError> {
        let req = self.anon(reqwest::Method::POST, "/auth/login").json(credentials);
        self.send_json(req).await
    }

    /// `POST /auth/register` -- create an account; responds like login.
    pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse, AppError> {
        let req = self.anon(reqwest::Method::POST, "/auth/register").json(data);
        self.send_json(req).await
    }

    // --------------------------------------------------------------------
    // Users
    // --------------------------------------------------------------------

    /// `GET /users` -- full user roster, used for assignee pickers and
    /// mention matching.
    pub async fn users(&self) -> Result<Vec<User>, AppError> {
        self.send_json(self.authed(reqwest::Method::GET, "/users")).await
    }

    // --------------------------------------------------------------------
    // Teams
    // --------------------------------------------------------------------

    /// `GET /teams` -- all teams visible to the current user.
    pub async fn teams(&self) -> Result<Vec<Team>, AppError> {
        self.send_json(self.authed(reqwest::Method::GET, "/teams")).await
    }

    /// `POST /teams` -- create a team.
    pub async fn create_team(&self, input: &CreateTeamInput) -> Result<Team, AppError> {
        let req = self.authed(reqwest::Method::POST, "/teams").json(input);
        self.send_json(req).await
    }

    /// `GET /teams/{id}/members` -- members of one team.
    pub async fn team_members(&self, team_id: &str) -> Result<Vec<User>, AppError> {
        let path = format!("/teams/{}/members", team_id);
        self.send_json(self.authed(reqwest::Method::GET, &path)).await
    }

    /// `POST /teams/{id}/members` -- add a user to a team. The backend's
    /// response shape is not pinned down, so it is surfaced as raw JSON.
    pub async fn add_team_member(
        &self,
        team_id: &str,
        input: &AddMemberInput,
    ) -> Result<serde_json::Value, AppError> {
        let path = format!("/teams/{}/members", team_id);
        let req = self.authed(reqwest::Method::POST, &path).json(input);
        self.send_json(req).await
    }

    // --------------------------------------------------------------------
    // Projects
    // --------------------------------------------------------------------

    /// `GET /projects?teamId={id}` -- projects that belong to one team.
    pub async fn projects_by_team(&self, team_id: &str) -> Result<Vec<Project>, AppError> {
        let req = self
            .authed(reqwest::Method::GET, "/projects")
            .query(&[("teamId", team_id)]);
        self.send_json(req).await
    }

    /// `GET /projects/{id}` -- one project, used to recover the owning team.
    pub async fn project(&self, id: &str) -> Result<Project, AppError> {
        let path = format!("/projects/{}", id);
        self.send_json(self.authed(reqwest::Method::GET, &path)).await
    }

    /// `POST /projects` -- create a project under a team.
    pub async fn create_project(&self, input: &CreateProjectInput) -> Result<Project, AppError> {
        let req = self.authed(reqwest::Method::POST, "/projects").json(input);
        self.send_json(req).await
    }

    // --------------------------------------------------------------------
    // Tasks
    // --------------------------------------------------------------------

    /// `GET /tasks?projectId={id}` -- tasks of one project.
    pub async fn tasks_by_project(&self, project_id: &str) -> Result<Vec<Task>, AppError> {
        let req = self
            .authed(reqwest::Method::GET, "/tasks")
            .query(&[("projectId", project_id)]);
        self.send_json(req).await
    }

    /// `POST /tasks` -- create a task.
    pub async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, AppError> {
        let req = self.authed(reqwest::Method::POST, "/tasks").json(input);
        self.send_json(req).await
    }

    /// `PATCH /tasks/{id}` -- partial update; only the fields present in
    /// `input` change on the server.
    pub async fn update_task(&self, id: &str, input: &UpdateTaskInput) -> Result<Task, AppError> {
        let path = format!("/tasks/{}", id);
        let req = self.authed(reqwest::Method::PATCH, &path).json(input);
        self.send_json(req).await
    }

    /// `DELETE /tasks/{id}`.
    pub async fn delete_task(&self, id: &str) -> Result<(), AppError> {
        let path = format!("/tasks/{}", id);
        self.send_ok(self.authed(reqwest::Method::DELETE, &path)).await
    }

    // --------------------------------------------------------------------
    // Comments
    // --------------------------------------------------------------------

    /// `GET /comments?taskId={id}` -- comments on one task.
    pub async fn comments_by_task(&self, task_id: &str) -> Result<Vec<Comment>, AppError> {
        let req = self
            .authed(reqwest::Method::GET, "/comments")
            .query(&[("taskId", task_id)]);
        self.send_json(req).await
    }

    /// `POST /comments` -- add a comment to a task.
    pub async fn create_comment(&self, input: &CreateCommentInput) -> Result<Comment, AppError> {
        let req = self.authed(reqwest::Method::POST, "/comments").json(input);
        self.send_json(req).await
    }

    // --------------------------------------------------------------------
    // Notifications
    // --------------------------------------------------------------------

    /// `GET /notifications` -- every notification for the current user.
    pub async fn notifications(&self) -> Result<Vec<Notification>, AppError> {
        self.send_json(self.authed(reqwest::Method::GET, "/notifications")).await
    }

    /// `GET /notifications?is_read=false` -- unread notifications only.
    pub async fn unread_notifications(&self) -> Result<Vec<Notification>, AppError> {
        let req = self
            .authed(reqwest::Method::GET, "/notifications")
            .query(&[("is_read", "false")]);
        self.send_json(req).await
    }

    /// `POST /notifications` -- create a notification (mention fan-out).
    pub async fn create_notification(
        &self,
        input: &CreateNotificationInput,
    ) -> Result<Notification, AppError> {
        let req = self.authed(reqwest::Method::POST, "/notifications").json(input);
        self.send_json(req).await
    }

    /// `PATCH /notifications/{id}` -- flip the read flag on one notification.
    pub async fn update_notification(
        &self,
        id: &str,
        input: &UpdateNotificationInput,
    ) -> Result<Notification, AppError> {
        let path = format!("/notifications/{}", id);
        let req = self.authed(reqwest::Method::PATCH, &path).json(input);
        self.send_json(req).await
    }

    /// `PATCH /notifications/mark-all-read` -- mark everything read.
    pub async fn mark_all_notifications_read(&self) -> Result<(), AppError> {
        let req = self
            .authed(reqwest::Method::PATCH, "/notifications/mark-all-read")
            .json(&serde_json::json!({}));
        self.send_ok(req).await
    }

    /// `DELETE /notifications/{id}`.
    pub async fn delete_notification(&self, id: &str) -> Result<(), AppError> {
        let path = format!("/notifications/{}", id);
        self.send_ok(self.authed(reqwest::Method::DELETE, &path)).await
    }
}
