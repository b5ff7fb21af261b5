//! Wire-level records for the Taskboard REST API.
//!
//! Field names and casing follow the backend contract exactly; where the
//! backend mixes camelCase and snake_case on one payload (the task create
//! body), the serde renames preserve that mix rather than cleaning it up.

mod auth;
mod comment;
mod notification;
mod project;
mod task;
mod team;

pub use auth::{AuthResponse, LoginCredentials, RegisterData, User};
pub use comment::{Comment, CreateCommentInput};
pub use notification::{
    format_relative, format_relative_at, CreateNotificationInput, Notification, NotificationType,
    UpdateNotificationInput,
};
pub use project::{CreateProjectInput, Project};
pub use task::{CreateTaskInput, Task, TaskPriority, TaskStatus, UpdateTaskInput};
pub use team::{AddMemberInput, CreateTeamInput, MemberRole, Team};
