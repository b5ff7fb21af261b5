//! Client-side core for the Taskboard backend: typed REST client, session
//! handling, optimistic resource stores for teams / projects / tasks /
//! comments / notifications, mention fan-out, and the unread-count poller.
//!
//! A frontend embeds this crate by constructing one [`AppState`] at startup
//! and subscribing to the stores' watch channels.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod mentions;
pub mod models;
pub mod poller;
pub mod session;
pub mod store;
pub mod validation;

use std::sync::Arc;

pub use config::ApiConfig;
pub use error::AppError;

use api::ApiClient;
use poller::NotificationPoller;
use session::SessionStore;
use store::{CommentStore, NotificationStore, ProjectStore, TaskStore, TeamStore};

/// Process-wide application context, constructed once at startup.
///
/// Every store shares one [`ApiClient`], so a login installs the bearer
/// token for all of them at once.
pub struct AppState {
    pub api: Arc<ApiClient>,
    /// Login/register/logout and the persisted session.
    pub session: SessionStore,
    pub teams: TeamStore,
    pub projects: ProjectStore,
    pub tasks: TaskStore,
    pub comments: CommentStore,
    pub notifications: NotificationStore,
    /// Background unread-count refresh for the notification badge.
    pub poller: NotificationPoller,
}

impl AppState {
    /// Build the shared client and all stores, then try to restore a
    /// persisted session so the app starts signed in when one exists.
    pub fn init(config: ApiConfig) -> Self {
        tracing::info!(base_url = %config.base_url, "Initializing taskboard client");

        let api = Arc::new(ApiClient::new(&config));
        let session = SessionStore::new(api.clone(), &config);
        session.try_restore();

        Self {
            session,
            teams: TeamStore::with_api(api.clone()),
            projects: ProjectStore::with_api(api.clone()),
            tasks: TaskStore::with_api(api.clone()),
            comments: CommentStore::with_api(api.clone()),
            notifications: NotificationStore::with_api(api.clone()),
            poller: NotificationPoller::new(api.clone()),
            api,
        }
    }

    /// Tear the session down: stop background polling, clear the persisted
    /// token and user.
    pub fn logout(&self) {
        self.poller.stop();
        self.session.logout();
    }
}
