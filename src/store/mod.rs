//! Optimistic resource stores.
//!
//! Every feature area (teams, projects, tasks, comments, notifications)
//! follows the same synchronization pattern: a store owns an observable
//! ordered collection, fetched by a parent-scoped list query, and merges
//! server responses into it. The visible collection never diverges from
//! confirmed server state for longer than one in-flight request:
//!
//! - `load` replaces the whole collection on success and leaves it untouched
//!   on failure, so a failed refresh never flashes an empty view.
//! - `create` has no optimistic insert; the server-assigned entity is
//!   appended once the create confirms, so a failed create needs no rollback.
//! - `update` swaps the entity in place by id, preserving its position.
//! - `delete` removes the entity only after the server confirmed.
//!
//! The pattern is implemented once here, generic over a backend trait, with
//! one thin instantiation per resource. Backends are split by capability so
//! a resource without a delete endpoint simply has no `delete` method.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::AppError;

pub mod comments;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod teams;

pub use comments::{CommentStore, CommentsBackend};
pub use notifications::{unread_count, NotificationStore, NotificationsBackend};
pub use projects::{ProjectStore, ProjectsBackend};
pub use tasks::{bucket_tasks, filter_tasks, TaskBuckets, TaskStore, TasksBackend};
pub use teams::{TeamStore, TeamsBackend};

// ============================================================================
// Backend traits
// ============================================================================

/// An item a store can hold: identified by a server-assigned string id.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// Scoped list access, the one capability every resource has.
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    type Item: Entity;
    /// Parent key of the listing: a team id for projects, a project id for
    /// tasks, `()` for unscoped collections like teams.
    type Scope: Clone + Send + Sync;

    async fn list(&self, scope: &Self::Scope) -> Result<Vec<Self::Item>, AppError>;
}

#[async_trait]
pub trait CreateBackend: ResourceBackend {
    type CreateInput: Send + Sync;

    async fn create(&self, input: &Self::CreateInput) -> Result<Self::Item, AppError>;
}

#[async_trait]
pub trait PatchBackend: ResourceBackend {
    type Patch: Send + Sync;

    async fn patch(&self, id: &str, patch: &Self::Patch) -> Result<Self::Item, AppError>;
}

#[async_trait]
pub trait DeleteBackend: ResourceBackend {
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

// ============================================================================
// ResourceStore
// ============================================================================

/// Generic optimistic store over one backend.
///
/// The collection lives in a watch channel; `subscribe` hands out receivers
/// that always see the latest snapshot. Operations may race (two updates to
/// different entities can be in flight at once) and responses are applied in
/// arrival order; the store itself outlives any view, so a late response
/// lands in the collection rather than a dead callback.
pub struct ResourceStore<B: ResourceBackend> {
    backend: B,
    items: watch::Sender<Vec<B::Item>>,
    /// Scope of the most recent `load`, kept so failure paths can re-fetch
    /// the same listing.
    scope: Mutex<Option<B::Scope>>,
    create_in_flight: AtomicBool,
}

/// Clears the in-flight flag when a create finishes or is cancelled.
struct CreateGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for CreateGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl<B: ResourceBackend> ResourceStore<B> {
    pub fn new(backend: B) -> Self {
        let (items, _) = watch::channel(Vec::new());
        Self {
            backend,
            items,
            scope: Mutex::new(None),
            create_in_flight: AtomicBool::new(false),
        }
    }

    /// Subscribe to collection changes. The receiver always holds the
    /// latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<B::Item>> {
        self.items.subscribe()
    }

    /// Current snapshot of the collection, in server order.
    pub fn items(&self) -> Vec<B::Item> {
        self.items.borrow().clone()
    }

    /// Fetch the listing for `scope` and replace the collection with the
    /// result. On failure the previous collection stays visible.
    pub async fn load(&self, scope: B::Scope) -> Result<(), AppError> {
        *self.scope.lock().expect("scope lock poisoned") = Some(scope.clone());
        let fetched = self.backend.list(&scope).await?;
        self.items.send_replace(fetched);
        Ok(())
    }

    /// Re-fetch the most recently loaded scope. A no-op when nothing has
    /// been loaded yet.
    pub async fn reload(&self) -> Result<(), AppError> {
        let scope = self.scope.lock().expect("scope lock poisoned").clone();
        let Some(scope) = scope else {
            return Ok(());
        };
        let fetched = self.backend.list(&scope).await?;
        self.items.send_replace(fetched);
        Ok(())
    }

    fn begin_create(&self) -> Result<CreateGuard<'_>, AppError> {
        if self
            .create_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::Validation("create already in flight".into()));
        }
        Ok(CreateGuard {
            flag: &self.create_in_flight,
        })
    }
}

impl<B: CreateBackend> ResourceStore<B> {
    /// Issue a create and append the server-assigned entity on success.
    ///
    /// A second create while one is still in flight is rejected with a
    /// validation error instead of being sent, so double-submission cannot
    /// produce duplicate entities.
    pub async fn create(&self, input: &B::CreateInput) -> Result<B::Item, AppError> {
        let _guard = self.begin_create()?;
        let created = self.backend.create(input).await?;
        self.items.send_modify(|items| items.push(created.clone()));
        Ok(created)
    }
}

impl<B: PatchBackend> ResourceStore<B> {
    /// Issue a partial update; on success the entity at `id` is replaced in
    /// place, keeping its position. A success response for an id no longer
    /// in the collection is a safe no-op.
    pub async fn update(&self, id: &str, patch: &B::Patch) -> Result<B::Item, AppError> {
        let updated = self.backend.patch(id, patch).await?;
        self.items.send_modify(|items| {
            if let Some(slot) = items.iter_mut().find(|item| item.id() == id) {
                *slot = updated.clone();
            }
        });
        Ok(updated)
    }
}

impl<B: DeleteBackend> ResourceStore<B> {
    /// Issue a delete; the entity leaves the collection only once the
    /// server confirmed.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.backend.delete(id).await?;
        self.items.send_modify(|items| items.retain(|item| item.id() != id));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
