use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{CreateTaskInput, Task, TaskStatus, UpdateTaskInput, User};
use crate::store::{
    CreateBackend, DeleteBackend, Entity, PatchBackend, ResourceBackend, ResourceStore,
};
use crate::validation::{require_min_len, require_non_empty};

// ============================================================================
// Backend
// ============================================================================

impl Entity for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

pub struct TasksBackend {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceBackend for TasksBackend {
    type Item = Task;
    /// Owning project id.
    type Scope = String;

    async fn list(&self, project_id: &String) -> Result<Vec<Task>, AppError> {
        self.api.tasks_by_project(project_id).await
    }
}

#[async_trait]
impl CreateBackend for TasksBackend {
    type CreateInput = CreateTaskInput;

    async fn create(&self, input: &CreateTaskInput) -> Result<Task, AppError> {
        require_min_len("task title", &input.title, 2)?;
        require_non_empty("task description", &input.description)?;
        self.api.create_task(input).await
    }
}

#[async_trait]
impl PatchBackend for TasksBackend {
    type Patch = UpdateTaskInput;

    async fn patch(&self, id: &str, patch: &UpdateTaskInput) -> Result<Task, AppError> {
        self.api.update_task(id, patch).await
    }
}

#[async_trait]
impl DeleteBackend for TasksBackend {
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.api.delete_task(id).await
    }
}

// ============================================================================
// Store
// ============================================================================

pub type TaskStore = ResourceStore<TasksBackend>;

impl ResourceStore<TasksBackend> {
    pub fn with_api(api: Arc<ApiClient>) -> Self {
        ResourceStore::new(TasksBackend { api })
    }

    /// Board drag move: reclassify a task into another status bucket.
    ///
    /// The status flips locally first so the board reacts immediately, then
    /// a PATCH carrying only the status goes out. On success the entity is
    /// reconciled with the canonical server copy; on failure the whole
    /// project listing is re-fetched, which discards the optimistic flip.
    /// Dropping a task back into its current bucket sends nothing.
    pub async fn move_to_status(&self, id: &str, status: TaskStatus) -> Result<(), AppError> {
        let current = self
            .items
            .borrow()
            .iter()
            .find(|task| task.id == id)
            .map(|task| task.status);
        let Some(current) = current else {
            return Err(AppError::NotFound(format!("task {id}")));
        };
        if current == status {
            return Ok(());
        }

        // 1. Optimistic local flip, position preserved
        self.items.send_modify(|tasks| {
            if let Some(task) = tasks.iter_mut().find(|task| task.id == id) {
                task.status = status;
            }
        });

        // 2. Status-only PATCH
        match self
            .backend
            .patch(id, &UpdateTaskInput::status_only(status))
            .await
        {
            Ok(canonical) => {
                // 3. Reconcile with the server copy
                self.items.send_modify(|tasks| {
                    if let Some(slot) = tasks.iter_mut().find(|task| task.id == id) {
                        *slot = canonical.clone();
                    }
                });
                Ok(())
            }
            Err(e) => {
                // 4. Full scoped re-fetch is the recovery path
                tracing::warn!(id = %id, error = %e, "Task move failed, reloading project tasks");
                if let Err(reload_err) = self.reload().await {
                    tracing::error!(error = %reload_err, "Reload after failed move also failed");
                }
                Err(e)
            }
        }
    }
}

// ============================================================================
// Derived views (pure projections over the canonical collection)
// ============================================================================

/// Tasks whose title or description contains `query`, case-insensitively.
/// A blank query returns the collection as-is. Order is preserved.
pub fn filter_tasks(tasks: &[Task], query: &str) -> Vec<Task> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .filter(|task| {
            task.title.to_lowercase().contains(&query)
                || task.description.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// The board's three columns, in collection order within each column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskBuckets {
    pub backlog: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
}

impl TaskBuckets {
    pub fn total(&self) -> usize {
        self.backlog.len() + self.in_progress.len() + self.done.len()
    }
}

/// Split tasks into status buckets. Recomputed from the canonical
/// collection on every change, never mutated on its own.
pub fn bucket_tasks(tasks: &[Task]) -> TaskBuckets {
    let mut buckets = TaskBuckets::default();
    for task in tasks {
        match task.status {
            TaskStatus::Backlog => buckets.backlog.push(task.clone()),
            TaskStatus::InProgress => buckets.in_progress.push(task.clone()),
            TaskStatus::Done => buckets.done.push(task.clone()),
        }
    }
    buckets
}

/// Resolve an assignee id against the team roster.
pub fn assignee_name<'a>(members: &'a [User], assignee_id: Option<&str>) -> Option<&'a str> {
    let id = assignee_id?;
    members
        .iter()
        .find(|member| member.id == id)
        .map(|member| member.name.as_str())
}

// ============================================================================
// Tests
// ============================================================================
