use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{Notification, UpdateNotificationInput};
use crate::store::{DeleteBackend, Entity, PatchBackend, ResourceBackend, ResourceStore};

// ============================================================================
// Backend
// ============================================================================

impl Entity for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Notifications are listed, patched (read flag) and deleted through the
/// store. Creating them is not a store operation: the mention fan-out posts
/// notifications addressed to *other* users, which must never land in the
/// local collection.
pub struct NotificationsBackend {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceBackend for NotificationsBackend {
    type Item = Notification;
    /// The listing always belongs to the authenticated user.
    type Scope = ();

    async fn list(&self, _scope: &()) -> Result<Vec<Notification>, AppError> {
        self.api.notifications().await
    }
}

#[async_trait]
impl PatchBackend for NotificationsBackend {
    type Patch = UpdateNotificationInput;

    async fn patch(
        &self,
        id: &str,
        patch: &UpdateNotificationInput,
    ) -> Result<Notification, AppError> {
        self.api.update_notification(id, patch).await
    }
}

#[async_trait]
impl DeleteBackend for NotificationsBackend {
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.api.delete_notification(id).await
    }
}

// ============================================================================
// Store
// ============================================================================

pub type NotificationStore = ResourceStore<NotificationsBackend>;

impl ResourceStore<NotificationsBackend> {
    pub fn with_api(api: Arc<ApiClient>) -> Self {
        ResourceStore::new(NotificationsBackend { api })
    }

    /// Mark one notification read. Already-read notifications are left
    /// alone without a request.
    pub async fn mark_read(&self, id: &str) -> Result<(), AppError> {
        let already_read = self
            .items
            .borrow()
            .iter()
            .find(|n| n.id == id)
            .map_or(true, |n| n.is_read);
        if already_read {
            return Ok(());
        }
        self.update(id, &UpdateNotificationInput { is_read: true })
            .await?;
        Ok(())
    }

    /// `PATCH /notifications/mark-all-read`, then flip every local entry.
    /// The endpoint returns no body, so the local collection is updated
    /// in place rather than re-fetched.
    pub async fn mark_all_read(&self) -> Result<(), AppError> {
        self.backend.api.mark_all_notifications_read().await?;
        self.items.send_modify(|notifications| {
            for notification in notifications {
                notification.is_read = true;
            }
        });
        Ok(())
    }

    /// Unread entries in the local collection.
    pub fn local_unread_count(&self) -> usize {
        unread_count(&self.items.borrow())
    }
}

/// Pure projection: how many of these notifications are unread.
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationType;

    fn notification(id: &str, is_read: bool) -> Notification {
        Notification {
            id: id.into(),
            user_id: "u1".into(),
            kind: NotificationType::Mention,
            title: "Dana mentioned you".into(),
            message: "You were mentioned in a comment: \"hi\"".into(),
            task_id: Some("t1".into()),
            from_user_id: Some("u2".into()),
            from_user_name: Some("Dana".into()),
            is_read,
            created_at: "2024-05-01T10:00:00Z".into(),
            action_url: Some("/tasks/t1".into()),
        }
    }

    #[test]
    fn test_unread_count_counts_only_unread() {
        let list = vec![
            notification("1", false),
            notification("2", true),
            notification("3", false),
        ];
        assert_eq!(unread_count(&list), 2);
        assert_eq!(unread_count(&[]), 0);
    }
}
