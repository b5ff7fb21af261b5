use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Notification type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Mention,
    Comment,
    Assignment,
    TaskUpdate,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mention => "mention",
            Self::Comment => "comment",
            Self::Assignment => "assignment",
            Self::TaskUpdate => "task_update",
        }
    }

    /// Glyph shown next to the notification in list renderings.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Mention => "💬",
            Self::Comment => "💭",
            Self::Assignment => "📋",
            Self::TaskUpdate => "✏️",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub task_id: Option<String>,
    pub from_user_id: Option<String>,
    pub from_user_name: Option<String>,
    pub is_read: bool,
    pub created_at: String,
    pub action_url: Option<String>,
}

/// Create body: everything the server record has except `id` and
/// `created_at`, which the server assigns.
#[derive(Debug, Clone, Serialize)]
pub struct CreateNotificationInput {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_user_name: Option<String>,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateNotificationInput {
    pub is_read: bool,
}

// ============================================================================
// Relative timestamps
// ============================================================================

/// Renders a server timestamp relative to `now`: "just now", "5m ago",
/// "3h ago", "2d ago", then a plain date once it is a week old. Timestamps
/// that fail to parse are returned as-is.
pub fn format_relative_at(created_at: &str, now: DateTime<Utc>) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(created_at) else {
        return created_at.to_string();
    };
    let mins = now.signed_duration_since(parsed.with_timezone(&Utc)).num_minutes();

    if mins < 1 {
        return "just now".to_string();
    }
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }
    parsed.format("%-d.%-m.%Y").to_string()
}

/// [`format_relative_at`] against the current wall clock.
pub fn format_relative(created_at: &str) -> String {
    format_relative_at(created_at, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_type_field_round_trips_through_rename() {
        let json = serde_json::json!({
            "id": "n1",
            "user_id": "u1",
            "type": "mention",
            "title": "Dana mentioned you",
            "message": "You were mentioned in a comment: \"hi\"",
            "task_id": "t1",
            "from_user_id": "u2",
            "from_user_name": "Dana",
            "is_read": false,
            "created_at": "2024-05-01T10:00:00Z",
            "action_url": "/tasks/t1"
        });
        let n: Notification = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(n.kind, NotificationType::Mention);
        assert_eq!(serde_json::to_value(&n).unwrap()["type"], "mention");
    }

    #[test]
    fn test_task_update_is_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&NotificationType::TaskUpdate).unwrap(),
            "\"task_update\""
        );
    }

    #[test]
    fn test_each_type_carries_its_list_glyph() {
        assert_eq!(NotificationType::Mention.icon(), "💬");
        assert_eq!(NotificationType::Comment.icon(), "💭");
        assert_eq!(NotificationType::Assignment.icon(), "📋");
        assert_eq!(NotificationType::TaskUpdate.icon(), "✏️");
    }

    #[test]
    fn test_format_relative_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap();
        assert_eq!(format_relative_at("2024-05-08T11:59:40Z", now), "just now");
        assert_eq!(format_relative_at("2024-05-08T11:15:00Z", now), "45m ago");
        assert_eq!(format_relative_at("2024-05-08T06:00:00Z", now), "6h ago");
        assert_eq!(format_relative_at("2024-05-06T12:00:00Z", now), "2d ago");
        assert_eq!(format_relative_at("2024-04-20T12:00:00Z", now), "20.4.2024");
    }

    #[test]
    fn test_format_relative_passes_through_garbage() {
        let now = Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap();
        assert_eq!(format_relative_at("not-a-date", now), "not-a-date");
    }

    #[test]
    fn test_future_timestamp_reads_as_just_now() {
        let now = at("2024-05-08T12:00:00Z");
        assert_eq!(format_relative_at("2024-05-08T12:05:00Z", now), "just now");
    }
}
