//! Mention extraction and notification fan-out.
//!
//! A comment body like `"nice work @Dana"` produces one mention
//! notification per matched roster member. Matching is deliberately loose:
//! a token matches any member whose name or email *contains* it,
//! case-sensitively, so `@Israel` reaches both "Israel Cohen" and
//! "israel@corp.com"-style entries it is a substring of. Unmatched tokens
//! are dropped without error.

use std::sync::OnceLock;

use futures_util::future::join_all;
use regex::Regex;

use crate::api::ApiClient;
use crate::models::{Comment, CreateNotificationInput, NotificationType, User};

fn mention_re() -> &'static Regex {
    static MENTION_RE: OnceLock<Regex> = OnceLock::new();
    MENTION_RE.get_or_init(|| Regex::new(r"@(\w+)").expect("mention regex"))
}

// ============================================================================
// Extraction & matching (pure)
// ============================================================================

/// Every `@token` in the body, in order of appearance. The token is the run
/// of word characters after the `@`.
pub fn extract_mention_tokens(body: &str) -> Vec<&str> {
    mention_re()
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Roster members matched by any token, deduplicated by id. A member
/// matches when its name or email contains the token as a case-sensitive
/// substring.
pub fn match_recipients<'a>(roster: &'a [User], tokens: &[&str]) -> Vec<&'a User> {
    let mut seen = Vec::new();
    let mut recipients = Vec::new();
    for token in tokens {
        for member in roster {
            if (member.name.contains(token) || member.email.contains(token))
                && !seen.contains(&member.id.as_str())
            {
                seen.push(member.id.as_str());
                recipients.push(member);
            }
        }
    }
    recipients
}

// ============================================================================
// Fan-out
// ============================================================================

fn mention_notification(author: &User, recipient: &User, comment: &Comment) -> CreateNotificationInput {
    CreateNotificationInput {
        user_id: recipient.id.clone(),
        kind: NotificationType::Mention,
        title: format!("{} mentioned you", author.name),
        message: format!("You were mentioned in a comment: \"{}\"", comment.body),
        task_id: Some(comment.task_id.clone()),
        from_user_id: Some(author.id.clone()),
        from_user_name: Some(author.name.clone()),
        is_read: false,
        action_url: Some(format!("/tasks/{}", comment.task_id)),
    }
}

/// Extract mentions from a freshly created comment and post one
/// notification per matched recipient.
///
/// Best-effort: each request is issued regardless of the others, failures
/// are logged and skipped, and the comment itself is already saved, so
/// nothing here propagates as an error. Returns how many notifications
/// were accepted by the server.
pub async fn notify_mentions(
    api: &ApiClient,
    author: &User,
    roster: &[User],
    comment: &Comment,
) -> usize {
    let tokens = extract_mention_tokens(&comment.body);
    if tokens.is_empty() {
        return 0;
    }
    let recipients = match_recipients(roster, &tokens);
    if recipients.is_empty() {
        return 0;
    }

    let requests = recipients.iter().map(|recipient| {
        let input = mention_notification(author, recipient, comment);
        async move {
            match api.create_notification(&input).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(
                        recipient = %input.user_id,
                        error = %e,
                        "Mention notification failed"
                    );
                    false
                }
            }
        }
    });

    let sent = join_all(requests).await.into_iter().filter(|ok| *ok).count();
    if sent > 0 {
        tracing::debug!(comment = %comment.id, sent, "Mention notifications sent");
    }
    sent
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str, email: &str) -> User {
        User {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role: None,
        }
    }

    #[test]
    fn test_extract_tokens_in_order() {
        assert_eq!(
            extract_mention_tokens("great job @Israel and @unknown"),
            vec!["Israel", "unknown"]
        );
        assert!(extract_mention_tokens("no mentions here").is_empty());
    }

    #[test]
    fn test_extract_handles_unicode_names() {
        assert_eq!(extract_mention_tokens("תודה @ישראל!"), vec!["ישראל"]);
    }

    #[test]
    fn test_match_by_substring_of_name_or_email() {
        let roster = vec![
            user("u1", "ישראל כהן", "israel@corp.com"),
            user("u2", "Israel Cohen", "ic@corp.com"),
            user("u3", "Dana Levi", "dana@corp.com"),
        ];
        // "Israel" is a substring of u2's name and u1's email.
        let hits = match_recipients(&roster, &["Israel", "unknown"]);
        let ids: Vec<&str> = hits.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u2"]);

        let hits = match_recipients(&roster, &["israel"]);
        let ids: Vec<&str> = hits.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1"]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let roster = vec![user("u1", "Dana", "dana@corp.com")];
        assert!(match_recipients(&roster, &["DANA"]).is_empty());
        assert_eq!(match_recipients(&roster, &["Dana"]).len(), 1);
    }

    #[test]
    fn test_recipients_deduplicated_by_id() {
        let roster = vec![user("u1", "Dana Levi", "dana@corp.com")];
        // Both tokens match the same member; one recipient comes back.
        let hits = match_recipients(&roster, &["Dana", "dana"]);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_notification_payload_shape() {
        let author = user("u2", "Dana", "dana@corp.com");
        let recipient = user("u1", "Israel", "israel@corp.com");
        let comment = Comment {
            id: "c1".into(),
            body: "ping @Israel".into(),
            task_id: "t1".into(),
            user_id: "u2".into(),
            author_name: Some("Dana".into()),
            created_at: "2024-05-01T10:00:00Z".into(),
        };
        let input = mention_notification(&author, &recipient, &comment);
        assert_eq!(input.user_id, "u1");
        assert_eq!(input.kind, NotificationType::Mention);
        assert_eq!(input.title, "Dana mentioned you");
        assert_eq!(
            input.message,
            "You were mentioned in a comment: \"ping @Israel\""
        );
        assert_eq!(input.action_url.as_deref(), Some("/tasks/t1"));
        assert!(!input.is_read);
    }
}
