//! End-to-end flows over [`AppState`]: login/logout, board moves, mention
//! fan-out, notification read-state, and the unread poller, all against a
//! mock HTTP server.

use std::time::Duration;

use serde_json::json;

use taskboard_client::models::{CreateCommentInput, MemberRole, TaskStatus, User};
use taskboard_client::poller::NotificationPoller;
use taskboard_client::{ApiConfig, AppError, AppState};

fn state_for(server: &mockito::ServerGuard, dir: &std::path::Path) -> AppState {
    let config = ApiConfig::new(&server.url())
        .unwrap()
        .with_storage_dir(dir.to_path_buf());
    AppState::init(config)
}

fn user(id: &str, name: &str, email: &str) -> User {
    User {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        role: None,
    }
}

fn task_json(id: &str, title: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("about {title}"),
        "status": status,
        "priority": "medium",
        "project_id": "p1",
        "assignee_id": null,
        "due_date": null,
        "order_index": null
    })
}

fn notification_json(id: &str, user_id: &str, is_read: bool) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": user_id,
        "type": "mention",
        "title": "Someone mentioned you",
        "message": "You were mentioned in a comment: \"hi\"",
        "task_id": "t1",
        "from_user_id": "u9",
        "from_user_name": "Someone",
        "is_read": is_read,
        "created_at": "2024-05-01T10:00:00Z",
        "action_url": "/tasks/t1"
    })
}

// ─── Session ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_installs_token_and_logout_clears_everything() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let _login = server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "token": "tok-1",
                "user": { "id": "u1", "name": "Dana", "email": "dana@example.com", "role": null }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    assert!(!state.session.is_logged_in());

    let logged_in = state
        .session
        .login(&taskboard_client::models::LoginCredentials {
            email: "dana@example.com".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();
    assert_eq!(logged_in.id, "u1");
    assert!(state.api.has_token());
    assert!(dir.path().join("session.json").exists());

    // A second state over the same storage dir restores the session.
    let restored = state_for(&server, dir.path());
    assert!(restored.session.is_logged_in());
    assert_eq!(restored.session.current_user().unwrap().name, "Dana");

    state.logout();
    assert!(!state.api.has_token());
    assert!(!state.session.is_logged_in());
    assert!(!state.poller.is_active());
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn test_local_validation_blocks_login_request() {
    let server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let state = state_for(&server, dir.path());

    // No mock is registered: a request going out would fail loudly with a
    // 501 rather than a validation error.
    let err = state
        .session
        .login(&taskboard_client::models::LoginCredentials {
            email: "not-an-email".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = state
        .session
        .login(&taskboard_client::models::LoginCredentials {
            email: "dana@example.com".into(),
            password: "short".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

// ─── Board moves ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_board_move_patches_status_only_and_reconciles() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let _list = server
        .mock("GET", "/tasks")
        .match_query(mockito::Matcher::UrlEncoded("projectId".into(), "p1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([task_json("t1", "Ship", "backlog"), task_json("t2", "Docs", "done")]).to_string())
        .create_async()
        .await;
    // The canonical copy comes back with a server-side edit, which must win.
    let patch = server
        .mock("PATCH", "/tasks/t1")
        .match_body(mockito::Matcher::Json(json!({ "status": "done" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(task_json("t1", "Ship v2", "done").to_string())
        .expect(1)
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    state.tasks.load("p1".to_string()).await.unwrap();

    state.tasks.move_to_status("t1", TaskStatus::Done).await.unwrap();

    let tasks = state.tasks.items();
    assert_eq!(tasks[0].id, "t1");
    assert_eq!(tasks[0].status, TaskStatus::Done);
    assert_eq!(tasks[0].title, "Ship v2");
    assert_eq!(tasks[1].id, "t2");
    patch.assert_async().await;
}

#[tokio::test]
async fn test_same_bucket_drop_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let _list = server
        .mock("GET", "/tasks")
        .match_query(mockito::Matcher::UrlEncoded("projectId".into(), "p1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([task_json("t1", "Ship", "backlog")]).to_string())
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/tasks/t1")
        .expect(0)
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    state.tasks.load("p1".to_string()).await.unwrap();

    // Dropping into the current bucket is a no-op.
    state.tasks.move_to_status("t1", TaskStatus::Backlog).await.unwrap();

    // A task that is not in the collection is an error, also without a request.
    let err = state.tasks.move_to_status("ghost", TaskStatus::Done).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    patch.assert_async().await;
}

#[tokio::test]
async fn test_failed_move_refetches_project_listing() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let list = server
        .mock("GET", "/tasks")
        .match_query(mockito::Matcher::UrlEncoded("projectId".into(), "p1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([task_json("t1", "Ship", "backlog")]).to_string())
        .expect(2)
        .create_async()
        .await;
    let _patch = server
        .mock("PATCH", "/tasks/t1")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({ "message": "boom" }).to_string())
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    state.tasks.load("p1".to_string()).await.unwrap();

    let err = state.tasks.move_to_status("t1", TaskStatus::Done).await.unwrap_err();
    assert!(matches!(err, AppError::Api { status: 500, .. }));

    // The optimistic flip was discarded by the recovery re-fetch.
    let tasks = state.tasks.items();
    assert_eq!(tasks[0].status, TaskStatus::Backlog);
    list.assert_async().await;
}

// ─── Comments & mentions ────────────────────────────────────────────────────

#[tokio::test]
async fn test_comment_mentions_fan_out_one_notification_per_match() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let body = "ping @Dana and @Omer";
    let _comment = server
        .mock("POST", "/comments")
        .match_body(mockito::Matcher::Json(json!({ "body": body, "taskId": "t1" })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "c1",
                "body": body,
                "task_id": "t1",
                "user_id": "u1",
                "author_name": "Israel",
                "created_at": "2024-05-01T10:00:00Z"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let expected_message = format!("You were mentioned in a comment: \"{body}\"");
    let for_dana = server
        .mock("POST", "/notifications")
        .match_body(mockito::Matcher::Json(json!({
            "user_id": "u2",
            "type": "mention",
            "title": "Israel mentioned you",
            "message": expected_message,
            "task_id": "t1",
            "from_user_id": "u1",
            "from_user_name": "Israel",
            "is_read": false,
            "action_url": "/tasks/t1"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(notification_json("n1", "u2", false).to_string())
        .expect(1)
        .create_async()
        .await;
    let for_omer = server
        .mock("POST", "/notifications")
        .match_body(mockito::Matcher::Json(json!({
            "user_id": "u3",
            "type": "mention",
            "title": "Israel mentioned you",
            "message": expected_message,
            "task_id": "t1",
            "from_user_id": "u1",
            "from_user_name": "Israel",
            "is_read": false,
            "action_url": "/tasks/t1"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(notification_json("n2", "u3", false).to_string())
        .expect(1)
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    let author = user("u1", "Israel", "israel@corp.com");
    let roster = vec![
        user("u2", "Dana Levi", "dana@corp.com"),
        user("u3", "Omer Katz", "omer@corp.com"),
        user("u4", "Noa Bar", "noa@corp.com"),
    ];

    let created = state
        .comments
        .create_with_mentions(
            &CreateCommentInput {
                body: body.into(),
                task_id: "t1".into(),
            },
            &author,
            &roster,
        )
        .await
        .unwrap();

    assert_eq!(created.id, "c1");
    assert_eq!(state.comments.items().len(), 1);
    for_dana.assert_async().await;
    for_omer.assert_async().await;
}

#[tokio::test]
async fn test_comment_without_mentions_sends_no_notifications() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let _comment = server
        .mock("POST", "/comments")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "c1",
                "body": "looks good to me",
                "task_id": "t1",
                "user_id": "u1",
                "author_name": "Israel",
                "created_at": "2024-05-01T10:00:00Z"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let notifications = server
        .mock("POST", "/notifications")
        .expect(0)
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    state
        .comments
        .create_with_mentions(
            &CreateCommentInput {
                body: "looks good to me".into(),
                task_id: "t1".into(),
            },
            &user("u1", "Israel", "israel@corp.com"),
            &[user("u2", "Dana Levi", "dana@corp.com")],
        )
        .await
        .unwrap();

    notifications.assert_async().await;
}

// ─── Teams ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_member_refreshes_team_listing() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let list = server
        .mock("GET", "/teams")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{ "id": "team-1", "name": "Platform", "members_count": 3, "created_at": "2024-05-01T10:00:00Z" }])
                .to_string(),
        )
        .expect(2)
        .create_async()
        .await;
    let add = server
        .mock("POST", "/teams/team-1/members")
        .match_body(mockito::Matcher::Json(json!({ "userId": "u9", "role": "member" })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    state.teams.load(()).await.unwrap();

    state
        .teams
        .add_member("team-1", "u9", MemberRole::Member)
        .await
        .unwrap();

    assert_eq!(state.teams.items().len(), 1);
    add.assert_async().await;
    list.assert_async().await;
}

// ─── Notifications ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_mark_all_read_flips_local_collection() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let _list = server
        .mock("GET", "/notifications")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                notification_json("n1", "u1", false),
                notification_json("n2", "u1", true),
                notification_json("n3", "u1", false)
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let mark_all = server
        .mock("PATCH", "/notifications/mark-all-read")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    state.notifications.load(()).await.unwrap();
    assert_eq!(state.notifications.local_unread_count(), 2);

    state.notifications.mark_all_read().await.unwrap();
    assert_eq!(state.notifications.local_unread_count(), 0);
    assert!(state.notifications.items().iter().all(|n| n.is_read));
    mark_all.assert_async().await;
}

#[tokio::test]
async fn test_mark_read_skips_already_read_and_unknown() {
    let mut server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let _list = server
        .mock("GET", "/notifications")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([notification_json("n1", "u1", true)]).to_string())
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", mockito::Matcher::Regex(r"^/notifications/.+$".into()))
        .expect(0)
        .create_async()
        .await;

    let state = state_for(&server, dir.path());
    state.notifications.load(()).await.unwrap();

    state.notifications.mark_read("n1").await.unwrap();
    state.notifications.mark_read("missing").await.unwrap();
    patch.assert_async().await;
}

// ─── Unread poller ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_poller_publishes_unread_count() {
    let mut server = mockito::Server::new_async().await;
    let unread = server
        .mock("GET", "/notifications")
        .match_query(mockito::Matcher::UrlEncoded("is_read".into(), "false".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([notification_json("n1", "u1", false), notification_json("n2", "u1", false)]).to_string())
        .expect_at_least(2)
        .create_async()
        .await;

    let config = ApiConfig::new(&server.url()).unwrap();
    let api = std::sync::Arc::new(taskboard_client::api::ApiClient::new(&config));
    let poller = NotificationPoller::with_period(api, Duration::from_millis(50));
    let rx = poller.subscribe();
    assert_eq!(*rx.borrow(), 0);

    poller.start();
    assert!(poller.is_active());
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(poller.unread_count(), 2);
    assert_eq!(*rx.borrow(), 2);
    poller.stop();
    assert!(!poller.is_active());
    unread.assert_async().await;
}

#[tokio::test]
async fn test_poller_start_and_stop_are_idempotent() {
    let mut server = mockito::Server::new_async().await;
    let _unread = server
        .mock("GET", "/notifications")
        .match_query(mockito::Matcher::UrlEncoded("is_read".into(), "false".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let config = ApiConfig::new(&server.url()).unwrap();
    let api = std::sync::Arc::new(taskboard_client::api::ApiClient::new(&config));
    let poller = NotificationPoller::with_period(api, Duration::from_millis(50));

    poller.start();
    poller.start();
    assert!(poller.is_active());

    poller.stop();
    assert!(!poller.is_active());
    poller.stop();
}

#[tokio::test]
async fn test_refresh_now_publishes_immediately() {
    let mut server = mockito::Server::new_async().await;
    let _unread = server
        .mock("GET", "/notifications")
        .match_query(mockito::Matcher::UrlEncoded("is_read".into(), "false".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                notification_json("n1", "u1", false),
                notification_json("n2", "u1", false),
                notification_json("n3", "u1", false)
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let config = ApiConfig::new(&server.url()).unwrap();
    let api = std::sync::Arc::new(taskboard_client::api::ApiClient::new(&config));
    let poller = NotificationPoller::new(api);

    let count = poller.refresh_now().await.unwrap();
    assert_eq!(count, 3);
    assert_eq!(poller.unread_count(), 3);
}
