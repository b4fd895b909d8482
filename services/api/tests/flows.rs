//! End-to-end flows against a real database
//!
//! These tests exercise the HTTP surface through the router: auth,
//! ownership rules, notification fan-out, and the inbox. They need a
//! PostgreSQL instance configured through the usual environment
//! variables; migrations are applied on startup and each test removes
//! the accounts it uses before running.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use serial_test::serial;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use api::MIGRATOR;
use api::config::ChatConfig;
use api::models::NotificationKind;
use api::notify::Notifier;
use api::rate_limiter::{RateLimiter, RateLimiterConfig};
use api::realtime::{ConnectionRegistry, PushEvent};
use api::repositories::{
    BuildingRepository, NotificationRepository, ResourceRepository, UserRepository,
};
use api::routes::create_router;
use api::session::SessionStore;
use api::state::AppState;
use api::uploads::UploadStore;
use common::database::{DatabaseConfig, init_pool};

const BOUNDARY: &str = "test-boundary-7f2a19";

async fn setup() -> (Router, AppState) {
    let db_config = DatabaseConfig::from_env().expect("database config");
    let pool = init_pool(&db_config).await.expect("database pool");
    MIGRATOR.run(&pool).await.expect("migrations apply");

    let user_repository = UserRepository::new(pool.clone());
    let resource_repository = ResourceRepository::new(pool.clone());
    let notification_repository = NotificationRepository::new(pool.clone());
    let building_repository = BuildingRepository::new(pool.clone());
    let sessions = SessionStore::new();
    let registry = ConnectionRegistry::new();
    let notifier = Notifier::new(notification_repository.clone(), registry.clone());

    let state = AppState {
        db_pool: pool,
        user_repository,
        resource_repository,
        notification_repository,
        building_repository,
        sessions,
        registry,
        notifier,
        uploads: UploadStore::new("target/test-uploads"),
        lost_limiter: RateLimiter::new(RateLimiterConfig::new(20, 60)),
        paper_limiter: RateLimiter::new(RateLimiterConfig::new(10, 60)),
        market_limiter: RateLimiter::new(RateLimiterConfig::new(15, 60)),
        http_client: reqwest::Client::new(),
        chat: ChatConfig::from_env(),
    };

    (create_router(state.clone()), state)
}

async fn delete_users(pool: &PgPool, registration_numbers: &[&str]) {
    for registration_number in registration_numbers {
        sqlx::query("DELETE FROM users WHERE registration_number = $1")
            .bind(registration_number)
            .execute(pool)
            .await
            .expect("cleanup user");
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::empty()).expect("request")
}

fn multipart_request(
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((field, file_name, content_type, contents)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn register_and_login(router: &Router, registration_number: &str, name: &str) -> String {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "registrationNumber": registration_number,
                "name": name,
                "password": "secret123",
                "securityCode": "blue door",
            }),
        ))
        .await
        .expect("register request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({
                "registrationNumber": registration_number,
                "password": "secret123",
            }),
        ))
        .await
        .expect("login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    body["token"].as_str().expect("session token").to_string()
}

#[tokio::test]
#[serial]
async fn test_registration_rejects_unknown_range() {
    let (router, state) = setup().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "registrationNumber": "999/1",
                "name": "Nobody",
                "password": "secret123",
                "securityCode": "blue door",
            }),
        ))
        .await
        .expect("register request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No account row may exist after the rejection
    let user = state
        .user_repository
        .find_by_registration("999/1")
        .await
        .expect("lookup");
    assert!(user.is_none());
}

#[tokio::test]
#[serial]
async fn test_register_login_check_logout() {
    let (router, state) = setup().await;
    delete_users(&state.db_pool, &["125/11"]).await;

    let token = register_and_login(&router, "125/11", "Asha").await;

    // Duplicate registration is rejected
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "registrationNumber": "125-011",
                "name": "Asha Again",
                "password": "secret123",
                "securityCode": "blue door",
            }),
        ))
        .await
        .expect("duplicate register");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Check resolves the identity while the token lives
    let response = router
        .clone()
        .oneshot(bare_request("GET", "/api/auth/check", Some(&token)))
        .await
        .expect("auth check");
    let body = read_json(response).await;
    assert_eq!(body["loggedIn"], true);
    assert_eq!(body["user"]["registrationNumber"], "125/11");

    // Logout revokes the token
    let response = router
        .clone()
        .oneshot(bare_request("POST", "/api/auth/logout", Some(&token)))
        .await
        .expect("logout");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(bare_request("GET", "/api/auth/check", Some(&token)))
        .await
        .expect("auth check after logout");
    let body = read_json(response).await;
    assert_eq!(body["loggedIn"], false);

    // A revoked token no longer opens protected routes
    let response = router
        .clone()
        .oneshot(bare_request("POST", "/api/auth/logout", Some(&token)))
        .await
        .expect("second logout");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_protected_routes_require_token() {
    let (router, _state) = setup().await;

    let response = router
        .clone()
        .oneshot(bare_request("GET", "/api/notifications", None))
        .await
        .expect("unauthenticated inbox");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Read-only listings stay open to anonymous callers
    let response = router
        .clone()
        .oneshot(bare_request("GET", "/api/items", None))
        .await
        .expect("anonymous listing");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_lost_item_ownership_rules() {
    let (router, state) = setup().await;
    delete_users(&state.db_pool, &["125/21", "125/22"]).await;

    let owner_token = register_and_login(&router, "125/21", "Owner").await;
    let other_token = register_and_login(&router, "125/22", "Other").await;

    let response = router
        .clone()
        .oneshot(multipart_request(
            "/api/items",
            &owner_token,
            &[
                ("title", "Blue water bottle"),
                ("location", "Library"),
                ("contact", "9876543210"),
            ],
            None,
        ))
        .await
        .expect("create item");
    assert_eq!(response.status(), StatusCode::OK);
    let item = read_json(response).await;
    let item_id = item["id"].as_str().expect("item id").to_string();
    assert_eq!(item["status"], "lost");
    assert_eq!(item["postedByRegistration"], "125/21");

    // Transition on a nonexistent id is NotFound
    let response = router
        .clone()
        .oneshot(bare_request(
            "PUT",
            &format!("/api/items/{}/found", Uuid::new_v4()),
            Some(&owner_token),
        ))
        .await
        .expect("transition missing");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A non-owner may not transition the item, and the record is unchanged
    let response = router
        .clone()
        .oneshot(bare_request(
            "PUT",
            &format!("/api/items/{item_id}/found"),
            Some(&other_token),
        ))
        .await
        .expect("foreign transition");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .clone()
        .oneshot(bare_request("GET", "/api/items?status=lost", None))
        .await
        .expect("list lost");
    let listed = read_json(response).await;
    assert!(
        listed
            .as_array()
            .expect("array")
            .iter()
            .any(|entry| entry["id"] == item_id.as_str())
    );

    // The owner's transition succeeds and is visible in the listing
    let response = router
        .clone()
        .oneshot(bare_request(
            "PUT",
            &format!("/api/items/{item_id}/found"),
            Some(&owner_token),
        ))
        .await
        .expect("owner transition");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(bare_request("GET", "/api/items?status=found", None))
        .await
        .expect("list found");
    let listed = read_json(response).await;
    assert!(
        listed
            .as_array()
            .expect("array")
            .iter()
            .any(|entry| entry["id"] == item_id.as_str())
    );

    // Deletion follows the same ownership rule
    let response = router
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/items/{item_id}"),
            Some(&other_token),
        ))
        .await
        .expect("foreign delete");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/items/{item_id}"),
            Some(&owner_token),
        ))
        .await
        .expect("owner delete");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(bare_request("GET", "/api/items", None))
        .await
        .expect("list after delete");
    let listed = read_json(response).await;
    assert!(
        listed
            .as_array()
            .expect("array")
            .iter()
            .all(|entry| entry["id"] != item_id.as_str())
    );
}

#[tokio::test]
#[serial]
async fn test_marketplace_broadcast_and_inbox() {
    let (router, state) = setup().await;
    delete_users(&state.db_pool, &["225/88", "225/89"]).await;

    let buyer_token = register_and_login(&router, "225/88", "Asha").await;
    let seller_token = register_and_login(&router, "225/89", "Ravi").await;

    let response = router
        .clone()
        .oneshot(multipart_request(
            "/api/marketplace",
            &seller_token,
            &[
                ("title", "Scientific calculator"),
                ("description", "Barely used"),
                ("price", "500"),
                ("category", "electronics"),
                ("contact", "9876543210"),
            ],
            None,
        ))
        .await
        .expect("create listing");
    assert_eq!(response.status(), StatusCode::OK);
    let item = read_json(response).await;
    let item_id = item["id"].as_str().expect("item id").to_string();

    // Exactly one row per registered user, all unread
    let broadcast_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE resource_id = $1 AND read = FALSE",
    )
    .bind(Uuid::parse_str(&item_id).expect("uuid"))
    .fetch_one(&state.db_pool)
    .await
    .expect("broadcast count");
    let user_rows = state.user_repository.count().await.expect("user count");
    assert_eq!(broadcast_rows, user_rows);

    // The buyer's inbox gained one unread sell notification for the item
    let response = router
        .clone()
        .oneshot(bare_request(
            "GET",
            "/api/notifications?unreadOnly=true",
            Some(&buyer_token),
        ))
        .await
        .expect("buyer inbox");
    let inbox = read_json(response).await;
    assert_eq!(inbox["total"], 1);
    let notification = &inbox["notifications"][0];
    assert_eq!(notification["type"], "sell");
    assert_eq!(notification["read"], false);
    assert_eq!(notification["resourceId"], item_id.as_str());
    let notification_id = notification["id"].as_str().expect("notification id").to_string();

    let response = router
        .clone()
        .oneshot(bare_request(
            "GET",
            "/api/notifications/unread-count",
            Some(&buyer_token),
        ))
        .await
        .expect("unread count");
    let body = read_json(response).await;
    assert_eq!(body["count"], 1);

    // The seller cannot touch the buyer's notification, and cannot tell
    // it exists
    let response = router
        .clone()
        .oneshot(bare_request(
            "PUT",
            &format!("/api/notifications/{notification_id}/read"),
            Some(&seller_token),
        ))
        .await
        .expect("foreign mark read");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/notifications/{notification_id}"),
            Some(&seller_token),
        ))
        .await
        .expect("foreign delete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Marking read clears the buyer's unread count, not the seller's
    let response = router
        .clone()
        .oneshot(bare_request(
            "PUT",
            &format!("/api/notifications/{notification_id}/read"),
            Some(&buyer_token),
        ))
        .await
        .expect("mark read");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(bare_request(
            "GET",
            "/api/notifications/unread-count",
            Some(&buyer_token),
        ))
        .await
        .expect("unread count after read");
    let body = read_json(response).await;
    assert_eq!(body["count"], 0);

    let response = router
        .clone()
        .oneshot(bare_request(
            "GET",
            "/api/notifications/unread-count",
            Some(&seller_token),
        ))
        .await
        .expect("seller unread count");
    let body = read_json(response).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
#[serial]
async fn test_mark_all_read_scopes_to_caller() {
    let (router, state) = setup().await;
    delete_users(&state.db_pool, &["125/31", "125/32"]).await;

    let first_token = register_and_login(&router, "125/31", "First").await;
    let second_token = register_and_login(&router, "125/32", "Second").await;

    // Two broadcasts put two unread rows in both inboxes
    for item_name in ["Course notes", "Lab coat"] {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/buy-requests",
                Some(&first_token),
                json!({
                    "itemName": item_name,
                    "contact": "9876543210",
                }),
            ))
            .await
            .expect("create buy request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(bare_request(
            "PUT",
            "/api/notifications/mark-all-read",
            Some(&first_token),
        ))
        .await
        .expect("mark all read");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(bare_request(
            "GET",
            "/api/notifications/unread-count",
            Some(&first_token),
        ))
        .await
        .expect("first unread");
    assert_eq!(read_json(response).await["count"], 0);

    // The other user's rows are untouched
    let response = router
        .clone()
        .oneshot(bare_request(
            "GET",
            "/api/notifications/unread-count",
            Some(&second_token),
        ))
        .await
        .expect("second unread");
    assert_eq!(read_json(response).await["count"], 2);
}

#[tokio::test]
#[serial]
async fn test_realtime_push_delivery() {
    let (router, state) = setup().await;
    delete_users(&state.db_pool, &["125/41", "125/42"]).await;

    let listener_token = register_and_login(&router, "125/41", "Listener").await;
    let poster_token = register_and_login(&router, "125/42", "Poster").await;

    let listener_id = state
        .sessions
        .resolve(&listener_token)
        .await
        .expect("listener session");
    let poster_id = state
        .sessions
        .resolve(&poster_token)
        .await
        .expect("poster session");

    let (listener_tx, mut listener_rx) = mpsc::channel(8);
    let (poster_tx, mut poster_rx) = mpsc::channel(8);
    state.registry.bind(listener_id, listener_tx).await;
    state.registry.bind(poster_id, poster_tx).await;

    // A broadcast reaches every connected identity
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/buy-requests",
            Some(&poster_token),
            json!({
                "itemName": "Drafting table",
                "contact": "9876543210",
            }),
        ))
        .await
        .expect("create buy request");
    assert_eq!(response.status(), StatusCode::OK);
    let request_id = read_json(response).await["id"]
        .as_str()
        .expect("request id")
        .to_string();

    let PushEvent::Notification { kind, title, id, .. } =
        listener_rx.recv().await.expect("listener push");
    assert_eq!(kind, NotificationKind::Buy);
    assert_eq!(title, "New Buy Request");
    assert_eq!(id, None);

    assert!(poster_rx.recv().await.is_some());

    // A status transition pushes only to the owner, with the stored row
    let response = router
        .clone()
        .oneshot(bare_request(
            "PUT",
            &format!("/api/buy-requests/{request_id}/fulfilled"),
            Some(&poster_token),
        ))
        .await
        .expect("fulfil request");
    assert_eq!(response.status(), StatusCode::OK);

    let PushEvent::Notification { kind, id, resource_id, .. } =
        poster_rx.recv().await.expect("owner push");
    assert_eq!(kind, NotificationKind::Buy);
    assert!(id.is_some());
    assert_eq!(
        resource_id,
        Some(Uuid::parse_str(&request_id).expect("uuid"))
    );

    assert!(listener_rx.try_recv().is_err());
}

#[tokio::test]
#[serial]
async fn test_question_paper_upload_accepts_only_pdf() {
    let (router, state) = setup().await;
    delete_users(&state.db_pool, &["125/51"]).await;

    let token = register_and_login(&router, "125/51", "Uploader").await;
    let fields: &[(&str, &str)] = &[
        ("year", "2023"),
        ("semester", "5"),
        ("branch", "CSE"),
        ("subject", "Operating Systems"),
        ("subjectCode", "CS501"),
    ];

    let response = router
        .clone()
        .oneshot(multipart_request(
            "/api/question-papers/upload",
            &token,
            fields,
            Some(("pdf", "notes.txt", "text/plain", b"not a pdf")),
        ))
        .await
        .expect("reject non-pdf");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .clone()
        .oneshot(multipart_request(
            "/api/question-papers/upload",
            &token,
            fields,
            Some(("pdf", "os-2023.pdf", "application/pdf", b"%PDF-1.4 test")),
        ))
        .await
        .expect("accept pdf");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(bare_request(
            "GET",
            "/api/question-papers?year=2023&subjectCode=CS501",
            None,
        ))
        .await
        .expect("list papers");
    let papers = read_json(response).await;
    assert!(
        papers
            .as_array()
            .expect("array")
            .iter()
            .any(|paper| paper["subject"] == "Operating Systems")
    );
}

#[tokio::test]
#[serial]
async fn test_chat_answers_from_faq_table() {
    let (router, _state) = setup().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/chat",
            None,
            json!({"message": "What are the library timings?"}),
        ))
        .await
        .expect("chat request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(
        body["reply"]
            .as_str()
            .expect("reply")
            .contains("central library")
    );
}

#[tokio::test]
#[serial]
async fn test_validate_registration_endpoint() {
    let (router, _state) = setup().await;

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/validate-registration",
            None,
            json!({"registrationNumber": "225 088"}),
        ))
        .await
        .expect("validate request");
    let body = read_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["formatted"], "225/88");

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/validate-registration",
            None,
            json!({"registrationNumber": "999/1"}),
        ))
        .await
        .expect("validate request");
    let body = read_json(response).await;
    assert_eq!(body["valid"], false);
}
