use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use tower::ServiceExt;

use wayfare::config::{AppConfig, TerminalPolicy};
use wayfare::db;
use wayfare::handlers;
use wayfare::models::{Provider, ProviderStatus, ServiceKind};
use wayfare::services::credentials::{Argon2Verifier, CredentialVerifier};
use wayfare::services::ids::SqliteSequenceAllocator;
use wayfare::services::mailer::Mailer;
use wayfare::state::AppState;

// ── Mock Mailer ──

type SentMail = Arc<Mutex<Vec<(String, String, String)>>>;

struct MockMailer {
    sent: SentMail,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay timed out")
    }
}

// ── Helpers ──

fn test_config(upload_dir: &str, policy: TerminalPolicy) -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        upload_dir: upload_dir.to_string(),
        status_policy: policy,
        mail_api_url: String::new(),
        mail_api_key: String::new(),
        mail_from: "no-reply@test.example".to_string(),
        admin_email: "admin@test.example".to_string(),
        admin_password: "admin-password".to_string(),
    }
}

fn temp_upload_dir() -> String {
    std::env::temp_dir()
        .join(format!("wayfare-test-{}", uuid::Uuid::new_v4()))
        .to_str()
        .unwrap()
        .to_string()
}

fn build_state(mailer: Box<dyn Mailer>, policy: TerminalPolicy) -> Arc<AppState> {
    let upload_dir = temp_upload_dir();
    let config = test_config(&upload_dir, policy);
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        mailer,
        credentials: Box::new(Argon2Verifier),
        ids: Box::new(SqliteSequenceAllocator),
    })
}

fn test_state() -> (Arc<AppState>, SentMail) {
    let sent: SentMail = Arc::new(Mutex::new(vec![]));
    let state = build_state(
        Box::new(MockMailer {
            sent: Arc::clone(&sent),
        }),
        TerminalPolicy::Forbid,
    );
    (state, sent)
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Give spawned notification tasks a chance to run.
async fn drain_notifications() {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}

const BOUNDARY: &str = "wayfare-test-boundary";

fn multipart_request(
    uri: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body: Vec<u8> = vec![];
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn application_fields<'a>(email: &'a str, business: &'a str, phone: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("business_name", business),
        ("contact_name", "Mara Holt"),
        ("email", email),
        ("phone", phone),
        ("service_type", "accommodation"),
        ("address", "2 Shore Rd"),
    ]
}

fn seed_provider(state: &Arc<AppState>, id: &str, kind: ServiceKind, status: ProviderStatus, password: &str) {
    let now = Utc::now().naive_utc();
    let db = state.db.lock().unwrap();
    db::providers::create_provider(
        &db,
        &Provider {
            id: id.to_string(),
            business_name: format!("biz-{id}"),
            contact_name: "Owner".to_string(),
            email: format!("{id}@example.com"),
            phone: format!("+1555{id}"),
            service_type: kind,
            address: None,
            description: None,
            document_file: None,
            image_file: None,
            status,
            payment_status: "Unpaid".to_string(),
            password_hash: Some(Argon2Verifier.hash(password).unwrap()),
            created_at: now,
            updated_at: now,
        },
    )
    .unwrap();
}

fn seed_admin(state: &Arc<AppState>, password: &str) -> String {
    let db = state.db.lock().unwrap();
    let hash = Argon2Verifier.hash(password).unwrap();
    db::admins::ensure_admin(&db, "admin@test.example", &hash).unwrap();
    db::admins::get_admin_by_email(&db, "admin@test.example")
        .unwrap()
        .unwrap()
        .id
}

async fn create_accommodation_with_rooms(
    state: &Arc<AppState>,
    provider_id: &str,
) -> serde_json::Value {
    let app = test_app(state.clone());
    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/api/provider/{provider_id}/accommodations"),
            serde_json::json!({
                "name": "Lakeside Lodge",
                "address": "2 Shore Rd",
                "city": "Lakeview",
                "rooms": [
                    {"room_type": "Double", "capacity": 2, "price_per_night": 2000.0},
                    {"room_type": "Suite", "capacity": 4, "price_per_night": 5000.0}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await
}

fn extract_code(mail_body: &str) -> String {
    mail_body
        .split_whitespace()
        .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
        .expect("mail should contain a 6-digit code")
        .to_string()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state();
    let res = test_app(state)
        .oneshot(get_request("/health"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Provider applications ──

#[tokio::test]
async fn test_application_creates_pending_provider() {
    let (state, _) = test_state();
    let app = test_app(state.clone());

    let res = app
        .oneshot(multipart_request(
            "/api/become-provider",
            &application_fields("mara@summit.example", "Summit Stays", "+15550001"),
            &[("document", "licence.pdf", b"pdf-bytes")],
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["status"], "Pending");
    assert_eq!(json["service_type"], "accommodation");
    assert_eq!(json["payment_status"], "Unpaid");

    // The uploaded document landed on disk under its generated name.
    let document = json["document_file"].as_str().unwrap().to_string();
    let path = PathBuf::from(&state.config.upload_dir).join(&document);
    assert!(path.exists());
}

#[tokio::test]
async fn test_duplicate_application_conflicts_and_cleans_uploads() {
    let (state, _) = test_state();

    let res = test_app(state.clone())
        .oneshot(multipart_request(
            "/api/become-provider",
            &application_fields("mara@summit.example", "Summit Stays", "+15550001"),
            &[("document", "licence.pdf", b"pdf-bytes")],
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Same email, different business and phone.
    let res = test_app(state.clone())
        .oneshot(multipart_request(
            "/api/service-provider-applications",
            &application_fields("mara@summit.example", "Other Stays", "+15550002"),
            &[("document", "licence2.pdf", b"other-bytes")],
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Only the first application's file remains in storage.
    let entries = std::fs::read_dir(&state.config.upload_dir)
        .unwrap()
        .count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn test_application_requires_fields() {
    let (state, _) = test_state();
    let res = test_app(state)
        .oneshot(multipart_request(
            "/api/become-provider",
            &[("business_name", "No Contact Info")],
            &[],
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Admin approval workflow ──

#[tokio::test]
async fn test_approval_emails_credential_that_can_log_in() {
    let (state, sent) = test_state();

    let res = test_app(state.clone())
        .oneshot(multipart_request(
            "/api/become-provider",
            &application_fields("mara@summit.example", "Summit Stays", "+15550001"),
            &[],
        ))
        .await
        .unwrap();
    let provider_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/providers/{provider_id}/approve"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "Approved");

    drain_notifications().await;
    let credential = {
        let mails = sent.lock().unwrap();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].0, "mara@summit.example");
        // The minted password sits alone on its own indented line.
        mails[0]
            .2
            .lines()
            .map(|l| l.trim())
            .find(|l| l.len() == 12 && l.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|l| l.to_string())
            .expect("mail should contain the credential")
    };

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/provider/login",
            serde_json::json!({"email": "mara@summit.example", "password": credential}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "Approved");
    assert_eq!(json["payment_status"], "Unpaid");
}

#[tokio::test]
async fn test_rejection_is_terminal_and_notifies() {
    let (state, sent) = test_state();

    let res = test_app(state.clone())
        .oneshot(multipart_request(
            "/api/become-provider",
            &application_fields("theo@ridge.example", "Ridge Riders", "+15550003"),
            &[],
        ))
        .await
        .unwrap();
    let provider_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/providers/{provider_id}/reject"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Rejected");

    drain_notifications().await;
    assert_eq!(sent.lock().unwrap().len(), 1);

    // A second decision on the same application conflicts.
    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/admin/providers/{provider_id}/approve"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_login() {
    let (state, _) = test_state();
    seed_admin(&state, "admin-password");

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            serde_json::json!({"email": "admin@test.example", "password": "admin-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            serde_json::json!({"email": "admin@test.example", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_lists_pending_applications() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Pending, "pw-aaaaaaa");
    seed_provider(&state, "p2", ServiceKind::Transportation, ProviderStatus::Approved, "pw-bbbbbbb");

    let res = test_app(state)
        .oneshot(get_request("/api/admin/providers?status=Pending"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "p1");
    // Hashes never leave the server.
    assert!(list[0].get("password_hash").is_none());
}

// ── Catalog CRUD ──

#[tokio::test]
async fn test_catalog_requires_approved_provider() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Pending, "pw-aaaaaaa");

    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/provider/p1/accommodations",
            serde_json::json!({"name": "X", "address": "Y", "city": "Z"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_catalog_requires_matching_service_type() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");

    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/provider/p1/transportations",
            serde_json::json!({
                "name": "Shuttle", "vehicle_type": "Bus", "origin": "A", "destination": "B",
                "seats": 10, "price": 5.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_service_ids_are_sequential_and_unique() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");

    let mut ids = vec![];
    for n in 0..3 {
        let res = test_app(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/provider/p1/accommodations",
                serde_json::json!({
                    "name": format!("Stay {n}"), "address": "2 Shore Rd", "city": "Lakeview"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        ids.push(body_json(res).await["id"].as_str().unwrap().to_string());
    }

    assert_eq!(ids, vec!["ACC01", "ACC02", "ACC03"]);
}

#[tokio::test]
async fn test_public_catalog_listing() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");
    create_accommodation_with_rooms(&state, "p1").await;

    let res = test_app(state.clone())
        .oneshot(get_request("/api/accommodations"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Lakeside Lodge");
    assert_eq!(json[0]["rooms"].as_array().unwrap().len(), 2);

    let res = test_app(state)
        .oneshot(get_request("/api/accommodations/ACC01"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["city"], "Lakeview");
}

#[tokio::test]
async fn test_unknown_collection_is_not_found() {
    let (state, _) = test_state();
    let res = test_app(state)
        .oneshot(get_request("/api/spaceships"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_room_reconciliation_removes_omitted_room_and_its_image() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");

    // Two rooms, the second with an image file that exists on disk.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/provider/p1/accommodations",
            serde_json::json!({
                "name": "Lakeside Lodge",
                "address": "2 Shore Rd",
                "city": "Lakeview",
                "rooms": [
                    {"room_type": "Double", "capacity": 2, "price_per_night": 2000.0},
                    {"room_type": "Suite", "capacity": 4, "price_per_night": 5000.0,
                     "image_file": "suite.jpg"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = body_json(res).await;
    let rooms = created["rooms"].as_array().unwrap();
    let kept_id = rooms[0]["id"].as_str().unwrap().to_string();
    let dropped_id = rooms[1]["id"].as_str().unwrap().to_string();

    std::fs::create_dir_all(&state.config.upload_dir).unwrap();
    let image_path = PathBuf::from(&state.config.upload_dir).join("suite.jpg");
    std::fs::write(&image_path, b"jpg").unwrap();

    // Modify room 1, add a new room, omit room 2.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            "/api/provider/p1/accommodations/ACC01",
            serde_json::json!({
                "name": "Lakeside Lodge",
                "address": "2 Shore Rd",
                "city": "Lakeview",
                "rooms": [
                    {"id": kept_id, "room_type": "Double Deluxe", "capacity": 3,
                     "price_per_night": 2500.0},
                    {"room_type": "Single", "capacity": 1, "price_per_night": 900.0}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    let rooms = updated["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0]["room_type"], "Double Deluxe");
    assert!(rooms.iter().all(|r| r["id"] != dropped_id.as_str()));

    // Omitted room is gone from the database and its image from disk.
    {
        let db = state.db.lock().unwrap();
        assert!(db::catalog::get_room(&db, &dropped_id).unwrap().is_none());
    }
    assert!(!image_path.exists());
}

#[tokio::test]
async fn test_delete_service() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");
    create_accommodation_with_rooms(&state, "p1").await;

    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/provider/p1/accommodations/ACC01")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(get_request("/api/accommodations/ACC01"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Bookings ──

#[tokio::test]
async fn test_booking_flow_create_then_approve() {
    let (state, sent) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");
    let created = create_accommodation_with_rooms(&state, "p1").await;
    let room_id = created["rooms"][0]["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/accommodation",
            serde_json::json!({
                "accommodation_id": "ACC01",
                "room_id": room_id,
                "guest_name": "Ana",
                "guest_email": "ana@example.com",
                "check_in": "2026-09-01",
                "check_out": "2026-09-04",
                "total_guests": 2,
                "total_price": 4000.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let booking = body_json(res).await;
    assert_eq!(booking["status"], "Pending");
    assert!(booking["approved_at"].is_null());
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{booking_id}/status"),
            serde_json::json!({"status": "Approved", "provider_id": "p1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let decided = body_json(res).await;
    assert_eq!(decided["status"], "Approved");
    assert!(decided["approved_at"].is_string());
    assert!(decided["rejected_at"].is_null());

    drain_notifications().await;
    let mails = sent.lock().unwrap();
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].0, "ana@example.com");
    assert!(mails[0].2.contains("Lakeside Lodge"));
    assert!(mails[0].2.contains(&booking_id));
}

#[tokio::test]
async fn test_second_decision_conflicts_and_keeps_timestamps() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");
    let created = create_accommodation_with_rooms(&state, "p1").await;
    let room_id = created["rooms"][0]["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/accommodation",
            serde_json::json!({
                "accommodation_id": "ACC01",
                "room_id": room_id,
                "guest_name": "Ana",
                "guest_email": "ana@example.com",
                "check_in": "2026-09-01",
                "check_out": "2026-09-04",
                "total_guests": 2,
                "total_price": 4000.0
            }),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{booking_id}/status"),
            serde_json::json!({"status": "Rejected", "provider_id": "p1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{booking_id}/status"),
            serde_json::json!({"status": "Approved", "provider_id": "p1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The rejection stands, timestamps mutually exclusive.
    let db = state.db.lock().unwrap();
    let stored = db::bookings::get_accommodation_booking(&db, &booking_id)
        .unwrap()
        .unwrap();
    assert!(stored.rejected_at.is_some());
    assert!(stored.approved_at.is_none());
}

#[tokio::test]
async fn test_idempotent_policy_allows_identical_repeat() {
    let sent: SentMail = Arc::new(Mutex::new(vec![]));
    let state = build_state(
        Box::new(MockMailer {
            sent: Arc::clone(&sent),
        }),
        TerminalPolicy::Idempotent,
    );
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");
    let created = create_accommodation_with_rooms(&state, "p1").await;
    let room_id = created["rooms"][0]["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/accommodation",
            serde_json::json!({
                "accommodation_id": "ACC01",
                "room_id": room_id,
                "guest_name": "Ana",
                "guest_email": "ana@example.com",
                "check_in": "2026-09-01",
                "check_out": "2026-09-04",
                "total_guests": 2,
                "total_price": 4000.0
            }),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let res = test_app(state.clone())
            .oneshot(json_request(
                "PUT",
                &format!("/api/bookings/{booking_id}/status"),
                serde_json::json!({"status": "Approved", "provider_id": "p1"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    // A conflicting decision is still refused.
    let res = test_app(state)
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{booking_id}/status"),
            serde_json::json!({"status": "Rejected", "provider_id": "p1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_status_update_authorization() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");
    seed_provider(&state, "p2", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-bbbbbbb");
    seed_provider(&state, "p3", ServiceKind::Accommodation, ProviderStatus::Pending, "pw-ccccccc");
    let created = create_accommodation_with_rooms(&state, "p1").await;
    let room_id = created["rooms"][0]["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/accommodation",
            serde_json::json!({
                "accommodation_id": "ACC01",
                "room_id": room_id,
                "guest_name": "Ana",
                "guest_email": "ana@example.com",
                "check_in": "2026-09-01",
                "check_out": "2026-09-04",
                "total_guests": 2,
                "total_price": 4000.0
            }),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["id"].as_str().unwrap().to_string();

    // Another provider's decision is refused.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{booking_id}/status"),
            serde_json::json!({"status": "Approved", "provider_id": "p2"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // An unapproved provider cannot decide anything.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{booking_id}/status"),
            serde_json::json!({"status": "Approved", "provider_id": "p3"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // A malformed status is a validation error.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{booking_id}/status"),
            serde_json::json!({"status": "Maybe", "provider_id": "p1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // An unknown booking is not found.
    let res = test_app(state)
        .oneshot(json_request(
            "PUT",
            "/api/bookings/no-such-booking/status",
            serde_json::json!({"status": "Approved", "provider_id": "p1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_status_update() {
    let state = build_state(Box::new(FailingMailer), TerminalPolicy::Forbid);
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");
    let created = create_accommodation_with_rooms(&state, "p1").await;
    let room_id = created["rooms"][0]["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/accommodation",
            serde_json::json!({
                "accommodation_id": "ACC01",
                "room_id": room_id,
                "guest_name": "Ana",
                "guest_email": "ana@example.com",
                "check_in": "2026-09-01",
                "check_out": "2026-09-04",
                "total_guests": 2,
                "total_price": 4000.0
            }),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/bookings/{booking_id}/status"),
            serde_json::json!({"status": "Approved", "provider_id": "p1"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    drain_notifications().await;

    // The transition was not rolled back.
    let db = state.db.lock().unwrap();
    let stored = db::bookings::get_accommodation_booking(&db, &booking_id)
        .unwrap()
        .unwrap();
    assert!(stored.approved_at.is_some());
}

#[tokio::test]
async fn test_booking_validation() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");
    let created = create_accommodation_with_rooms(&state, "p1").await;
    let room_id = created["rooms"][0]["id"].as_str().unwrap().to_string();

    // Dates inverted.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/accommodation",
            serde_json::json!({
                "accommodation_id": "ACC01",
                "room_id": room_id,
                "guest_name": "Ana",
                "guest_email": "ana@example.com",
                "check_in": "2026-09-04",
                "check_out": "2026-09-01",
                "total_guests": 2,
                "total_price": 4000.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Unknown accommodation.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/accommodation",
            serde_json::json!({
                "accommodation_id": "ACC99",
                "room_id": room_id,
                "guest_name": "Ana",
                "guest_email": "ana@example.com",
                "check_in": "2026-09-01",
                "check_out": "2026-09-04",
                "total_guests": 2,
                "total_price": 4000.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_provider_sees_bookings_across_variants() {
    let (state, _) = test_state();
    seed_provider(&state, "p1", ServiceKind::Transportation, ProviderStatus::Approved, "pw-aaaaaaa");

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/provider/p1/transportations",
            serde_json::json!({
                "name": "Coast Shuttle", "vehicle_type": "Minibus",
                "origin": "Airport", "destination": "Harbor",
                "seats": 14, "price": 45.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/transportation",
            serde_json::json!({
                "transportation_id": "TRN01",
                "guest_name": "Ben",
                "guest_email": "ben@example.com",
                "travel_date": "2026-10-02",
                "seats": 2,
                "total_price": 90.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state)
        .oneshot(get_request("/api/provider/p1/bookings"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["guest_name"], "Ben");
    assert_eq!(list[0]["status"], "Pending");
}

// ── OTP password change ──

#[tokio::test]
async fn test_admin_otp_password_change_flow() {
    let (state, sent) = test_state();
    let admin_id = seed_admin(&state, "admin-password");

    // Wrong current password is refused up front.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/{admin_id}/send-otp-password-change"),
            serde_json::json!({"current_password": "wrong", "new_password": "next-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Too-short replacement is a policy error.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/{admin_id}/send-otp-password-change"),
            serde_json::json!({"current_password": "admin-password", "new_password": "short"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/{admin_id}/send-otp-password-change"),
            serde_json::json!({"current_password": "admin-password", "new_password": "next-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    drain_notifications().await;
    let code = {
        let mails = sent.lock().unwrap();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].0, "admin@test.example");
        extract_code(&mails[0].2)
    };

    // Submitting a different password than the staged one is refused.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/admin/{admin_id}/verify-otp-and-change-password"),
            serde_json::json!({"otp": code, "new_password": "tampered-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            &format!("/api/admin/{admin_id}/verify-otp-and-change-password"),
            serde_json::json!({"otp": code, "new_password": "next-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // New password works, the code is spent.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            serde_json::json!({"email": "admin@test.example", "password": "next-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(json_request(
            "PUT",
            &format!("/api/admin/{admin_id}/verify-otp-and-change-password"),
            serde_json::json!({"otp": code, "new_password": "next-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_otp_password_change() {
    let (state, sent) = test_state();
    seed_provider(&state, "p1", ServiceKind::Accommodation, ProviderStatus::Approved, "pw-aaaaaaa");

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/provider/p1/send-otp-password-change",
            serde_json::json!({"current_password": "pw-aaaaaaa", "new_password": "pw-replacement"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    drain_notifications().await;
    let code = extract_code(&sent.lock().unwrap()[0].2);

    let res = test_app(state.clone())
        .oneshot(json_request(
            "PUT",
            "/api/provider/p1/verify-otp-and-change-password",
            serde_json::json!({"otp": code, "new_password": "pw-replacement"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/provider/login",
            serde_json::json!({"email": "p1@example.com", "password": "pw-replacement"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
