//! In-process scenario tests for mts-daemon HTTP endpoints.
//!
//! The router is driven via `tower::ServiceExt::oneshot` over a
//! `MemoryTextStore`; no socket, no filesystem except the audit log test.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mts_authfiles::CredentialEntry;
use mts_config::MountSyncConfig;
use mts_daemon::{credentials::CredentialGenerator, routes, state::AppState};
use mts_store::MemoryTextStore;
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const USERS: &str = "USERS.aut";
const GROUPS: &str = "GROUPS.aut";
const MOUNTS: &str = "clientmounts.aut";

struct FixedCredentials;

impl CredentialGenerator for FixedCredentials {
    fn generate(&self) -> CredentialEntry {
        CredentialEntry::new("newuser1", "PW123456")
    }
}

fn seeded_store() -> Arc<MemoryTextStore> {
    Arc::new(MemoryTextStore::with_files([
        (USERS, "alice:APW\n"),
        (GROUPS, "galice:alice:1\n"),
        (MOUNTS, "#ALM3\nCMRP:galice\n"),
    ]))
}

fn make_state(store: Arc<MemoryTextStore>) -> AppState {
    AppState::new(MountSyncConfig::default(), store).with_credentials(Arc::new(FixedCredentials))
}

fn make_router(store: Arc<MemoryTextStore>) -> axum::Router {
    routes::build_router(Arc::new(make_state(store)))
}

async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, serde_json::Value) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = serde_json::from_slice(&body).expect("body is not valid JSON");
    (status, json)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let req = Request::builder()
        .uri("/v1/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, json) = call(make_router(seeded_store()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "mts-daemon");
}

#[tokio::test]
async fn custom_base_path_moves_every_route() {
    let mut config = MountSyncConfig::default();
    config.daemon.base_path = "/caster/api".to_string();
    let router = routes::build_router(Arc::new(AppState::new(config, seeded_store())));

    let req = Request::builder()
        .uri("/caster/api/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
        .uri("/v1/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// POST /v1/activate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn activate_writes_all_three_files() {
    let store = seeded_store();
    let req = post_json(
        "/v1/activate",
        serde_json::json!({
            "serial": "SN-001",
            "tariff": "rtk-basic",
            "stations": [
                { "name": "ALM3", "formats": ["/CMRP", "RTCM32:"] },
                { "name": "KRD1", "formats": ["RTCM32"] }
            ]
        }),
    );
    let (status, json) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["login"], "newuser1");
    assert_eq!(json["password"], "PW123456");
    assert_eq!(json["group"], "gnewuser1");

    assert_eq!(store.get(USERS).unwrap(), "alice:APW\nnewuser1:PW123456\n");
    assert_eq!(
        store.get(GROUPS).unwrap(),
        "galice:alice:1\ngnewuser1:newuser1:1\n"
    );
    assert_eq!(
        store.get(MOUNTS).unwrap(),
        "#ALM3\nCMRP:galice,gnewuser1\nRTCM32:gnewuser1\n#KRD1\nRTCM32:gnewuser1\n"
    );
}

#[tokio::test]
async fn activate_on_empty_caster_creates_files() {
    let store = Arc::new(MemoryTextStore::new());
    let req = post_json(
        "/v1/activate",
        serde_json::json!({
            "serial": "SN-002",
            "login": "bob",
            "password": "BPW",
            "group": "team",
            "stations": [{ "name": "ALM3", "formats": ["CMRP"] }]
        }),
    );
    let (status, _) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.get(USERS).unwrap(), "bob:BPW\n");
    assert_eq!(store.get(GROUPS).unwrap(), "team:bob:1\n");
    assert_eq!(store.get(MOUNTS).unwrap(), "#ALM3\nCMRP:team\n");
}

#[tokio::test]
async fn activate_duplicate_login_is_409_and_touches_nothing() {
    let store = seeded_store();
    let req = post_json(
        "/v1/activate",
        serde_json::json!({
            "serial": "SN-003",
            "login": "alice",
            "stations": [{ "name": "KRD1", "formats": ["CMRP"] }]
        }),
    );
    let (status, json) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "duplicate_login");

    assert_eq!(store.get(USERS).unwrap(), "alice:APW\n");
    assert_eq!(store.get(MOUNTS).unwrap(), "#ALM3\nCMRP:galice\n");
}

#[tokio::test]
async fn activate_without_stations_is_400() {
    let store = seeded_store();
    let req = post_json("/v1/activate", serde_json::json!({ "serial": "SN-004" }));
    let (status, json) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
    assert_eq!(store.get(USERS).unwrap(), "alice:APW\n");
}

#[tokio::test]
async fn activate_with_malformed_station_is_400() {
    let store = seeded_store();
    let req = post_json(
        "/v1/activate",
        serde_json::json!({
            "serial": "SN-005",
            "stations": [{ "name": "ALM3", "formats": [] }]
        }),
    );
    let (status, json) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
    assert_eq!(store.get(GROUPS).unwrap(), "galice:alice:1\n");
}

#[tokio::test]
async fn activate_stations_not_an_array_is_400() {
    let req = post_json(
        "/v1/activate",
        serde_json::json!({ "serial": "SN-006", "stations": "ALM3" }),
    );
    let (status, json) = call(make_router(seeded_store()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
}

#[tokio::test]
async fn activate_mount_write_failure_rolls_back_earlier_files() {
    let store = seeded_store();
    store.fail_writes_to(MOUNTS);

    let req = post_json(
        "/v1/activate",
        serde_json::json!({
            "serial": "SN-007",
            "stations": [{ "name": "ALM3", "formats": ["CMRP"] }]
        }),
    );
    let (status, json) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["kind"], "transfer");

    assert_eq!(store.get(USERS).unwrap(), "alice:APW\n");
    assert_eq!(store.get(GROUPS).unwrap(), "galice:alice:1\n");
    assert_eq!(store.get(MOUNTS).unwrap(), "#ALM3\nCMRP:galice\n");
}

// ---------------------------------------------------------------------------
// POST /v1/deactivate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deactivate_via_query_removes_login_group_and_mounts() {
    let store = Arc::new(MemoryTextStore::with_files([
        (USERS, "alice:APW\nbob:BPW\n"),
        (GROUPS, "galice:alice:1\ngbob:bob:1\n"),
        (MOUNTS, "#ALM3\nCMRP:galice,gbob\n#KRD1\nRTCM32:gbob\n"),
    ]));
    let req = Request::builder()
        .method("POST")
        .uri("/v1/deactivate?login=bob&group=gbob")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, json) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["memberships_removed"], 1);

    assert_eq!(store.get(USERS).unwrap(), "alice:APW\n");
    assert_eq!(store.get(GROUPS).unwrap(), "galice:alice:1\n");
    assert_eq!(store.get(MOUNTS).unwrap(), "#ALM3\nCMRP:galice\n");
}

#[tokio::test]
async fn deactivate_via_body_works_too() {
    let store = seeded_store();
    let req = post_json(
        "/v1/deactivate",
        serde_json::json!({ "login": "alice", "group": "galice" }),
    );
    let (status, _) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.get(USERS).unwrap(), "");
    assert_eq!(store.get(MOUNTS).unwrap(), "");
}

#[tokio::test]
async fn deactivate_unknown_login_is_404_and_touches_nothing() {
    let store = seeded_store();
    let req = post_json(
        "/v1/deactivate",
        serde_json::json!({ "login": "ghost", "group": "galice" }),
    );
    let (status, json) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
    assert_eq!(store.get(GROUPS).unwrap(), "galice:alice:1\n");
    assert_eq!(store.get(MOUNTS).unwrap(), "#ALM3\nCMRP:galice\n");
}

#[tokio::test]
async fn deactivate_missing_group_is_400() {
    let req = Request::builder()
        .method("POST")
        .uri("/v1/deactivate?login=alice")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, json) = call(make_router(seeded_store()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
}

// ---------------------------------------------------------------------------
// POST /v1/stations/sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stations_sync_converges_group_onto_snapshot() {
    let store = Arc::new(MemoryTextStore::with_files([(
        MOUNTS,
        "#ALM3\nCMRP:gteam,gother\n#KRD1\nRTCM32:gteam\n",
    )]));
    let req = post_json(
        "/v1/stations/sync",
        serde_json::json!({
            "group": "gteam",
            "stations": [
                { "code": "#NEW1", "formats": ["/RTCM32"] },
                { "station_code": "#KRD1", "formats": ["RTCM32"] }
            ]
        }),
    );
    let (status, json) = call(make_router(store.clone()), req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["group"], "gteam");
    assert_eq!(
        store.get(MOUNTS).unwrap(),
        "#ALM3\nCMRP:gother\n#KRD1\nRTCM32:gteam\n#NEW1\nRTCM32:gteam\n"
    );
}

#[tokio::test]
async fn stations_sync_repeated_is_noop() {
    let store = Arc::new(MemoryTextStore::with_files([(MOUNTS, "#ALM3\nCMRP:gteam\n")]));
    let body = serde_json::json!({
        "group": "gteam",
        "stations": [{ "code": "#ALM3", "formats": ["CMRP"] }]
    });
    let (status, json) = call(make_router(store.clone()), post_json("/v1/stations/sync", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["changes"].as_array().unwrap().len(), 0);
    assert_eq!(store.get(MOUNTS).unwrap(), "#ALM3\nCMRP:gteam\n");
}

#[tokio::test]
async fn stations_sync_without_group_is_400() {
    let req = post_json("/v1/stations/sync", serde_json::json!({ "stations": [] }));
    let (status, json) = call(make_router(seeded_store()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
}

#[tokio::test]
async fn stations_sync_while_mounts_file_is_locked_is_503() {
    let mut config = MountSyncConfig::default();
    config.store.lock_timeout_ms = 50;
    let store = Arc::new(MemoryTextStore::with_files([(MOUNTS, "#ALM3\nCMRP:gteam\n")]));
    let st = Arc::new(AppState::new(config, store.clone()));

    let held = st
        .locks
        .acquire(&[st.mounts_path()], std::time::Duration::from_secs(1))
        .await
        .unwrap();

    let req = post_json(
        "/v1/stations/sync",
        serde_json::json!({ "group": "gteam", "stations": [] }),
    );
    let (status, json) = call(routes::build_router(st.clone()), req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{json}");
    assert_eq!(json["kind"], "lock_timeout");
    assert_eq!(json["success"], false);
    assert_eq!(store.get(MOUNTS).unwrap(), "#ALM3\nCMRP:gteam\n");

    drop(held);
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_request_lands_in_a_valid_hash_chain_without_passwords() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("audit.jsonl");

    let writer = mts_audit::AuditWriter::open(&log, true).unwrap();
    let state = make_state(seeded_store()).with_audit(writer);
    let router = routes::build_router(Arc::new(state));

    let ok = post_json(
        "/v1/activate",
        serde_json::json!({
            "serial": "SN-010",
            "tariff": "rtk-monthly",
            "stations": [{ "name": "ALM3", "formats": ["CMRP"] }]
        }),
    );
    let (status, _) = call(router.clone(), ok).await;
    assert_eq!(status, StatusCode::OK);

    let dup = post_json(
        "/v1/activate",
        serde_json::json!({
            "serial": "SN-011",
            "stations": [{ "name": "ALM3", "formats": ["CMRP"] }]
        }),
    );
    let (status, _) = call(router, dup).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let content = std::fs::read_to_string(&log).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(!content.contains("PW123456"));
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records[0]["payload"]["serial"], "SN-010");
    assert_eq!(records[0]["payload"]["tariff"], "rtk-monthly");
    assert_eq!(records[1]["payload"]["serial"], "SN-011");
    assert_eq!(records[1]["payload"]["kind"], "duplicate_login");
    assert!(content.contains("\"outcome\":\"failed\""));
    assert_eq!(
        mts_audit::verify_hash_chain(&log).unwrap(),
        mts_audit::VerifyResult::Valid { lines: 2 }
    );
}
