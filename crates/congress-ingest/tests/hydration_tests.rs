//! Hydration and sync tests against a mock Congress.gov API and SQLite

use congress_common::{Chamber, CongressNumber, Identifier};
use congress_ingest::{
    CongressClient, HttpTransport, HydrationEngine, HydrationOptions, IngestConfig, IngestError,
    PassOutcome, PendingReference, Pipeline, RecordStore, Resource, SqliteDatabase, SyncMode,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const KEY: &str = "TEST_KEY";

fn config(server: &MockServer, dir: &TempDir) -> IngestConfig {
    IngestConfig::builder()
        .base_url(format!("{}/v3/", server.uri()))
        .api_host(server.uri())
        .retry_delay_ms(0)
        .db_path(dir.path().join("congress.db"))
        .build()
}

fn engine(server: &MockServer, dir: &TempDir, store: Arc<dyn RecordStore>) -> HydrationEngine {
    let config = config(server, dir);
    let transport = HttpTransport::new(&config, KEY).expect("transport");
    let options = HydrationOptions::from_config(&config, "committeeMeeting");
    HydrationEngine::new(Arc::new(transport), store, options)
}

fn detail_path(id: i64) -> String {
    format!("/v3/committee-meeting/119/house/{}", id)
}

fn pending(server: &MockServer, ids: &[i64]) -> Vec<PendingReference> {
    ids.iter()
        .map(|&id| {
            PendingReference::new(
                Identifier::from(id),
                format!("{}{}?format=json", server.uri(), detail_path(id)),
            )
        })
        .collect()
}

async fn mount_detail(server: &MockServer, id: i64, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(detail_path(id)))
        .and(query_param("format", "json"))
        .and(query_param("api_key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "committeeMeeting": {"eventId": id, "title": format!("Meeting {}", id)},
            "request": {"format": "json"}
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn records_table(dir: &TempDir) -> Arc<dyn RecordStore> {
    let db = SqliteDatabase::open(dir.path().join("congress.db")).await.unwrap();
    Arc::new(db.table("committee_meetings").await.unwrap())
}

#[tokio::test]
async fn test_rate_limit_then_resume() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Record 2 is throttled on the first attempt only
    Mock::given(method("GET"))
        .and(path(detail_path(2)))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_detail(&server, 1, 1).await;
    mount_detail(&server, 2, 1).await;
    mount_detail(&server, 3, 1).await;

    let store = records_table(&dir).await;

    let first = engine(&server, &dir, Arc::clone(&store))
        .run(pending(&server, &[1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(
        first.outcome,
        PassOutcome::Halted {
            identifier: Identifier::from(2)
        }
    );
    assert_eq!(first.persisted, 1);
    assert!(!store.contains(&Identifier::from(3)).await.unwrap());

    let second = engine(&server, &dir, Arc::clone(&store))
        .run(pending(&server, &[1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(second.outcome, PassOutcome::Drained);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.persisted, 2);
    assert_eq!(store.len().await.unwrap(), 3);
    assert_eq!(
        store.get(&Identifier::from(3)).await.unwrap(),
        Some(json!({"eventId": 3, "title": "Meeting 3"}))
    );
}

#[tokio::test]
async fn test_server_error_falls_back_to_xml_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(detail_path(7)))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(detail_path(7)))
        .and(query_param("format", "xml"))
        .and(query_param("api_key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<api-root><committeeMeeting><eventId>7</eventId><title>Markup</title></committeeMeeting></api-root>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let store = records_table(&dir).await;
    let report = engine(&server, &dir, Arc::clone(&store))
        .run(pending(&server, &[7]))
        .await
        .unwrap();

    assert_eq!(report.persisted, 1);
    assert_eq!(
        store.get(&Identifier::from(7)).await.unwrap(),
        Some(json!({"eventId": "7", "title": "Markup"}))
    );
}

#[tokio::test]
async fn test_repeated_server_error_aborts_pass() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(detail_path(7)))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(detail_path(7)))
        .and(query_param("format", "xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    mount_detail(&server, 8, 0).await;

    let store = records_table(&dir).await;
    let err = engine(&server, &dir, Arc::clone(&store))
        .run(pending(&server, &[7, 8]))
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::FatalFetch { ref identifier, .. } if *identifier == Identifier::from(7)));
    assert!(store.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_malformed_detail_is_deferred() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(detail_path(1)))
        .respond_with(ResponseTemplate::new(200).set_body_string("Service temporarily unavailable"))
        .expect(1)
        .mount(&server)
        .await;
    mount_detail(&server, 2, 1).await;

    let store = records_table(&dir).await;
    let report = engine(&server, &dir, Arc::clone(&store))
        .run(pending(&server, &[1, 2]))
        .await
        .unwrap();

    assert_eq!(report.outcome, PassOutcome::Drained);
    assert_eq!(report.deferred, vec![Identifier::from(1)]);
    assert_eq!(report.persisted, 1);
}

#[tokio::test]
async fn test_sync_lists_then_resumes_from_database() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v3/committee-meeting/119/house"))
        .and(query_param("limit", "250"))
        .and(query_param("api_key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "committeeMeetings": [
                {"eventId": 1, "url": format!("{}{}?format=json", server.uri(), detail_path(1))},
                {"eventId": 2, "url": format!("{}{}?format=json", server.uri(), detail_path(2))}
            ],
            "pagination": {"count": 2},
            "request": {"chamber": "house"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_detail(&server, 1, 1).await;
    mount_detail(&server, 2, 1).await;

    let config = config(&server, &dir);
    let db = SqliteDatabase::open(&config.db_path).await.unwrap();
    let pipeline = Pipeline::new(CongressClient::with_api_key(config, KEY).unwrap());
    let resource = Resource::committee_meetings(CongressNumber::default(), Chamber::House);

    let report = pipeline
        .sync_database(&db, &resource, SyncMode::Auto)
        .await
        .unwrap();
    assert_eq!(report.listed, Some(2));
    assert_eq!(report.hydration.persisted, 2);

    // Pending table is populated, so Auto does not list again
    let report = pipeline
        .sync_database(&db, &resource, SyncMode::Auto)
        .await
        .unwrap();
    assert_eq!(report.listed, None);
    assert_eq!(report.hydration.skipped, 2);

    let pending = db.table(&resource.pending_table()).await.unwrap();
    assert_eq!(pending.len().await.unwrap(), 2);
}
