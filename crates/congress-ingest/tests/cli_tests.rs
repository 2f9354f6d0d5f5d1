//! End-to-end tests for the congress-ingest binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("congress-ingest").unwrap();
    cmd.env_remove("DATA_GOV_API_KEY")
        .env_remove("CONGRESS_API_BASE_URL")
        .env_remove("CONGRESS_API_HOST")
        .env("HOME", home.path())
        .env("LOG_LEVEL", "info");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("events"))
        .stdout(predicate::str::contains("committees"));
}

#[test]
fn test_invalid_chamber_rejected() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["events", "--chamber", "joint", "--api-key", "KEY"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid chamber"));
}

#[test]
fn test_congress_out_of_range_rejected() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["events", "--congress", "150", "--api-key", "KEY"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid congress number"));
}

#[test]
fn test_congress_must_be_numeric() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["events", "--congress", "abc", "--api-key", "KEY"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'abc', must be an integer"));
}

#[test]
fn test_committees_reject_nochamber() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("congress.db");
    cmd(&home)
        .args(["committees", "--chamber", "nochamber", "--db"])
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported for committees"));
    assert!(!db.exists());
}

#[test]
fn test_missing_api_key() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["committees", "--chamber", "senate", "--db"])
        .arg(home.path().join("congress.db"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATA_GOV_API_KEY"));
}

#[tokio::test]
async fn test_committees_sync_against_mock_api() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v3/committee/senate"))
        .and(query_param("api_key", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "committees": [
                {"systemCode": "ssap00", "url": format!("{}/v3/committee/senate/ssap00?format=json", server.uri())}
            ],
            "pagination": {"count": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/committee/senate/ssap00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "committee": {"systemCode": "ssap00", "name": "Appropriations"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = home.path().join("data").join("congress.db");
    cmd(&home)
        .env("CONGRESS_API_BASE_URL", format!("{}/v3/", server.uri()))
        .env("CONGRESS_API_HOST", server.uri())
        .env("CONGRESS_RETRY_DELAY_MS", "0")
        .args(["committees", "--chamber", "senate", "--no-progress", "--api-key", "KEY", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Done with all records"));

    assert!(db.exists());
}
