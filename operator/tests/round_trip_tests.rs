use actix_web::{web, App, HttpServer};
use common::crypto::generate_key_pair;
use integrity_monitor::server::{configure, AppState};
use integrity_monitor::{AuthGate, ChallengeStore, IntegrityEngine};
use integrity_operator::{OperatorClient, OperatorError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Starts a monitor on an ephemeral port and returns its base URL.
fn spawn_monitor(root: &Path, public_key: String) -> String {
    let state = web::Data::new(AppState {
        gate: AuthGate::new(ChallengeStore::default(), Some(public_key)),
        engine: Arc::new(IntegrityEngine::new(root, None)),
        enable_demo_keys: false,
    });

    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .workers(1)
        .bind("127.0.0.1:0")
        .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    format!("http://{}", addr)
}

#[actix_web::test]
async fn test_operator_hashes_through_session() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("present.txt"), b"content").unwrap();
    let keys = generate_key_pair().unwrap();
    let url = spawn_monitor(dir.path(), keys.public_key.clone());

    let client = OperatorClient::new(&url, Some(keys.private_key)).unwrap();
    let records = client
        .hash_files(&["present.txt".to_string(), "absent.txt".to_string()])
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[0].is_hashed());
    assert!(records[1].error_message.is_some());

    let tree = client.file_tree("*.txt").await.unwrap();
    assert_eq!(tree.len(), 1);
}

#[actix_web::test]
async fn test_operator_with_wrong_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let trusted = generate_key_pair().unwrap();
    let other = generate_key_pair().unwrap();
    let url = spawn_monitor(dir.path(), trusted.public_key);

    let client = OperatorClient::new(&url, Some(other.private_key)).unwrap();
    let err = client.hash_files(&["x".to_string()]).await.unwrap_err();
    assert!(matches!(err, OperatorError::Rejected(403)));
}

#[actix_web::test]
async fn test_operator_without_key_cannot_sign() {
    let dir = TempDir::new().unwrap();
    let trusted = generate_key_pair().unwrap();
    let url = spawn_monitor(dir.path(), trusted.public_key);

    let client = OperatorClient::new(&url, None).unwrap();
    assert_eq!(client.challenge("/").await.unwrap().len(), 32);
    assert!(matches!(client.file_tree("*").await, Err(OperatorError::ConfigError(_))));
}
