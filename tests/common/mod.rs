use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use finditback::api::{ApiClient, CredentialProvider, StaticCredentials};
use finditback::config::ApiConfig;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Client for a mock server, authenticated with `token` when given.
#[allow(dead_code)]
pub fn client_for(base_url: &str, token: Option<&str>) -> (ApiClient, Arc<StaticCredentials>) {
    let credentials = Arc::new(match token {
        Some(token) => StaticCredentials::new(token),
        None => StaticCredentials::anonymous(),
    });
    let config = ApiConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    };
    let provider: Arc<dyn CredentialProvider> = credentials.clone();
    let client = ApiClient::new(&config, provider).expect("client");
    (client, credentials)
}

/// Wire form of a message
#[allow(dead_code)]
pub fn message_json(id: &str, sender: &str, text: &str) -> Value {
    json!({
        "_id": id,
        "sender": {"_id": sender, "username": sender},
        "text": text,
        "timestamp": "2025-03-01T12:00:00Z"
    })
}

/// Wire form of an item posted by `poster`
#[allow(dead_code)]
pub fn item_json(id: &str, title: &str, poster: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "description": "desc",
        "location": "Central station",
        "category": "other",
        "postedBy": {"_id": poster, "username": poster},
        "createdAt": "2025-03-01T09:00:00Z"
    })
}
