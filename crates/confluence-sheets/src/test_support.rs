use std::path::PathBuf;

use serde_json::json;

pub const TEST_PRIVATE_KEY: &str = include_str!("../testdata/service_account_key.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../testdata/service_account_key.pub.pem");

pub fn service_account_json(token_uri: &str) -> String {
    json!({
        "type": "service_account",
        "project_id": "test-project",
        "private_key_id": "test-key-id",
        "private_key": TEST_PRIVATE_KEY,
        "client_email": "reader@project.iam.gserviceaccount.com",
        "token_uri": token_uri
    })
    .to_string()
}

/// Writes a service-account key file pointing at `token_uri`. Keep the returned dir alive.
pub fn write_service_account(token_uri: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("service-account.json");
    std::fs::write(&path, service_account_json(token_uri)).expect("write key file");
    (dir, path)
}
