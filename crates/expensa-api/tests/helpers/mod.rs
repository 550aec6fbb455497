//! Test helpers: build the router around an inline or in-memory object store.
//!
//! Run from workspace root: `cargo test -p expensa-api --test upload_test`.

pub mod fixtures;

use axum_test::TestServer;
use expensa_api::setup::{self, routes};
use expensa_core::{Config, TokenCodec};
use expensa_storage::{InlineStorage, ObjectStoreStorage, Storage};
use object_store::memory::InMemory;
use std::collections::HashMap;
use std::sync::Arc;

pub const TEST_BUCKET_URL: &str = "https://bills.s3.us-east-1.amazonaws.com";

pub fn test_config(vars: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

fn server_with(config: Config, storage: Arc<dyn Storage>) -> TestServer {
    let state = setup::build_state(config.clone(), Arc::new(TokenCodec::new()), storage);
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    TestServer::new(app.into_make_service()).expect("Failed to create test server")
}

/// No object store configured: uploads come back as data URIs.
pub fn inline_server() -> TestServer {
    server_with(test_config(&[]), Arc::new(InlineStorage::new()))
}

/// Inline backend with a production config: error bodies carry no details.
pub fn production_server() -> TestServer {
    let config = test_config(&[
        ("ENVIRONMENT", "production"),
        ("CORS_ORIGINS", "https://app.example"),
    ]);
    server_with(config, Arc::new(InlineStorage::new()))
}

/// Object store backend over an in-memory store; the store is returned so tests
/// can read back what was written.
pub fn external_server() -> (TestServer, Arc<InMemory>) {
    let memory = Arc::new(InMemory::new());
    let storage = ObjectStoreStorage::new(memory.clone(), "bills", TEST_BUCKET_URL);
    let config = test_config(&[("S3_BUCKET", "bills"), ("S3_REGION", "us-east-1")]);
    (server_with(config, Arc::new(storage)), memory)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
