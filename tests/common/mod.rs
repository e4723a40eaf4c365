//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Path of a fixture under `tests/documents/`.
#[allow(dead_code)]
pub fn document_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("documents")
        .join(name)
}

#[allow(dead_code)]
pub fn load_document(name: &str) -> String {
    std::fs::read_to_string(document_path(name)).unwrap()
}
