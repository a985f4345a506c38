//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use casebook_engine::{RunOptions, Suite};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn suite() -> (Arc<Suite>, RunOptions) {
    init_tracing();
    let suite = Arc::new(Suite::new());
    let options = RunOptions::new().registrar(suite.clone());
    (suite, options)
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}
