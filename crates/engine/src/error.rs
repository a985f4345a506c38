//! Error types for the case engine
//!
//! [`CaseError`] covers faults of the engine itself (unreadable case files,
//! bad configuration). Test verdicts are not errors of the engine and live in
//! [`crate::compare::AssertionFailure`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseError {
    #[error("Unsupported case file: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("Case file {}: {reason}", path.display())]
    CaseFile { path: PathBuf, reason: String },

    #[error("Invalid grep pattern: {0}")]
    Grep(#[from] regex::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type CaseResult<T> = Result<T, CaseError>;
