//! Run and suite configuration

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::adapter::Runner;
use crate::error::CaseResult;
use crate::registrar::Registrar;

pub const ENV_GREP: &str = "CASEBOOK_GREP";
pub const ENV_BAIL: &str = "CASEBOOK_BAIL";
pub const ENV_OUTPUT_DIR: &str = "CASEBOOK_OUTPUT_DIR";

/// Run-level options for [`crate::run_cases`].
///
/// Case-level flags override these.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Where tests are registered; the process default when unset.
    pub registrar: Option<Arc<dyn Registrar>>,

    /// Prepended to every title.
    pub prefix: Option<String>,

    pub async_mode: bool,

    pub errback: bool,

    /// Used by cases without their own runner, ahead of the positional one.
    pub runner: Option<Runner>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrar(mut self, registrar: Arc<dyn Registrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn async_mode(mut self, async_mode: bool) -> Self {
        self.async_mode = async_mode;
        self
    }

    pub fn errback(mut self, errback: bool) -> Self {
        self.errback = errback;
        self
    }

    pub fn runner(mut self, runner: Runner) -> Self {
        self.runner = Some(runner);
        self
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("registrar", &self.registrar.as_ref().map(|_| ".."))
            .field("prefix", &self.prefix)
            .field("async_mode", &self.async_mode)
            .field("errback", &self.errback)
            .field("runner", &self.runner)
            .finish()
    }
}

/// How a [`crate::Suite`] runs its registered tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Only titles matching this regex run; the rest are skipped.
    pub grep: Option<String>,

    /// Skip everything after the first failure.
    pub bail: bool,

    /// Where [`crate::SuiteReport::write_json`] puts results.
    pub output_dir: Option<PathBuf>,
}

impl SuiteConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> CaseResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `CASEBOOK_*` environment overrides.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(grep) = var(ENV_GREP).filter(|g| !g.is_empty()) {
            self.grep = Some(grep);
        }
        if let Some(bail) = var(ENV_BAIL) {
            match bail.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.bail = true,
                "0" | "false" | "no" | "" => self.bail = false,
                other => warn!("Ignoring {}={:?}: expected a boolean", ENV_BAIL, other),
            }
        }
        if let Some(dir) = var(ENV_OUTPUT_DIR).filter(|d| !d.is_empty()) {
            self.output_dir = Some(PathBuf::from(dir));
        }
        self
    }
}
