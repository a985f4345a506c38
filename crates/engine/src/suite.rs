//! A collecting registrar that runs its tests and reports the results

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tracing::{debug, error, info};

use crate::adapter::panic_message;
use crate::config::SuiteConfig;
use crate::error::CaseResult;
use crate::registrar::{Registrar, TestBody};

pub const RESULTS_FILE: &str = "case-results.json";

static GLOBAL: Lazy<Arc<Suite>> = Lazy::new(|| Arc::new(Suite::new()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub title: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl TestResult {
    fn skipped(title: String) -> Self {
        Self {
            title,
            status: TestStatus::Skipped,
            duration_ms: 0,
            error: None,
        }
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl SuiteReport {
    fn from_results(results: Vec<TestResult>, duration_ms: u64) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            passed: count(TestStatus::Passed),
            failed: count(TestStatus::Failed),
            skipped: count(TestStatus::Skipped),
            duration_ms,
            results,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn titles(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.title.as_str()).collect()
    }

    pub fn result(&self, title: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.title == title)
    }

    /// Write the report as JSON into `dir`.
    pub fn write_json(&self, dir: &Path) -> CaseResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join(RESULTS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Collects registered tests; [`Suite::run`] executes them in registration
/// order, one at a time.
pub struct Suite {
    config: SuiteConfig,
    grep: Option<Regex>,
    pending: Mutex<Vec<(String, TestBody)>>,
}

impl Suite {
    pub fn new() -> Self {
        Self {
            config: SuiteConfig::default(),
            grep: None,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn with_config(config: SuiteConfig) -> CaseResult<Self> {
        let grep = config.grep.as_deref().map(Regex::new).transpose()?;
        Ok(Self {
            config,
            grep,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// The suite behind the process-wide default registrar.
    pub fn global() -> Arc<Suite> {
        GLOBAL.clone()
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Titles waiting to run.
    pub fn titles(&self) -> Vec<String> {
        self.pending.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Run and drain everything registered so far.
    pub async fn run(&self) -> SuiteReport {
        let start = Instant::now();
        let pending = std::mem::take(&mut *self.pending.lock());
        let mut results = Vec::with_capacity(pending.len());
        let mut bailed = false;

        info!("Running {} test(s)...", pending.len());

        for (title, body) in pending {
            if bailed || !self.selected(&title) {
                debug!("Skipping: {}", title);
                results.push(TestResult::skipped(title));
                continue;
            }

            let result = run_body(title, body).await;
            match result.status {
                TestStatus::Passed => info!("✓ {} ({} ms)", result.title, result.duration_ms),
                _ => error!(
                    "✗ {} - {}",
                    result.title,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
            }
            if result.status == TestStatus::Failed && self.config.bail {
                bailed = true;
            }
            results.push(result);
        }

        let report = SuiteReport::from_results(results, start.elapsed().as_millis() as u64);

        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            report.passed, report.failed, report.skipped, report.duration_ms
        );

        if let Some(dir) = &self.config.output_dir {
            if let Err(e) = report.write_json(dir) {
                error!("Failed to write results: {}", e);
            }
        }

        report
    }

    fn selected(&self, title: &str) -> bool {
        self.grep.as_ref().map_or(true, |re| re.is_match(title))
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl Registrar for Suite {
    fn register(&self, title: String, body: TestBody) {
        debug!(async_body = body.is_async(), "Registered: {}", title);
        self.pending.lock().push((title, body));
    }
}

/// Sync bodies run on the blocking pool, async bodies as their own task, so
/// a panicking body fails its test instead of the suite.
async fn run_body(title: String, body: TestBody) -> TestResult {
    let start = Instant::now();
    let joined = match body {
        TestBody::Sync(f) => tokio::task::spawn_blocking(f).await,
        TestBody::Async(future) => tokio::spawn(future).await,
    };

    let error = match joined {
        Ok(Ok(())) => None,
        Ok(Err(failure)) => Some(failure.to_string()),
        Err(e) => Some(join_failure(e)),
    };

    TestResult {
        title,
        status: if error.is_none() {
            TestStatus::Passed
        } else {
            TestStatus::Failed
        },
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    }
}

fn join_failure(e: JoinError) -> String {
    if e.is_panic() {
        format!("test body panicked: {}", panic_message(e.into_panic().as_ref()))
    } else {
        format!("test body did not complete: {}", e)
    }
}
