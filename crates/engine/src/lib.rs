//! Casebook engine
//!
//! Table-driven tests from declarative case records:
//! - Expands each case into concrete instances (single value, value list,
//!   value/expected pairs)
//! - Resolves titles from `{dotted.path}` templates
//! - Runs the function under test whether it returns, hands back a future or
//!   stream, or completes through a callback
//! - Compares outcomes against expected values or expected errors
//! - Registers one test per instance with a pluggable registrar
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  run_cases(cases, runner, options)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  select(cases)            only > not skipped > everything   │
//! │    └── expand(case)       Pairs | Multi | Single            │
//! │          ├── resolve_title(name, instance)                  │
//! │          └── registrar.register(title, TestBody)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestBody (run by the registrar)                            │
//! │    ├── execute(runner, value, options, mode) -> Completion  │
//! │    │     ├── Returned::Ready | Pending | Stream             │
//! │    │     └── Done (callback convention)                     │
//! │    └── compare(completion, expectation) -> Verdict          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use casebook_engine::{run_cases, Case, RunOptions, Runner, Suite};
//! use serde_json::json;
//!
//! # async fn demo() {
//! let suite = Arc::new(Suite::new());
//! let double = Runner::sync(|value, _| Ok(json!(value.as_i64().unwrap_or(0) * 2)));
//!
//! run_cases(
//!     vec![
//!         Case::new("doubles {value}").value(7).expected(14),
//!         Case::new("doubles each of {value}").values([1, 2, 3]).expected(json!([2, 4, 6])),
//!     ],
//!     double,
//!     RunOptions::new().registrar(suite.clone()).prefix("math: "),
//! );
//!
//! let report = suite.run().await;
//! assert!(report.is_success());
//! # }
//! ```

pub mod adapter;
pub mod case;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod expand;
pub mod registrar;
pub mod select;
pub mod suite;
pub mod template;

pub use adapter::{Completion, Done, Mode, RaisedError, Returned, RunError, Runner};
pub use case::{Case, CaseFile, CaseList, Pair, Title};
pub use compare::{AssertionFailure, ErrorSpec, Expectation, Verdict};
pub use config::{RunOptions, SuiteConfig};
pub use engine::{run_cases, run_cases_with};
pub use error::{CaseError, CaseResult};
pub use registrar::{default_registrar, set_default_registrar, Registrar, TestBody};
pub use suite::{Suite, SuiteReport, TestResult, TestStatus};
