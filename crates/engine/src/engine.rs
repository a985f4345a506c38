//! Orchestration: select, expand, title and register

use futures::FutureExt;
use tracing::{debug, warn};

use crate::adapter::{execute, execute_blocking, Completion, Mode, Runner};
use crate::case::{Case, CaseList};
use crate::compare::{compare, Expectation, Verdict};
use crate::config::RunOptions;
use crate::expand::{expand, Instance};
use crate::registrar::{default_registrar, TestBody};
use crate::select::select;
use crate::template::resolve_title;

/// Register one test per instance of every selected case.
///
/// Returns the registered titles in registration order.
pub fn run_cases(cases: impl Into<CaseList>, runner: Runner, options: RunOptions) -> Vec<String> {
    register_all(&cases.into(), Some(runner), &options)
}

/// [`run_cases`] without a positional runner: cases fall back to
/// `options.runner`, then to [`Runner::identity`].
pub fn run_cases_with(cases: impl Into<CaseList>, options: RunOptions) -> Vec<String> {
    register_all(&cases.into(), None, &options)
}

fn register_all(cases: &CaseList, fallback: Option<Runner>, options: &RunOptions) -> Vec<String> {
    let registrar = options.registrar.clone().unwrap_or_else(default_registrar);
    let selected = select(cases);
    debug!("Selected {} of {} case(s)", selected.len(), cases.len());

    let mut titles = Vec::new();
    for case in selected {
        let runner = effective_runner(case, options, fallback.as_ref());
        let mode = Mode::resolve(
            case.async_mode.unwrap_or(options.async_mode),
            case.errback.unwrap_or(options.errback),
        );
        let prefix = case
            .prefix
            .as_deref()
            .or(options.prefix.as_deref())
            .unwrap_or("");

        for instance in expand(case) {
            let title = format!("{}{}", prefix, resolve_title(&case.name, &instance));
            debug!(?mode, "Registering: {}", title);
            registrar.register(title.clone(), test_body(runner.clone(), instance, mode));
            titles.push(title);
        }
    }

    titles
}

fn effective_runner(case: &Case, options: &RunOptions, fallback: Option<&Runner>) -> Runner {
    case.runner
        .as_ref()
        .or(options.runner.as_ref())
        .or(fallback)
        .cloned()
        .unwrap_or_else(Runner::identity)
}

fn test_body(runner: Runner, instance: Instance, mode: Mode) -> TestBody {
    let expectation = instance.expectation();
    let value = instance.input();
    let options = instance.runner_options();

    if mode.is_async() {
        TestBody::Async(
            async move { judge(execute(&runner, value, options, mode).await, &expectation) }
                .boxed(),
        )
    } else {
        TestBody::Sync(Box::new(move || {
            judge(execute_blocking(&runner, value, options, mode), &expectation)
        }))
    }
}

fn judge(completion: Completion, expectation: &Expectation) -> Verdict {
    if let Err(e) = &completion {
        if e.is_panic() && !matches!(expectation, Expectation::Error(_)) {
            warn!("Runner panicked: {}", e);
        }
    }
    compare(completion, expectation)
}
