//! End-to-end behaviour of `run_cases` driven through a `Suite`

mod common;

use casebook_engine::{
    run_cases, run_cases_with, Case, ErrorSpec, Pair, RaisedError, RunError, Runner, TestStatus,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn statuses(report: &casebook_engine::SuiteReport) -> Vec<(String, TestStatus)> {
    report
        .results
        .iter()
        .map(|r| (r.title.clone(), r.status))
        .collect()
}

#[tokio::test]
async fn single_value_and_exception() {
    let (suite, options) = common::suite();
    let cases = vec![
        Case::new("should handle single expected value")
            .value(7)
            .expected(14)
            .runner(Runner::sync(|value, _| Ok(json!(value.as_i64().unwrap_or(0) * 2)))),
        Case::new("should handle exception")
            .value("oops!")
            .error(ErrorSpec::kind("Error"))
            .runner(Runner::sync(|value, _| {
                if value == "oops!" {
                    return Err(RunError::raised("Error", "oops!"));
                }
                Ok(Value::Null)
            })),
    ];
    run_cases_with(cases, options);

    let report = suite.run().await;
    assert_eq!((report.total, report.passed), (2, 2));
}

#[tokio::test]
async fn values_with_scalar_expected() {
    let (suite, options) = common::suite();
    let remainder = Runner::sync(|value, _| Ok(json!(value.as_i64().unwrap_or(1) % 2)));
    let titles = run_cases(
        Case::new("{value} is even").values([2, 4, 6, 8, 10]).expected(0),
        remainder,
        options,
    );
    assert_eq!(titles.len(), 5);

    let report = suite.run().await;
    assert_eq!(report.passed, 5);
}

#[tokio::test]
async fn values_with_aligned_expected() {
    let (suite, options) = common::suite();
    let inputs = json!([3, 0, false, null, [], {}, ""]);
    let case = Case {
        values: inputs.as_array().cloned(),
        expected: Some(inputs.clone()),
        ..Case::new("echoes {value}")
    };
    run_cases(case, Runner::identity(), options);

    let report = suite.run().await;
    assert_eq!((report.total, report.passed), (7, 7));
    assert_eq!(
        report.titles(),
        vec![
            "echoes 3",
            "echoes 0",
            "echoes false",
            "echoes null",
            "echoes []",
            "echoes {}",
            "echoes ",
        ]
    );
}

#[tokio::test]
async fn aligned_expected_mismatch_fails_only_that_instance() {
    let (suite, options) = common::suite();
    run_cases(
        Case::new("#{index}").values([1, 2, 3]).expected(json!([1, 20, 3])),
        Runner::identity(),
        options,
    );

    let report = suite.run().await;
    assert_eq!(
        statuses(&report),
        vec![
            ("#0".to_string(), TestStatus::Passed),
            ("#1".to_string(), TestStatus::Failed),
            ("#2".to_string(), TestStatus::Passed),
        ]
    );
    assert_eq!(report.result("#1").unwrap().error.as_deref(), Some("expected 20, got 2"));
}

#[tokio::test]
async fn pair_list() {
    let (suite, options) = common::suite();
    let upper = Runner::sync(|value, _| {
        Ok(json!(value.as_str().unwrap_or_default().to_uppercase()))
    });
    run_cases(
        Case::new("{value} -> {expected}").pairs([
            Pair::new("a", "A"),
            Pair::new("bc", "BC"),
            Pair::Record {
                value: Some(json!("d")),
                expected: Some(json!("D")),
            },
        ]),
        upper,
        options,
    );

    let report = suite.run().await;
    assert_eq!(report.titles(), vec!["a -> A", "bc -> BC", "d -> D"]);
    assert!(report.is_success());
}

#[tokio::test]
async fn skip_and_only_selection() {
    let (suite, options) = common::suite();
    run_cases_with(
        vec![Case::new("skipped").skip(), Case::new("kept"), Case::new("also kept")],
        options.clone(),
    );
    assert_eq!(suite.titles(), vec!["kept", "also kept"]);
    suite.run().await;

    run_cases_with(vec![Case::new("one").skip(), Case::new("two").skip()], options.clone());
    assert_eq!(suite.titles(), vec!["one", "two"]);
    suite.run().await;

    run_cases_with(
        vec![Case::new("only").only(), Case::new("not only"), Case::new("plain")],
        options,
    );
    assert_eq!(suite.titles(), vec!["only"]);
}

#[tokio::test]
async fn error_kind_versus_literal() {
    let (suite, options) = common::suite();
    let throws = |error: RunError| Runner::sync(move |_, _| Err(error.clone()));
    let range = RaisedError::new("RangeError", "too big").extends("Error");

    run_cases_with(
        vec![
            Case::new("kind matches subkind")
                .error(ErrorSpec::kind("RangeError"))
                .runner(throws(range.clone().into())),
            Case::new("kind rejects base error")
                .error(ErrorSpec::kind("RangeError"))
                .runner(throws(RunError::raised("Error", "plain"))),
            Case::new("literal matches equal value")
                .error(ErrorSpec::literal("boom"))
                .runner(throws(RunError::value("boom"))),
            Case::new("literal rejects other value")
                .error(ErrorSpec::literal("boom"))
                .runner(throws(RunError::value("bang"))),
            Case::new("missing error fails")
                .value(1)
                .error(ErrorSpec::kind("Error")),
        ],
        options,
    );

    let report = suite.run().await;
    assert_eq!(
        statuses(&report),
        vec![
            ("kind matches subkind".to_string(), TestStatus::Passed),
            ("kind rejects base error".to_string(), TestStatus::Failed),
            ("literal matches equal value".to_string(), TestStatus::Passed),
            ("literal rejects other value".to_string(), TestStatus::Failed),
            ("missing error fails".to_string(), TestStatus::Failed),
        ]
    );
}

#[tokio::test]
async fn unexpected_error_is_reported() {
    let (suite, options) = common::suite();
    run_cases(
        Case::new("blows up").value(1).expected(1),
        Runner::sync(|_, _| Err(RunError::raised("TypeError", "undefined is not a function"))),
        options,
    );

    let report = suite.run().await;
    let error = report.result("blows up").unwrap().error.clone().unwrap();
    assert!(error.contains("undefined is not a function"), "{}", error);
}

#[tokio::test]
async fn futures_and_rejections() {
    let (suite, options) = common::suite();
    let cases = vec![
        Case::new("should eventually capture fulfilled result")
            .value("the fulfilled value")
            .expected("the fulfilled value")
            .runner(Runner::future(|value, _| async move {
                tokio::task::yield_now().await;
                Ok::<_, RunError>(value)
            })),
        Case::new("should eventually capture rejected result")
            .value("rejected")
            .error(ErrorSpec::kind("Error"))
            .runner(Runner::future(|_, _| async move {
                Err::<Value, _>(RunError::raised("Error", "rejected"))
            })),
        Case::new("should capture a panic as a rejection")
            .error(ErrorSpec::kind("panic"))
            .runner(Runner::future(|_, _| explode())),
    ];
    run_cases_with(cases, options.async_mode(true));

    let report = suite.run().await;
    assert!(report.is_success(), "{:#?}", report.results);
}

async fn explode() -> Result<Value, RunError> {
    tokio::task::yield_now().await;
    panic!("thrown inside the future")
}

#[tokio::test]
async fn rejection_and_sync_error_get_the_same_verdict() {
    let (suite, options) = common::suite();
    let error = RunError::raised("Error", "E");
    let expected = ErrorSpec::Instance(RaisedError::new("Error", "E"));

    let rejects = {
        let error = error.clone();
        Runner::future(move |_, _| {
            let error = error.clone();
            async move { Err::<Value, _>(error) }
        })
    };
    let throws = Runner::sync(move |_, _| Err(error.clone()));

    run_cases_with(
        vec![
            Case::new("rejects").error(expected.clone()).runner(rejects.clone()).async_mode(true),
            Case::new("throws").error(expected).runner(throws.clone()),
            Case::new("rejects, expecting a value").expected(1).runner(rejects).async_mode(true),
            Case::new("throws, expecting a value").expected(1).runner(throws),
        ],
        options,
    );

    let report = suite.run().await;
    let by_title = |t: &str| report.result(t).unwrap().clone();
    assert_eq!(by_title("rejects").status, TestStatus::Passed);
    assert_eq!(by_title("throws").status, TestStatus::Passed);
    assert_eq!(
        by_title("rejects, expecting a value").error,
        by_title("throws, expecting a value").error
    );
}

#[tokio::test]
async fn errback_runners() {
    let (suite, options) = common::suite();
    let cases = vec![
        Case::new("should handle successful result")
            .value("the value")
            .expected("the value")
            .runner(Runner::errback(|value, _, done| {
                tokio::spawn(async move { done.ok(value) });
            })),
        Case::new("should handle error result")
            .value("rejected")
            .error(ErrorSpec::literal("rejected"))
            .runner(Runner::errback(|value, _, done| {
                tokio::spawn(async move { done.fail(RunError::Value(value)) });
            })),
        Case::new("done(null, 42)")
            .expected(42)
            .runner(Runner::errback(|_, _, done| done.ok(42))),
    ];
    run_cases_with(cases, options.errback(true));

    let report = suite.run().await;
    assert!(report.is_success(), "{:#?}", report.results);
}

#[tokio::test]
async fn panic_in_errback_mode_fails_the_test() {
    let (suite, options) = common::suite();
    run_cases(
        Case::new("throws synchronously").expected(1),
        Runner::sync(|_, _| panic!("not a normal failure path")),
        options.errback(true),
    );

    let report = suite.run().await;
    let result = report.result("throws synchronously").unwrap();
    assert_eq!(result.status, TestStatus::Failed);
    assert!(result.error.as_deref().unwrap().contains("panicked"));
}

#[tokio::test]
async fn title_only_case_passes() {
    let (suite, options) = common::suite();
    let titles = run_cases_with(
        vec![
            Case::new("should resolve top level value: {value}").value(520).expected(Value::Null),
            Case::new("got {value.nested}").value(json!({"nested": 7})),
            Case::new("got {value.missing}").value(json!({})),
            Case::new("no shape at all: {value}"),
        ],
        options.runner(Runner::sync(|_, _| Ok(Value::Null))),
    );
    assert_eq!(
        titles,
        vec![
            "should resolve top level value: 520",
            "got 7",
            "got {value.missing}",
            "no shape at all: {value}",
        ]
    );

    let report = suite.run().await;
    assert!(report.is_success());
}

#[tokio::test]
async fn rerunning_is_idempotent() {
    let (suite, options) = common::suite();
    let cases = vec![
        Case::new("{value} squared").values([1, 2, 3]).expected(json!([1, 4, 10])),
    ];
    let square = Runner::sync(|v, _| Ok(json!(v.as_i64().unwrap_or(0).pow(2))));

    run_cases(cases.clone(), square.clone(), options.clone());
    let first = statuses(&suite.run().await);
    run_cases(cases, square, options);
    let second = statuses(&suite.run().await);

    assert_eq!(first, second);
    assert_eq!(first[2].1, TestStatus::Failed);
}
