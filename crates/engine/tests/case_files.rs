//! Case files loaded from disk, paired with runners by file stem

mod common;

use casebook_engine::{run_cases, CaseError, CaseFile, RunError, Runner, TestStatus};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn runner_for(stem: &str) -> Runner {
    match stem {
        "math" => Runner::sync(|value, _| match value.as_i64() {
            Some(n) if n < 0 => Err(casebook_engine::RaisedError::new("RangeError", "negative")
                .extends("Error")
                .into()),
            Some(n) => Ok(json!(n * 2)),
            None => Err(RunError::raised("TypeError", "not a number")),
        }),
        "strings" => Runner::sync(|value, _| match value {
            Value::String(s) => Ok(json!(s.to_uppercase())),
            _ => Err(RunError::value("no string")),
        }),
        "interpolate" => Runner::future(|value, options| async move {
            let age = value["user"]["age"].as_i64().unwrap_or(0);
            let threshold = options["threshold"].as_i64().unwrap_or(0);
            Ok::<_, RunError>(json!(if age >= threshold { "adult" } else { "minor" }))
        }),
        other => panic!("no runner for {}", other),
    }
}

#[test]
fn test_load_all_in_path_order() {
    let files = CaseFile::load_all(&common::fixtures_dir()).unwrap();
    let stems: Vec<String> = files.iter().map(CaseFile::file_stem).collect();
    assert_eq!(stems, vec!["interpolate", "math", "strings"]);

    let counts: Vec<usize> = files.iter().map(|f| f.cases.len()).collect();
    assert_eq!(counts, vec![1, 4, 3]);
}

#[test]
fn test_missing_directory_is_an_error() {
    let err = CaseFile::load_all(&common::fixtures_dir().join("missing")).unwrap_err();
    assert!(matches!(err, CaseError::Walk(_)));
}

#[test]
fn test_malformed_file_names_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "- name: [unterminated").unwrap();

    match CaseFile::from_file(&path).unwrap_err() {
        CaseError::CaseFile { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_run_fixture_files() {
    let (suite, options) = common::suite();

    for file in CaseFile::load_all(&common::fixtures_dir()).unwrap() {
        let prefix = format!("{}: ", file.file_stem());
        run_cases(
            file.cases.clone(),
            runner_for(&file.file_stem()),
            options.clone().prefix(prefix).async_mode(file.file_stem() == "interpolate"),
        );
    }

    let report = suite.run().await;
    assert!(report.is_success(), "{:#?}", report.results);
    assert_eq!(
        report.titles(),
        vec![
            "interpolate: user ada is adult",
            "interpolate: user grace is adult",
            "math: doubles 7",
            "math: doubles 0 to 0",
            "math: doubles 1 to 2",
            "math: doubles 2 to 4",
            "math: doubles 3 to 6",
            "math: rejects -1",
            "math: rejects non-numbers",
            "strings: abc -> ABC",
            "strings: mixed Case -> MIXED CASE",
            "strings: empty stays empty",
            "strings: refuses null",
        ]
    );
}

#[tokio::test]
async fn test_runner_mismatch_fails() {
    let (suite, options) = common::suite();
    let math = CaseFile::load_all(&common::fixtures_dir())
        .unwrap()
        .into_iter()
        .find(|f| f.file_stem() == "math")
        .unwrap();

    run_cases(math.cases, Runner::identity(), options);

    let report = suite.run().await;
    let passed: Vec<&str> = report
        .results
        .iter()
        .filter(|r| r.status == TestStatus::Passed)
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(passed, vec!["doubles 0 to 0"]);
}
