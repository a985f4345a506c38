//! Outcome comparison
//!
//! Decides whether a [`Completion`] satisfies what an instance expects.
//! Values compare structurally (`serde_json::Value` equality): identity never
//! matters, and `null` differs from an absent field.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::adapter::{Completion, RaisedError, RunError};

/// What error an instance expects its runner to fail with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSpec {
    /// Any raised error of this kind, directly or through a parent.
    Kind(String),
    /// A plain error value, compared structurally.
    Literal(Value),
    /// A raised error, compared structurally.
    Instance(RaisedError),
}

impl ErrorSpec {
    pub fn kind(tag: impl Into<String>) -> Self {
        ErrorSpec::Kind(tag.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        ErrorSpec::Literal(value.into())
    }

    pub fn matches(&self, actual: &RunError) -> bool {
        match (self, actual) {
            (ErrorSpec::Kind(tag), RunError::Raised(e)) => e.is_a(tag),
            (ErrorSpec::Literal(expected), RunError::Value(v)) => expected == v,
            (ErrorSpec::Instance(expected), RunError::Raised(e)) => expected == e,
            _ => false,
        }
    }

    /// The form used when a title template reads `{error}`.
    pub fn to_context_value(&self) -> Value {
        match self {
            ErrorSpec::Kind(tag) => Value::String(tag.clone()),
            ErrorSpec::Literal(value) => value.clone(),
            ErrorSpec::Instance(e) => serde_json::to_value(e).unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for ErrorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSpec::Kind(tag) => write!(f, "an error of kind `{}`", tag),
            ErrorSpec::Literal(value) => write!(f, "`{}`", value),
            ErrorSpec::Instance(e) => write!(f, "`{}`", e),
        }
    }
}

/// `{kind: T}`, `{literal: v}` and `{instance: {...}}` select a variant; any
/// other value is shorthand for a literal.
impl<'de> Deserialize<'de> for ErrorSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "snake_case")]
        enum Tagged {
            Kind(String),
            Literal(Value),
            Instance(RaisedError),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Tagged(Tagged),
            Bare(Value),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Tagged(Tagged::Kind(tag)) => ErrorSpec::Kind(tag),
            Repr::Tagged(Tagged::Literal(value)) => ErrorSpec::Literal(value),
            Repr::Tagged(Tagged::Instance(e)) => ErrorSpec::Instance(e),
            Repr::Bare(value) => ErrorSpec::Literal(value),
        })
    }
}

/// What one instance asserts about its completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Any value passes; an error still fails.
    Unchecked,
    Value(Value),
    Error(ErrorSpec),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssertionFailure {
    #[error("expected {}, got {}", pretty(.expected), pretty(.actual))]
    ValueMismatch { expected: Value, actual: Value },

    #[error("runner failed unexpectedly: {0}")]
    UnexpectedError(RunError),

    #[error("expected runner to fail with {expected}, it did not (returned {})", pretty(.actual))]
    MissingError { expected: ErrorSpec, actual: Value },

    #[error("expected runner to fail with {expected}, it failed with {actual}")]
    ErrorMismatch { expected: ErrorSpec, actual: RunError },
}

/// Result of one test body.
pub type Verdict = Result<(), AssertionFailure>;

pub fn compare(completion: Completion, expectation: &Expectation) -> Verdict {
    match (expectation, completion) {
        (Expectation::Error(spec), Err(actual)) if spec.matches(&actual) => Ok(()),
        (Expectation::Error(spec), Err(actual)) => Err(AssertionFailure::ErrorMismatch {
            expected: spec.clone(),
            actual,
        }),
        (Expectation::Error(spec), Ok(actual)) => Err(AssertionFailure::MissingError {
            expected: spec.clone(),
            actual,
        }),
        (Expectation::Value(expected), Ok(actual)) if actual == *expected => Ok(()),
        (Expectation::Value(expected), Ok(actual)) => Err(AssertionFailure::ValueMismatch {
            expected: expected.clone(),
            actual,
        }),
        (Expectation::Unchecked, Ok(_)) => Ok(()),
        (_, Err(e)) => Err(AssertionFailure::UnexpectedError(e)),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
