//! Declarative case records and case files

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::adapter::Runner;
use crate::compare::ErrorSpec;
use crate::error::{CaseError, CaseResult};

type TitleFn = dyn Fn(Option<&Value>, Option<&Value>, &Value) -> String + Send + Sync;

/// How a test title is produced.
#[derive(Clone)]
pub enum Title {
    /// A string with `{dotted.path}` placeholders.
    Template(String),
    /// Called with `(value, expected, options)`; the result is used verbatim.
    /// `value` and `expected` are `None` when the instance does not set them.
    Computed(Arc<TitleFn>),
}

impl Title {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, Option<&Value>, &Value) -> String + Send + Sync + 'static,
    {
        Title::Computed(Arc::new(f))
    }
}

impl Default for Title {
    fn default() -> Self {
        Title::Template(String::new())
    }
}

impl fmt::Debug for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Title::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Title::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for Title {
    fn from(template: &str) -> Self {
        Title::Template(template.to_string())
    }
}

impl From<String> for Title {
    fn from(template: String) -> Self {
        Title::Template(template)
    }
}

impl<'de> Deserialize<'de> for Title {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Title::Template)
    }
}

/// One value/expected pair of a pair-list case.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Pair {
    /// `[value, expected]`
    Tuple(Value, Value),
    /// `{value, expected}`; either side may be absent.
    Record {
        #[serde(default, deserialize_with = "present")]
        value: Option<Value>,
        #[serde(default, deserialize_with = "present")]
        expected: Option<Value>,
    },
}

impl Pair {
    pub fn new(value: impl Into<Value>, expected: impl Into<Value>) -> Self {
        Pair::Tuple(value.into(), expected.into())
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Pair::Tuple(value, _) => Some(value),
            Pair::Record { value, .. } => value.as_ref(),
        }
    }

    pub fn expected(&self) -> Option<&Value> {
        match self {
            Pair::Tuple(_, expected) => Some(expected),
            Pair::Record { expected, .. } => expected.as_ref(),
        }
    }
}

/// Which input field drives a case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    Pairs(&'a [Pair]),
    Multi(&'a [Value]),
    Single,
}

/// A declarative description of one or more test instances.
///
/// Fields that may be absent are `Option`s: absence and `null` are different
/// things, so `expected: null` asserts a null result while a missing
/// `expected` asserts nothing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Case {
    #[serde(default)]
    pub name: Title,

    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,

    #[serde(default)]
    pub values: Option<Vec<Value>>,

    #[serde(default)]
    pub cases: Option<Vec<Pair>>,

    /// A single value, or with `values` either a scalar for every instance or
    /// an array aligned by index.
    #[serde(default, deserialize_with = "present")]
    pub expected: Option<Value>,

    #[serde(default)]
    pub error: Option<ErrorSpec>,

    /// Overrides the run-level runner.
    #[serde(skip)]
    pub runner: Option<Runner>,

    /// Passed through to the runner untouched.
    #[serde(default, deserialize_with = "present")]
    pub options: Option<Value>,

    #[serde(default, rename = "async")]
    pub async_mode: Option<bool>,

    #[serde(default)]
    pub errback: Option<bool>,

    #[serde(default)]
    pub only: bool,

    #[serde(default)]
    pub skip: bool,

    #[serde(default)]
    pub prefix: Option<String>,
}

impl Case {
    pub fn new(name: impl Into<Title>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn pairs<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = Pair>,
    {
        self.cases = Some(pairs.into_iter().collect());
        self
    }

    pub fn expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn error(mut self, error: ErrorSpec) -> Self {
        self.error = Some(error);
        self
    }

    pub fn runner(mut self, runner: Runner) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn options(mut self, options: impl Into<Value>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn async_mode(mut self, async_mode: bool) -> Self {
        self.async_mode = Some(async_mode);
        self
    }

    pub fn errback(mut self, errback: bool) -> Self {
        self.errback = Some(errback);
        self
    }

    pub fn only(mut self) -> Self {
        self.only = true;
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Pair list wins over `values`, which wins over `value`.
    pub fn shape(&self) -> Shape<'_> {
        if let Some(pairs) = &self.cases {
            Shape::Pairs(pairs)
        } else if let Some(values) = &self.values {
            Shape::Multi(values)
        } else {
            Shape::Single
        }
    }
}

/// An ordered list of cases.
///
/// Case documents may hold either a list or a single bare case.
#[derive(Debug, Clone, Default)]
pub struct CaseList(Vec<Case>);

impl CaseList {
    pub fn from_yaml(yaml: &str) -> CaseResult<Self> {
        serde_yaml::from_str(yaml).map_err(CaseError::from)
    }

    pub fn from_json(json: &str) -> CaseResult<Self> {
        serde_json::from_str(json).map_err(CaseError::from)
    }

    /// Give every case without its own runner `runner`.
    pub fn with_runner(mut self, runner: Runner) -> Self {
        for case in self.0.iter_mut().filter(|c| c.runner.is_none()) {
            case.runner = Some(runner.clone());
        }
        self
    }

    pub fn into_inner(self) -> Vec<Case> {
        self.0
    }
}

impl<'de> Deserialize<'de> for CaseList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Many(Vec<Case>),
            One(Box<Case>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Many(cases) => CaseList(cases),
            Repr::One(case) => CaseList(vec![*case]),
        })
    }
}

impl Deref for CaseList {
    type Target = [Case];

    fn deref(&self) -> &[Case] {
        &self.0
    }
}

impl From<Case> for CaseList {
    fn from(case: Case) -> Self {
        CaseList(vec![case])
    }
}

impl From<Vec<Case>> for CaseList {
    fn from(cases: Vec<Case>) -> Self {
        CaseList(cases)
    }
}

impl<const N: usize> From<[Case; N]> for CaseList {
    fn from(cases: [Case; N]) -> Self {
        CaseList(cases.into())
    }
}

impl FromIterator<Case> for CaseList {
    fn from_iter<I: IntoIterator<Item = Case>>(iter: I) -> Self {
        CaseList(iter.into_iter().collect())
    }
}

impl IntoIterator for CaseList {
    type Item = Case;
    type IntoIter = std::vec::IntoIter<Case>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Cases loaded from one YAML or JSON document.
#[derive(Debug, Clone)]
pub struct CaseFile {
    pub path: PathBuf,
    pub cases: CaseList,
}

impl CaseFile {
    pub fn from_file(path: &Path) -> CaseResult<Self> {
        let parse: fn(&str) -> CaseResult<CaseList> = match extension(path) {
            Some("yaml" | "yml") => CaseList::from_yaml,
            Some("json") => CaseList::from_json,
            _ => return Err(CaseError::UnsupportedFile(path.to_path_buf())),
        };
        let content = std::fs::read_to_string(path)?;
        let cases = parse(&content).map_err(|e| CaseError::CaseFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!("Loaded {} case(s) from {}", cases.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            cases,
        })
    }

    /// Load every case file under `dir`, in path order.
    pub fn load_all(dir: &Path) -> CaseResult<Vec<Self>> {
        let mut files = Vec::new();

        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file()
                && matches!(extension(entry.path()), Some("yaml" | "yml" | "json"))
            {
                files.push(Self::from_file(entry.path())?);
            }
        }

        Ok(files)
    }

    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Deserialize a field so that an explicit `null` is `Some(Null)`; pair with
/// `#[serde(default)]` so a missing field stays `None`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}
