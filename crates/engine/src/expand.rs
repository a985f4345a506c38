//! Case expansion: one [`Case`] into the concrete [`Instance`]s it describes

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::case::{Case, Shape, Title};
use crate::compare::{ErrorSpec, Expectation};

/// One concrete test derived from a case.
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: Title,
    pub value: Option<Value>,
    pub expected: Option<Value>,
    pub error: Option<ErrorSpec>,
    pub options: Option<Value>,
    /// Position within a `values` or pair-list case.
    pub index: Option<usize>,
}

impl Instance {
    /// An expected error takes precedence over an expected value.
    pub fn expectation(&self) -> Expectation {
        match (&self.error, &self.expected) {
            (Some(error), _) => Expectation::Error(error.clone()),
            (None, Some(expected)) => Expectation::Value(expected.clone()),
            (None, None) => Expectation::Unchecked,
        }
    }

    /// The value handed to the runner; an absent value is `null`.
    pub fn input(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }

    pub fn runner_options(&self) -> Value {
        self.options.clone().unwrap_or(Value::Null)
    }

    /// The object title templates resolve against. Absent fields are left
    /// out so that placeholders naming them stay unresolved. `name` is the
    /// raw template; a computed title has none.
    pub fn context(&self) -> Value {
        let mut map = Map::new();
        if let Title::Template(template) = &self.name {
            map.insert("name".to_string(), Value::String(template.clone()));
        }
        if let Some(value) = &self.value {
            map.insert("value".to_string(), value.clone());
        }
        if let Some(expected) = &self.expected {
            map.insert("expected".to_string(), expected.clone());
        }
        if let Some(error) = &self.error {
            map.insert("error".to_string(), error.to_context_value());
        }
        if let Some(options) = &self.options {
            map.insert("options".to_string(), options.clone());
        }
        if let Some(index) = self.index {
            map.insert("index".to_string(), Value::from(index));
        }
        Value::Object(map)
    }
}

pub fn expand(case: &Case) -> Vec<Instance> {
    let instance = |value: Option<&Value>, expected: Option<&Value>, index: Option<usize>| {
        Instance {
            name: case.name.clone(),
            value: value.cloned(),
            expected: expected.cloned(),
            error: case.error.clone(),
            options: case.options.clone(),
            index,
        }
    };

    let instances: Vec<Instance> = match case.shape() {
        Shape::Pairs(pairs) => pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| instance(pair.value(), pair.expected(), Some(i)))
            .collect(),
        Shape::Multi(values) => values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let expected = match &case.expected {
                    Some(Value::Array(aligned)) => {
                        let expected = aligned.get(i);
                        if expected.is_none() {
                            warn!(index = i, "no aligned expected value for this input");
                        }
                        expected
                    }
                    scalar => scalar.as_ref(),
                };
                instance(Some(value), expected, Some(i))
            })
            .collect(),
        Shape::Single => vec![instance(case.value.as_ref(), case.expected.as_ref(), None)],
    };

    debug!("Expanded case into {} instance(s)", instances.len());
    instances
}
