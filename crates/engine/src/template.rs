//! Title templates
//!
//! `{dotted.path}` reads a field of the instance context; `{{` and `}}` are
//! literal braces. A placeholder whose path does not resolve is left in the
//! title as written.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::case::Title;
use crate::expand::Instance;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]+)\}").expect("placeholder pattern is valid"));

pub fn resolve_title(title: &Title, instance: &Instance) -> String {
    match title {
        Title::Computed(f) => f(
            instance.value.as_ref(),
            instance.expected.as_ref(),
            &instance.runner_options(),
        ),
        Title::Template(template) => interpolate(template, &instance.context()),
    }
}

pub fn interpolate(template: &str, context: &Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match caps.get(1) {
            Some(path) => lookup(context, path.as_str())
                .map(render)
                .unwrap_or_else(|| caps[0].to_string()),
            None => caps[0][..1].to_string(),
        })
        .into_owned()
}

/// Walk `path` through objects (by key) and arrays (by index).
pub fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Strings render bare; everything else as compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
