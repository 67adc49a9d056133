//! Lossy coercion helpers for untrusted classifier output.
//!
//! Every helper takes a loosely-typed `serde_json::Value` and returns
//! `Option<T>`: `Some` when the value could be read (possibly via a string
//! form), `None` when the caller should fall back to the field default and
//! record the coercion. The helpers never panic and never guess beyond the
//! documented token sets.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-/\\.,:;]+").unwrap());
static DUPLICATE_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());
static TOPIC_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\n]").unwrap());

/// Normalize an enum token: lowercase, separators to underscores, collapse
/// repeats, trim.
///
/// `"Logical Argument"` -> `"logical_argument"`, `"N/A"` -> `"n_a"`.
pub fn normalize_token(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let replaced = SEPARATORS.replace_all(&lowered, "_");
    let collapsed = DUPLICATE_UNDERSCORE.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}

/// Read a float from a number or numeric string.
///
/// Booleans are explicitly rejected: `true`/`false` must never silently
/// become 1.0/0.0 for score or novelty.
pub fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(_) => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Read a bool from a bool, a recognized token, or 0/1.
pub fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a topic list from an array of non-empty strings, or a single string
/// split on commas/newlines with trimming.
pub fn to_topics(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => {
            let mut topics = Vec::new();
            for item in items {
                match item {
                    Value::String(s) if !s.trim().is_empty() => {
                        topics.push(s.trim().to_string());
                    }
                    Value::String(_) => {}
                    _ => return None,
                }
            }
            Some(topics)
        }
        Value::String(s) => Some(
            TOPIC_SPLIT
                .split(s)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

/// Clamp a unit-interval field into [0, 1].
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
