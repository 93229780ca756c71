use serde_json::Value;
use std::fmt::Debug;

/// Flexible comparison of a decoded response against a pattern document.
///
/// `Err` carries a human readable reason for the mismatch.
pub trait PatternMatcher: Debug {
    fn matches(&self, actual: &Value, pattern: &Value) -> Result<(), String>;
}

/// A small placeholder matcher.
///
/// Strings of the form `@type@` in the pattern match any value of that type:
/// `@string@`, `@integer@`, `@number@` (or `@double@`), `@boolean@`,
/// `@array@`, `@null@`, and `@*@` (or `@wildcard@`) for anything. A trailing
/// `@...@` element in a pattern array accepts any remaining elements. Objects
/// must have exactly the pattern's keys; everything else compares equal.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPatternMatcher;

const UNBOUNDED: &str = "@...@";

impl PatternMatcher for JsonPatternMatcher {
    fn matches(&self, actual: &Value, pattern: &Value) -> Result<(), String> {
        match_at("$", actual, pattern)
    }
}

fn match_at(path: &str, actual: &Value, pattern: &Value) -> Result<(), String> {
    match pattern {
        Value::String(placeholder) if is_placeholder(placeholder) => {
            match_placeholder(path, actual, placeholder)
        }
        Value::Object(expected) => {
            let actual = actual
                .as_object()
                .ok_or_else(|| format!("{}: expected an object, got {}", path, actual))?;

            if let Some(key) = actual.keys().find(|key| !expected.contains_key(*key)) {
                return Err(format!("{}: unexpected key \"{}\"", path, key));
            }

            for (key, value) in expected {
                let child = format!("{}.{}", path, key);
                let candidate = actual
                    .get(key)
                    .ok_or_else(|| format!("{}: missing key", child))?;
                match_at(&child, candidate, value)?;
            }

            Ok(())
        }
        Value::Array(expected) => {
            let actual = actual
                .as_array()
                .ok_or_else(|| format!("{}: expected an array, got {}", path, actual))?;

            let (expected, unbounded) = match expected.split_last() {
                Some((Value::String(last), rest)) if last == UNBOUNDED => (rest, true),
                _ => (expected.as_slice(), false),
            };

            if actual.len() < expected.len() || (!unbounded && actual.len() != expected.len()) {
                return Err(format!(
                    "{}: expected {} elements, got {}",
                    path,
                    expected.len(),
                    actual.len()
                ));
            }

            expected
                .iter()
                .zip(actual)
                .enumerate()
                .try_for_each(|(index, (pattern, candidate))| {
                    match_at(&format!("{}[{}]", path, index), candidate, pattern)
                })
        }
        expected if expected == actual => Ok(()),
        expected => Err(format!("{}: expected {}, got {}", path, expected, actual)),
    }
}

fn is_placeholder(text: &str) -> bool {
    text.len() > 2 && text.starts_with('@') && text.ends_with('@') && text != UNBOUNDED
}

fn match_placeholder(path: &str, actual: &Value, placeholder: &str) -> Result<(), String> {
    let matched = match placeholder {
        "@string@" => actual.is_string(),
        "@integer@" => actual.is_i64() || actual.is_u64(),
        "@number@" | "@double@" => actual.is_number(),
        "@boolean@" => actual.is_boolean(),
        "@array@" => actual.is_array(),
        "@null@" => actual.is_null(),
        "@*@" | "@wildcard@" => true,
        // not one of ours, so it is a literal
        _ => return match_literal(path, actual, placeholder),
    };

    if matched {
        Ok(())
    } else {
        Err(format!("{}: {} doesn't match {}", path, actual, placeholder))
    }
}

fn match_literal(path: &str, actual: &Value, text: &str) -> Result<(), String> {
    match actual.as_str() {
        Some(actual) if actual == text => Ok(()),
        _ => Err(format!("{}: expected \"{}\", got {}", path, text, actual)),
    }
}
