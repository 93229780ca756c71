//! Checks over a [`CapturedResponse`], plus the dumps used by the print steps.

use crate::{
    data::CapturedResponse,
    error::{Error, JsonOrigin, Result},
    matcher::PatternMatcher,
};
use serde_json::Value;

pub fn status_is(response: &CapturedResponse, expected: u16) -> Result<()> {
    if response.status_code == expected {
        return Ok(());
    }

    Err(Error::AssertionFailed(format!(
        "expected response code {}, got {}",
        expected, response.status_code
    )))
}

pub fn status_is_successful(response: &CapturedResponse) -> Result<()> {
    if (200..=299).contains(&response.status_code) {
        return Ok(());
    }

    Err(Error::AssertionFailed(format!(
        "expected a successful (2xx) response code, got {}",
        response.status_code
    )))
}

/// Byte-for-byte comparison; an empty expectation demands an empty body.
pub fn body_equals(response: &CapturedResponse, expected: &str) -> Result<()> {
    if response.body == expected {
        return Ok(());
    }

    Err(Error::AssertionFailed(format!(
        "expected response body \"{}\", got \"{}\"",
        expected.escape_default(),
        response.body.escape_default()
    )))
}

pub fn header_is(response: &CapturedResponse, name: &str, expected: Option<&str>) -> Result<()> {
    match (response.header(name), expected) {
        (None, _) => Err(Error::AssertionFailed(format!(
            "expected a \"{}\" response header, found none",
            name
        ))),
        (Some(actual), Some(expected)) if actual != expected => {
            Err(Error::AssertionFailed(format!(
                "expected response header \"{}\" to be \"{}\", got \"{}\"",
                name, expected, actual
            )))
        }
        _ => Ok(()),
    }
}

pub fn decode_body(response: &CapturedResponse) -> Result<Value> {
    serde_json::from_str(&response.body).map_err(|e| Error::invalid_json(JsonOrigin::ResponseBody, e))
}

pub fn body_contains_json(response: &CapturedResponse, expected: &Value) -> Result<()> {
    let actual = decode_body(response)?;

    if json_contains(&actual, expected) {
        return Ok(());
    }

    Err(Error::AssertionFailed(format!(
        "response body {} doesn't contain {}",
        actual, expected
    )))
}

pub fn body_matches_pattern(
    response: &CapturedResponse,
    pattern: &Value,
    matcher: &dyn PatternMatcher,
) -> Result<()> {
    let actual = decode_body(response)?;

    matcher
        .matches(&actual, pattern)
        .map_err(|reason| Error::AssertionFailed(format!("response body doesn't match: {}", reason)))
}

/// Structural containment.
///
/// An expected object sharing at least one key with the actual object must
/// have every key present with a contained value; extra keys are ignored.
/// When it shares none, it is looked for among the nested values instead, so
/// `{"name": "Jane"}` is found inside a list of users or under a wrapper key.
/// Expected array elements are each matched by a distinct actual element, in
/// any order. Scalars compare equal.
pub fn json_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(fields), Value::Object(expected_fields)) => {
            if expected_fields.is_empty() || expected_fields.keys().any(|key| fields.contains_key(key)) {
                expected_fields.iter().all(|(key, value)| {
                    fields
                        .get(key)
                        .map_or(false, |candidate| json_contains(candidate, value))
                })
            } else {
                fields.values().any(|child| json_contains(child, expected))
            }
        }
        (Value::Array(elements), Value::Object(_)) => {
            elements.iter().any(|element| json_contains(element, expected))
        }
        (Value::Array(elements), Value::Array(expected_elements)) => {
            let mut used = vec![false; elements.len()];
            contains_each(elements, expected_elements, &mut used)
        }
        (actual, expected) => actual == expected,
    }
}

/// Backtracking assignment of `expected` elements to unused `actual` elements.
fn contains_each(actual: &[Value], expected: &[Value], used: &mut [bool]) -> bool {
    let (first, rest) = match expected.split_first() {
        Some(split) => split,
        None => return true,
    };

    for (index, candidate) in actual.iter().enumerate() {
        if used[index] || !json_contains(candidate, first) {
            continue;
        }

        used[index] = true;
        if contains_each(actual, rest, used) {
            return true;
        }
        used[index] = false;
    }

    false
}

pub fn dump(response: &CapturedResponse) -> String {
    response.body.clone()
}

pub fn dump_json(response: &CapturedResponse) -> Result<String> {
    let body = decode_body(response)?;
    serde_json::to_string_pretty(&body).map_err(Error::Serialization)
}
