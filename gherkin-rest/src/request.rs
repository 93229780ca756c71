//! Turns the loosely typed request object of a step into a [`RequestDescriptor`]
//! and decides how it travels over HTTP.

use crate::{
    data::{Fields, Files, Params},
    error::{Error, JsonOrigin, Result},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{
    env,
    path::{Component, Path},
};

const BODY: &str = "body";
const FILES: &str = "files";
const HEADERS: &str = "headers";
const QUERY: &str = "query";

/// Normalized logical request. Every field is a mapping, empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestDescriptor {
    pub body: Map<String, Value>,
    pub files: Fields,
    pub headers: Fields,
    pub query: Fields,
}

impl RequestDescriptor {
    /// Decodes the block text of a step and normalizes it.
    pub fn parse<S: AsRef<str>>(text: S) -> Result<Self> {
        let raw: Value = serde_json::from_str(text.as_ref())
            .map_err(|e| Error::invalid_json(JsonOrigin::StepArgument, e))?;

        normalize(&raw)
    }
}

/// Builds a [`RequestDescriptor`] out of an untyped JSON object.
///
/// `null` fields count as absent. A field holding anything but an object is
/// rejected, and so is a root that isn't an object.
pub fn normalize(raw: &Value) -> Result<RequestDescriptor> {
    let raw = raw
        .as_object()
        .ok_or_else(|| Error::malformed("request", "must be a JSON object"))?;

    Ok(RequestDescriptor {
        body: object_field(raw, BODY)?.cloned().unwrap_or_default(),
        files: text_field(raw, FILES)?,
        headers: text_field(raw, HEADERS)?,
        query: text_field(raw, QUERY)?,
    })
}

fn object_field<'a>(raw: &'a Map<String, Value>, field: &str) -> Result<Option<&'a Map<String, Value>>> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(Error::malformed(field, "must be an object")),
    }
}

fn text_field(raw: &Map<String, Value>, field: &str) -> Result<Fields> {
    let map = match object_field(raw, field)? {
        Some(map) => map,
        None => return Ok(Fields::new()),
    };

    map.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(Error::malformed(
                        format!("{}.{}", field, key),
                        "must be a string, a number or a boolean",
                    ))
                }
            };
            Ok((key.clone(), text))
        })
        .collect()
}

/// Chooses what a request carries for `method`:
/// GET takes the query, requests with files take the raw body fields,
/// other non-empty bodies become JSON text, everything else sends nothing.
pub fn extract_params<S: AsRef<str>>(method: S, descriptor: &RequestDescriptor) -> Result<Params> {
    if is_get(method) {
        return Ok(Params::Query(descriptor.query.clone()));
    }

    if !descriptor.files.is_empty() {
        return Ok(Params::Form(descriptor.body.clone()));
    }

    if descriptor.body.is_empty() {
        return Ok(Params::Empty);
    }

    serde_json::to_string(&descriptor.body)
        .map(Params::Json)
        .map_err(Error::Serialization)
}

/// Resolves every file reference against `data_dir`.
///
/// Existence is not checked; that happens when the request is sent.
pub fn extract_files<P: AsRef<Path>>(descriptor: &RequestDescriptor, data_dir: P) -> Result<Files> {
    if descriptor.files.is_empty() {
        return Ok(Files::new());
    }

    let data_dir = data_dir.as_ref();
    let data_dir = if data_dir.is_absolute() {
        data_dir.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|e| Error::FileResolution {
                file: data_dir.display().to_string(),
                reason: e.to_string(),
            })?
            .join(data_dir)
    };

    descriptor
        .files
        .iter()
        .map(|(name, filename)| Ok((name.clone(), data_dir.join(relative_file(filename)?))))
        .collect()
}

fn relative_file(filename: &str) -> Result<&Path> {
    let resolution_error = |reason: &str| Error::FileResolution {
        file: filename.into(),
        reason: reason.into(),
    };

    if filename.trim().is_empty() {
        return Err(resolution_error("the file name is empty"));
    }

    let path = Path::new(filename);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(resolution_error("the path leaves the data directory"))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(resolution_error("the path must be relative to the data directory"))
            }
        }
    }

    Ok(path)
}

/// What one HTTP call carries: the encoded payload and the resolved attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub params: Params,
    pub files: Files,
}

impl PendingRequest {
    pub fn new(method: &str, descriptor: &RequestDescriptor) -> Result<Self> {
        Ok(Self {
            params: extract_params(method, descriptor)?,
            files: Files::new(),
        })
    }

    /// Like [`PendingRequest::new`], with the files resolved against `data_dir`.
    ///
    /// A GET carries no body, so files on a GET are an error rather than dropped.
    pub fn with_files<P: AsRef<Path>>(method: &str, descriptor: &RequestDescriptor, data_dir: P) -> Result<Self> {
        if is_get(method) && !descriptor.files.is_empty() {
            return Err(Error::malformed(FILES, "can't be sent with a GET request"));
        }

        Ok(Self {
            params: extract_params(method, descriptor)?,
            files: extract_files(descriptor, data_dir)?,
        })
    }
}

pub(crate) fn is_get<S: AsRef<str>>(method: S) -> bool {
    method.as_ref().eq_ignore_ascii_case("GET")
}
