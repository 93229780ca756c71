use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::{collections::HashMap, path::PathBuf};

/// Ordered `name -> value` text map used for headers, query strings and file references.
pub type Fields = IndexMap<String, String>;

/// Resolved file attachments: logical part name -> absolute path.
pub type Files = IndexMap<String, PathBuf>;

/// The payload half of a pending request, as chosen by
/// [`extract_params`](crate::request::extract_params).
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// No body and no query string.
    Empty,
    /// GET parameters, sent on the query string.
    Query(Fields),
    /// Body fields submitted next to file parts, never JSON-encoded.
    Form(Map<String, Value>),
    /// A JSON document sent verbatim as the body.
    Json(String),
}

impl Default for Params {
    fn default() -> Self {
        Params::Empty
    }
}

/// A fully encoded request, ready for a transport.
#[derive(Debug, Clone)]
pub struct RequestData {
    pub url: String,
    pub method: String,
    pub headers: Fields,
    pub body: Vec<u8>,
}

/// The last response recorded by a [`RestModule`](crate::RestModule).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedResponse {
    pub status_code: u16,
    /// Header names are stored lower-cased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl CapturedResponse {
    pub fn new<S: Into<String>>(status_code: u16, body: S) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header<S1: AsRef<str>, S2: Into<String>>(mut self, name: S1, value: S2) -> Self {
        self.headers
            .insert(name.as_ref().to_lowercase(), value.into());
        self
    }

    pub fn header<S: AsRef<str>>(&self, name: S) -> Option<&str> {
        self.headers
            .get(&name.as_ref().to_lowercase())
            .map(String::as_str)
    }
}
