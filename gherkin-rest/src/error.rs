use hyper::http;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request field was present but not an object, or held a value of the wrong shape.
    #[error("Malformed request: `{field}` {reason}")]
    MalformedRequest { field: String, reason: String },

    #[error("The request body couldn't be encoded as JSON: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Couldn't resolve the file \"{file}\": {reason}")]
    FileResolution { file: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("The {origin} is not valid JSON: {source}")]
    InvalidJson {
        origin: JsonOrigin,
        #[source]
        source: serde_json::Error,
    },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Undefined step: \"{0}\"")]
    UndefinedStep(String),

    #[error("The step \"{0}\" requires a block text argument")]
    MissingBlockText(String),

    #[error("The status code \"{0}\" is invalid")]
    InvalidStatusCode(String),

    #[error("No response has been captured yet")]
    NoResponse,

    #[error("The scenario was halted by a previous step")]
    ScenarioHalted,

    #[error("IoError: {0}")]
    Io(#[from] io::Error),

    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("Http Error: {0}")]
    Http(#[from] http::Error),

    #[error("Invalid header name")]
    InvalidHeaderName(#[from] hyper::header::InvalidHeaderName),

    #[error("Invalid header value")]
    InvalidHeaderValue(#[from] hyper::header::InvalidHeaderValue),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid HTTP method \"{0}\"")]
    InvalidMethod(String),
}

/// Where a piece of JSON text came from, for error messages.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum JsonOrigin {
    StepArgument,
    ResponseBody,
    Configuration,
}

impl std::fmt::Display for JsonOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonOrigin::StepArgument => write!(f, "step argument"),
            JsonOrigin::ResponseBody => write!(f, "response body"),
            JsonOrigin::Configuration => write!(f, "configuration"),
        }
    }
}

impl Error {
    pub(crate) fn malformed<S1: Into<String>, S2: Into<String>>(field: S1, reason: S2) -> Self {
        Error::MalformedRequest {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_json(origin: JsonOrigin, source: serde_json::Error) -> Self {
        Error::InvalidJson { origin, source }
    }
}
