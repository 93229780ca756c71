pub mod assertions;
mod configuration;
mod data;
mod error;
mod http_client;
mod http_session;
mod matcher;
pub mod multipart;
mod request;
mod rest_module;
mod session_headers;
mod steps;
mod util;

pub use configuration::{RestStepsConfiguration, DEFAULT_DATA_DIR, REQUIRED_MODULE};
pub use data::{CapturedResponse, Fields, Files, Params, RequestData};
pub use error::{Error, JsonOrigin, Result};
pub use http_client::{HttpTransport, HyperHttpTransport};
pub use http_session::HttpSession;
pub use matcher::{JsonPatternMatcher, PatternMatcher};
pub use request::{extract_files, extract_params, normalize, PendingRequest, RequestDescriptor};
pub use rest_module::RestModule;
pub use session_headers::{with_scoped_headers, ScopedHeaders, SessionHeaders};
pub use steps::{
    patterns, resolve, strip_keyword, Phrasing, RestSteps, Step, StepKind, StepOutcome, StepPart,
    StepPattern,
};
