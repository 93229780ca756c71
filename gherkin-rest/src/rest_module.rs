use crate::{
    assertions,
    data::{CapturedResponse, Files, Params},
    error::{Error, Result},
    session_headers::SessionHeaders,
};
use serde_json::Value;

/// The HTTP test client the steps drive.
///
/// Implementors own the session headers and the single captured response;
/// the assertion primitives are provided on top of those.
pub trait RestModule {
    fn session_headers(&self) -> &SessionHeaders;

    fn session_headers_mut(&mut self) -> &mut SessionHeaders;

    /// Executes one HTTP call with the current session headers and records its response.
    fn send(&mut self, method: &str, url: &str, params: Params, files: Files) -> Result<()>;

    fn last_response(&self) -> Option<&CapturedResponse>;

    fn have_http_header(&mut self, name: &str, value: &str) {
        self.session_headers_mut().set(name, value);
    }

    fn unset_http_header(&mut self, name: &str) {
        self.session_headers_mut().remove(name);
    }

    fn response(&self) -> Result<&CapturedResponse> {
        self.last_response().ok_or(Error::NoResponse)
    }

    fn grab_response(&self) -> Result<String> {
        Ok(self.response()?.body.clone())
    }

    fn see_response_code_is(&self, code: u16) -> Result<()> {
        assertions::status_is(self.response()?, code)
    }

    fn see_response_code_is_successful(&self) -> Result<()> {
        assertions::status_is_successful(self.response()?)
    }

    fn see_response_equals(&self, expected: &str) -> Result<()> {
        assertions::body_equals(self.response()?, expected)
    }

    fn see_http_header(&self, name: &str, value: Option<&str>) -> Result<()> {
        assertions::header_is(self.response()?, name, value)
    }

    fn see_response_contains_json(&self, expected: &Value) -> Result<()> {
        assertions::body_contains_json(self.response()?, expected)
    }
}
