use crate::{
    data::{CapturedResponse, Fields, Files, Params, RequestData},
    error::Result,
    http_client::{HttpTransport, HyperHttpTransport},
    multipart,
    rest_module::RestModule,
    session_headers::SessionHeaders,
};
use serde_json::Map;
use tokio::runtime::{Builder, Runtime};
use tracing::info;
use url::{form_urlencoded, Url};

const CONTENT_TYPE: &str = "Content-Type";
const DEFAULT_BOUNDARY: &str = "gherkin-rest-boundary";

/// A [`RestModule`] that performs real HTTP calls.
///
/// Each call blocks on a private current-thread runtime, so a session must
/// not be driven from inside another async runtime.
#[derive(Debug)]
pub struct HttpSession {
    base_url: Url,
    headers: SessionHeaders,
    last_response: Option<CapturedResponse>,
    runtime: Runtime,
    transport: Box<dyn HttpTransport + Send + Sync>,
}

impl HttpSession {
    pub fn new<S: AsRef<str>>(base_url: S) -> Result<Self> {
        Self::with_transport(base_url, HyperHttpTransport::new())
    }

    pub fn with_transport<S, T>(base_url: S, transport: T) -> Result<Self>
    where
        S: AsRef<str>,
        T: HttpTransport + Send + Sync + 'static,
    {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        Ok(Self {
            base_url: Url::parse(base_url.as_ref())?,
            headers: SessionHeaders::new(),
            last_response: None,
            runtime,
            transport: Box::new(transport),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Encodes one call: URL joined onto the base URL, session headers, and the body for `params`.
    pub fn build_request(&self, method: &str, url: &str, params: Params, files: &Files) -> Result<RequestData> {
        let mut url = self.base_url.join(url)?;
        let mut headers: Fields = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let body = match params {
            Params::Query(query) => {
                if !query.is_empty() {
                    url.query_pairs_mut().extend_pairs(query.iter());
                }
                Vec::new()
            }
            Params::Json(text) => {
                self.default_content_type(&mut headers, "application/json");
                text.into_bytes()
            }
            Params::Form(fields) => self.encode_form(&mut headers, &fields, files)?,
            Params::Empty if !files.is_empty() => self.encode_form(&mut headers, &Map::new(), files)?,
            Params::Empty => Vec::new(),
        };

        Ok(RequestData {
            url: url.into(),
            method: method.to_string(),
            headers,
            body,
        })
    }

    fn encode_form(&self, headers: &mut Fields, fields: &Map<String, serde_json::Value>, files: &Files) -> Result<Vec<u8>> {
        let session_boundary = self.headers.get(CONTENT_TYPE).and_then(multipart::boundary_of);

        if files.is_empty() && session_boundary.is_none() {
            self.default_content_type(headers, "application/x-www-form-urlencoded");
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter().map(|(name, value)| (name, multipart::field_text(value))))
                .finish();
            return Ok(encoded.into_bytes());
        }

        let boundary = match session_boundary {
            Some(boundary) => boundary.to_string(),
            None => {
                headers.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE));
                headers.insert(
                    CONTENT_TYPE.to_string(),
                    format!("multipart/form-data; boundary={}", DEFAULT_BOUNDARY),
                );
                DEFAULT_BOUNDARY.to_string()
            }
        };

        multipart::encode(&boundary, fields, files)
    }

    fn default_content_type(&self, headers: &mut Fields, content_type: &str) {
        if !self.headers.contains(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE.to_string(), content_type.to_string());
        }
    }
}

impl RestModule for HttpSession {
    fn session_headers(&self) -> &SessionHeaders {
        &self.headers
    }

    fn session_headers_mut(&mut self) -> &mut SessionHeaders {
        &mut self.headers
    }

    fn send(&mut self, method: &str, url: &str, params: Params, files: Files) -> Result<()> {
        self.last_response = None;

        let request = self.build_request(method, url, params, &files)?;
        info!(method = %request.method, url = %request.url, "sending request");

        let response = self.runtime.block_on(self.transport.execute(&request))?;
        info!(status_code = response.status_code, "request completed");

        self.last_response = Some(response);
        Ok(())
    }

    fn last_response(&self) -> Option<&CapturedResponse> {
        self.last_response.as_ref()
    }
}
