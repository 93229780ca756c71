use crate::{
    data::{CapturedResponse, RequestData},
    error::{Error, Result},
    util,
};
use async_trait::async_trait;
use hyper::{body, client::HttpConnector, Body, Client, Method, Request};
use hyper_tls::HttpsConnector;
use std::fmt::Debug;
use tracing::debug;

/// Executes one fully encoded request.
#[async_trait]
pub trait HttpTransport: Debug {
    async fn execute(&self, request: &RequestData) -> Result<CapturedResponse>;
}

#[derive(Debug)]
pub struct HyperHttpTransport {
    client: Client<HttpsConnector<HttpConnector>>,
}

impl HyperHttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::builder().build(HttpsConnector::new()),
        }
    }
}

#[async_trait]
impl HttpTransport for HyperHttpTransport {
    async fn execute(&self, request_data: &RequestData) -> Result<CapturedResponse> {
        let method = Method::from_bytes(request_data.method.to_uppercase().as_bytes())
            .map_err(|_| Error::InvalidMethod(request_data.method.clone()))?;

        let mut request_builder = Request::builder()
            .uri(request_data.url.as_str())
            .method(method);

        if let Some(headers_mut) = request_builder.headers_mut() {
            util::put_headers(
                headers_mut,
                request_data
                    .headers
                    .iter()
                    .filter(|(header_name, _)| !header_name.eq_ignore_ascii_case("host")),
            )?;
        }

        let request: Request<Body> = request_builder.body(request_data.body.clone().into())?;

        let response = self.client.request(request).await?;

        let status_code = response.status().as_u16();
        let headers = util::extract_headers(response.headers());
        let body = body::to_bytes(response.into_body()).await?;
        let body: String = String::from_utf8_lossy(&body).into();

        debug!(status_code, bytes = body.len(), "response received");

        Ok(CapturedResponse {
            status_code,
            headers,
            body,
        })
    }
}

impl Default for HyperHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}
