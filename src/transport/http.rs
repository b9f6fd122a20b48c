// ABOUTME: hyper-based Transport implementation for the Portainer HTTP(S) API.
// ABOUTME: Sends X-API-Key authentication and bounds each round-trip with a timeout.

use super::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Uri;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::fmt;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-API-Key";

/// Transport against a Portainer base URL such as
/// `https://portainer.internal:9443` or `http://portainer.internal:9000`.
/// TLS certificates are checked against the Mozilla root store.
pub struct HttpTransport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport for `base_url`, authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` if the URL does not parse, has no
    /// host, or uses a scheme other than `http` or `https`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let uri = base_url
            .parse::<Uri>()
            .map_err(|e| TransportError::InvalidUrl {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;

        match uri.scheme_str() {
            Some("http" | "https") => {}
            Some(other) => {
                return Err(TransportError::InvalidUrl {
                    url: base_url,
                    reason: format!("unsupported scheme '{}', expected http or https", other),
                });
            }
            None => {
                return Err(TransportError::InvalidUrl {
                    url: base_url,
                    reason: "missing scheme".to_string(),
                });
            }
        }

        if uri.authority().is_none() {
            return Err(TransportError::InvalidUrl {
                url: base_url,
                reason: "missing host".to_string(),
            });
        }

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(
        &self,
        request: &ApiRequest,
    ) -> Result<hyper::Request<Full<Bytes>>, TransportError> {
        let uri = format!("{}{}", self.base_url, request.path_and_query());
        let method = match request.method {
            Method::Get => hyper::Method::GET,
            Method::Post => hyper::Method::POST,
            Method::Put => hyper::Method::PUT,
        };
        let body = request.body.clone().unwrap_or_default();

        hyper::Request::builder()
            .method(method)
            .uri(&uri)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(body))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }

    async fn round_trip(
        &self,
        req: hyper::Request<Full<Bytes>>,
    ) -> Result<ApiResponse, TransportError> {
        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Connection(format!("failed to read response: {}", e)))?
            .to_bytes();

        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let req = self.build_request(&request)?;

        let response = tokio::time::timeout(self.timeout, self.round_trip(req))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))??;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "portainer request"
        );

        Ok(response)
    }
}
