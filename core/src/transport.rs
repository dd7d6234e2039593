//! Executes an `HttpRequest` and returns the `HttpResponse`.
//!
//! # Design
//! The dispatcher and the OAuth flow talk to the network only through the
//! `Transport` trait, so a scripted in-memory transport can stand in for the
//! server in unit tests. `UreqTransport` is the blocking default; it turns
//! off ureq's status-as-error behavior so 4xx/5xx come back as data and the
//! dispatcher owns status interpretation.

use std::sync::Arc;

use tracing::trace;
use ureq::http::HeaderMap;
use ureq::Agent;

use crate::config::ClientConfig;
use crate::error::NetworkError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip. Non-success statuses are not errors.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a shared ureq agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let timeout = config.timeout();
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global((!timeout.is_zero()).then_some(timeout))
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        trace!(method = request.method.as_str(), url = %request.url, "sending request");
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref();

        let result = match request.method {
            HttpMethod::Get => self.decorate(self.agent.get(url), headers).call(),
            HttpMethod::Delete => self.decorate(self.agent.delete(url), headers).call(),
            HttpMethod::Post => {
                let builder = self.decorate(self.agent.post(url), headers);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = self.decorate(self.agent.put(url), headers);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| NetworkError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| NetworkError::new(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Response headers as owned pairs. Non-UTF-8 bytes are replaced, not dropped.
fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

impl UreqTransport {
    fn decorate<B>(
        &self,
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        builder = builder.header("user-agent", self.user_agent.as_str());
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}
