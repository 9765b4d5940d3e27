//! HTTP transport
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic. HTTP error statuses
//! are not transport failures: their bodies carry the API's error messages
//! and go through classification like any other page.

use log::debug;
use std::time::Duration;

use super::{Body, Method, Request};

/// Response that made it back over the wire, whatever its HTTP status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection-level failure, coded like curl's exit statuses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct TransportFailure {
    pub code: u8,
    pub message: String,
}

impl TransportFailure {
    pub const GENERIC: u8 = 1;
    pub const HOST_NOT_FOUND: u8 = 6;
    pub const CONNECT_FAILED: u8 = 7;
    pub const TIMEOUT: u8 = 28;
    pub const RECEIVE_FAILED: u8 = 56;

    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ureq::Error> for TransportFailure {
    fn from(error: ureq::Error) -> Self {
        let code = match &error {
            ureq::Error::HostNotFound => Self::HOST_NOT_FOUND,
            ureq::Error::ConnectionFailed => Self::CONNECT_FAILED,
            ureq::Error::Timeout(_) => Self::TIMEOUT,
            ureq::Error::Io(_) => Self::RECEIVE_FAILED,
            _ => Self::GENERIC,
        };
        Self::new(code, error.to_string())
    }
}

/// Executes requests; the seam tests replace with scripted responses
pub trait Transport {
    fn execute(&self, request: &Request) -> Result<RawResponse, TransportFailure>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &Request) -> Result<RawResponse, TransportFailure> {
        (**self).execute(request)
    }
}

/// Transport over the Pushbullet HTTPS API
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
    access_token: String,
}

impl UreqTransport {
    /// Pushbullet API base URL
    pub const BASE_URL: &'static str = "https://api.pushbullet.com/v2";

    const TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a transport authenticating with `access_token`
    pub fn new(access_token: impl Into<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Self::TIMEOUT))
            .build()
            .into();

        Self {
            agent,
            base_url: Self::BASE_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Point the transport at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn send(&self, request: &Request) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = request.url(&self.base_url);
        // Uploads go to a pre-signed URL on another host
        let token = (!request.is_absolute()).then_some(self.access_token.as_str());

        match request.method {
            Method::Get => with_token(self.agent.get(&url), token).call(),
            Method::Delete => with_token(self.agent.delete(&url), token).call(),
            Method::Post => {
                let builder = with_token(self.agent.post(&url), token);
                match &request.body {
                    Some(Body::Json(value)) => builder.send_json(value),
                    Some(Body::Multipart { boundary, bytes }) => builder
                        .header(
                            "Content-Type",
                            format!("multipart/form-data; boundary={}", boundary),
                        )
                        .send(&bytes[..]),
                    None => builder.send_empty(),
                }
            }
        }
    }
}

fn with_token<B>(builder: ureq::RequestBuilder<B>, token: Option<&str>) -> ureq::RequestBuilder<B> {
    match token {
        Some(token) => builder.header("Access-Token", token),
        None => builder,
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &Request) -> Result<RawResponse, TransportFailure> {
        debug!(
            "{} {}",
            request.method.as_str(),
            request.url(&self.base_url)
        );

        let mut response = self.send(request)?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;

        debug!("{} -> {} ({} bytes)", request.path, status, body.len());
        Ok(RawResponse { status, body })
    }
}
