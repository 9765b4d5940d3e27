//! Pushbullet API client
//!
//! Every call is classified before its body is used. There are no retries
//! at this layer: a failed call ends the operation.

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Endpoint, Exchange, Request, Transport, UreqTransport, classify};
use crate::error::{PushError, Result};

/// Pushbullet API client over a pluggable transport
pub struct PushClient<T: Transport = UreqTransport> {
    transport: T,
}

impl PushClient<UreqTransport> {
    /// Client for the public API authenticating with `access_token`
    pub fn with_token(access_token: impl Into<String>) -> Self {
        Self::new(UreqTransport::new(access_token))
    }
}

impl<T: Transport> PushClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `request` against `endpoint` and classify the response
    ///
    /// Returns the parsed body on success. An empty or non-JSON success body
    /// becomes `Value::Null`.
    pub fn call(&self, endpoint: &Endpoint, request: &Request) -> Result<Value> {
        let exchange = Exchange::from(self.transport.execute(request));
        classify(endpoint, &exchange).into_result()?;
        Ok(serde_json::from_str(&exchange.body).unwrap_or(Value::Null))
    }

    /// Like [`call`](Self::call), deserializing the body into `R`
    pub fn call_as<R: DeserializeOwned>(&self, endpoint: &Endpoint, request: &Request) -> Result<R> {
        let value = self.call(endpoint, request)?;
        serde_json::from_value(value.clone()).map_err(|e| {
            debug!("Failed to decode {} response: {}", endpoint.path(), e);
            PushError::UnrecognizedResponse(value.to_string())
        })
    }

    /// Execute a request whose response is not an API document (file uploads)
    pub fn send_raw(&self, request: &Request) -> Result<()> {
        let response = self
            .transport
            .execute(request)
            .map_err(|f| PushError::Transport {
                code: f.code,
                message: f.message,
            })?;

        if response.is_success() {
            Ok(())
        } else {
            Err(PushError::UnrecognizedResponse(format!(
                "HTTP {}: {}",
                response.status, response.body
            )))
        }
    }
}
