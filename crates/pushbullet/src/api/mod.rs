//! Pushbullet API integration
//!
//! This module provides:
//! - Endpoint and request descriptions (plain data, transport independent)
//! - The `Transport` seam and its `ureq` implementation
//! - Response classification for every page of every call
//! - The paginated fetcher

mod classify;
mod client;
mod fetch;
mod transport;

pub use classify::{Classification, Exchange, TRANSPORT_OK, UnknownCause, classify};
pub use client::PushClient;
pub use transport::{RawResponse, Transport, TransportFailure, UreqTransport};

use serde_json::Value;

use crate::models::Iden;

/// Remote resource addressed by a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Pushes,
    Push(Iden),
    Devices,
    Chats,
    Subscriptions,
    Me,
    UploadRequest,
    Ephemerals,
}

impl Endpoint {
    /// Path relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            Endpoint::Pushes => "pushes".to_string(),
            Endpoint::Push(iden) => format!("pushes/{}", urlencoding::encode(iden.as_str())),
            Endpoint::Devices => "devices".to_string(),
            Endpoint::Chats => "chats".to_string(),
            Endpoint::Subscriptions => "subscriptions".to_string(),
            Endpoint::Me => "users/me".to_string(),
            Endpoint::UploadRequest => "upload-request".to_string(),
            Endpoint::Ephemerals => "ephemerals".to_string(),
        }
    }

    /// JSON key holding the items of a listing page
    pub fn collection_key(&self) -> Option<&'static str> {
        match self {
            Endpoint::Pushes => Some("pushes"),
            Endpoint::Devices => Some("devices"),
            Endpoint::Chats => Some("chats"),
            Endpoint::Subscriptions => Some("subscriptions"),
            _ => None,
        }
    }

    /// Type tag given to listed records that carry none
    pub fn item_kind(&self) -> &'static str {
        match self {
            Endpoint::Pushes | Endpoint::Push(_) => "push",
            Endpoint::Devices => "device",
            Endpoint::Chats => "chat",
            Endpoint::Subscriptions => "subscription",
            Endpoint::Me => "user",
            Endpoint::UploadRequest => "upload",
            Endpoint::Ephemerals => "ephemeral",
        }
    }

    /// Field whose presence marks a successful, non-empty response
    pub fn success_marker(&self) -> &'static str {
        match self {
            Endpoint::UploadRequest => "upload_url",
            Endpoint::Me => "iden",
            _ => "created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Multipart { boundary: String, bytes: Vec<u8> },
}

impl Body {
    /// Build a single-file `multipart/form-data` body
    pub fn multipart_file(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        let boundary = format!("------------------------pb{:016x}", boundary_seed(data));
        let mut bytes = Vec::with_capacity(data.len() + 256);
        bytes.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field,
                file_name.replace('"', "_")
            )
            .as_bytes(),
        );
        bytes.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        Body::Multipart { boundary, bytes }
    }
}

fn boundary_seed(data: &[u8]) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    RandomState::new().hash_one(data.len())
}

/// One HTTP call, described as plain data
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the API base, or an absolute URL (file uploads)
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl Request {
    pub fn new(method: Method, endpoint: &Endpoint) -> Self {
        Self {
            method,
            path: endpoint.path(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(endpoint: &Endpoint) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: &Endpoint, body: Value) -> Self {
        Self::new(Method::Post, endpoint).with_body(Body::Json(body))
    }

    pub fn delete(endpoint: &Endpoint) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    /// Request against an absolute URL outside the API (no access token)
    pub fn absolute(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            path: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of a query parameter, if set
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_absolute(&self) -> bool {
        self.path.starts_with("https://") || self.path.starts_with("http://")
    }

    /// Full URL with URL-encoded query string
    pub fn url(&self, base_url: &str) -> String {
        let mut url = if self.is_absolute() {
            self.path.clone()
        } else {
            format!("{}/{}", base_url.trim_end_matches('/'), self.path)
        };

        for (i, (key, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}
