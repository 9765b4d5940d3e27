//! Test transports shared by the unit tests

use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::api::{Method, RawResponse, Request, Transport, TransportFailure};

/// Replays canned responses in order and records every request
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<RawResponse, TransportFailure>>>,
    requests: RefCell<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, body: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(RawResponse::new(200, body)));
        self
    }

    pub fn respond_status(self, status: u16, body: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn fail(self, code: u8, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportFailure::new(code, message)));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &Request) -> Result<RawResponse, TransportFailure> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request: {:?}", request))
    }
}

/// Serves listings from in-memory records with real cursor paging
pub(crate) struct FakeServer {
    collections: RefCell<HashMap<String, Vec<Value>>>,
    page_size: usize,
    requests: RefCell<Vec<Request>>,
}

impl FakeServer {
    pub fn new(page_size: usize) -> Self {
        Self {
            collections: RefCell::new(HashMap::new()),
            page_size,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Add a record to the listing at `path`, newest first
    pub fn with(self, path: &str, record: Value) -> Self {
        self.collections
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push(record);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    fn list(&self, request: &Request) -> Value {
        let after: f64 = request
            .param("modified_after")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let active_only = request.param("active") == Some("true");
        let offset: usize = request
            .param("cursor")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let collections = self.collections.borrow();
        let matching: Vec<&Value> = collections
            .get(&request.path)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r["modified"].as_f64().unwrap_or(0.0) > after)
                    .filter(|r| !active_only || r["active"].as_bool().unwrap_or(true))
                    .collect()
            })
            .unwrap_or_default();

        let page: Vec<Value> = matching
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|r| (*r).clone())
            .collect();

        let mut body = serde_json::Map::new();
        body.insert(request.path.clone(), Value::Array(page));
        if offset + self.page_size < matching.len() {
            body.insert(
                "cursor".to_string(),
                Value::String((offset + self.page_size).to_string()),
            );
        }
        Value::Object(body)
    }
}

impl Transport for FakeServer {
    fn execute(&self, request: &Request) -> Result<RawResponse, TransportFailure> {
        self.requests.borrow_mut().push(request.clone());
        match request.method {
            Method::Get => Ok(RawResponse::new(200, self.list(request).to_string())),
            _ => Ok(RawResponse::new(200, "{}")),
        }
    }
}

/// A push record as the API returns it
pub(crate) fn push(iden: &str, modified: f64) -> Value {
    json!({
        "iden": iden,
        "type": "note",
        "active": true,
        "created": modified,
        "modified": modified,
        "title": format!("push {}", iden),
    })
}
