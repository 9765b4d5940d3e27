//! Response classification
//!
//! The API has no structured error envelope that can be told apart from a
//! success body by shape alone, so every page goes through an ordered list
//! of rules. The first rule whose predicate matches decides the outcome.

use log::trace;
use serde_json::Value;

use super::{Endpoint, RawResponse, TransportFailure};
use crate::error::PushError;

/// Transport status of a call that completed at the connection level
pub const TRANSPORT_OK: u8 = 0;

/// Parameters whose "invalid value" error means the push target is unknown
const TARGET_PARAMS: &[&str] = &["'device_iden'", "'channel_tag'", "'email'", "'client_iden'"];

const AUTH_SENTINELS: &[&str] = &["invalid_access_token", "access_token_missing"];

const NOT_FOUND_SENTINEL: &str = "The resource could not be found.";

/// Outcome of classifying one page
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// More pages follow; fetch again with this cursor
    Continue(String),
    StopNormal,
    AbortAuth,
    AbortTarget,
    AbortNotFound,
    AbortUnknown(UnknownCause),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnknownCause {
    Transport { code: u8, message: String },
    Payload(String),
}

impl Classification {
    /// `Ok(Some(cursor))` to continue, `Ok(None)` to stop, `Err` to abort
    pub fn into_result(self) -> Result<Option<String>, PushError> {
        match self {
            Classification::Continue(cursor) => Ok(Some(cursor)),
            Classification::StopNormal => Ok(None),
            Classification::AbortAuth => Err(PushError::Auth),
            Classification::AbortTarget => Err(PushError::UnknownTarget),
            Classification::AbortNotFound => Err(PushError::ObjectNotFound),
            Classification::AbortUnknown(UnknownCause::Transport { code, message }) => {
                Err(PushError::Transport { code, message })
            }
            Classification::AbortUnknown(UnknownCause::Payload(raw)) => {
                Err(PushError::UnrecognizedResponse(raw))
            }
        }
    }
}

/// What the classifier sees of one call: a low-level status and the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// `TRANSPORT_OK` or a curl-style failure code
    pub transport_code: u8,
    /// Response body, or the failure message when the transport failed
    pub body: String,
}

impl Exchange {
    pub fn new(transport_code: u8, body: impl Into<String>) -> Self {
        Self {
            transport_code,
            body: body.into(),
        }
    }

    /// Successful exchange carrying `body`
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(TRANSPORT_OK, body)
    }
}

impl From<Result<RawResponse, TransportFailure>> for Exchange {
    fn from(result: Result<RawResponse, TransportFailure>) -> Self {
        match result {
            Ok(response) => Exchange::ok(response.body),
            Err(failure) => Exchange::new(failure.code, failure.message),
        }
    }
}

/// A page prepared for rule evaluation
struct Page<'a> {
    endpoint: &'a Endpoint,
    exchange: &'a Exchange,
    json: Option<Value>,
}

impl Page<'_> {
    fn raw(&self) -> &str {
        &self.exchange.body
    }

    fn object(&self) -> Option<&serde_json::Map<String, Value>> {
        self.json.as_ref().and_then(Value::as_object)
    }

    fn cursor(&self) -> Option<&str> {
        self.object()?
            .get("cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
    }

    /// Every array in the object is empty, and there is at least one
    fn all_collections_empty(&self) -> bool {
        let Some(object) = self.object() else {
            return false;
        };
        let mut arrays = object.values().filter_map(Value::as_array).peekable();
        arrays.peek().is_some() && arrays.all(|a| a.is_empty())
    }

    fn error_code(&self) -> Option<&str> {
        let object = self.object()?;
        object
            .get("error_code")
            .and_then(Value::as_str)
            .or_else(|| object.get("error")?.get("code")?.as_str())
    }
}

struct Rule {
    name: &'static str,
    applies: fn(&Page) -> bool,
    outcome: fn(&Page) -> Classification,
}

const RULES: &[Rule] = &[
    Rule {
        name: "transport-failure",
        applies: |p| p.exchange.transport_code != TRANSPORT_OK,
        outcome: |p| {
            Classification::AbortUnknown(UnknownCause::Transport {
                code: p.exchange.transport_code,
                message: p.raw().to_string(),
            })
        },
    },
    Rule {
        name: "invalid-target",
        applies: |p| {
            p.raw().contains("has an invalid value")
                && TARGET_PARAMS.iter().any(|param| p.raw().contains(param))
        },
        outcome: |_| Classification::AbortTarget,
    },
    Rule {
        name: "invalid-credential",
        applies: |p| AUTH_SENTINELS.iter().any(|s| p.raw().contains(s)),
        outcome: |_| Classification::AbortAuth,
    },
    Rule {
        name: "not-found",
        applies: |p| p.raw().contains(NOT_FOUND_SENTINEL) || p.error_code() == Some("not_found"),
        outcome: |_| Classification::AbortNotFound,
    },
    Rule {
        name: "empty-collections",
        applies: |p| p.all_collections_empty() && p.cursor().is_none(),
        outcome: |_| Classification::StopNormal,
    },
    // The server can hand out a cursor pointing at an empty tail. Stop here
    // rather than walking further empty pages.
    // TODO: confirm against the current API whether an empty page can be
    // followed by non-empty ones; this stop would hide them.
    Rule {
        name: "empty-collections-dangling-cursor",
        applies: |p| p.all_collections_empty() && p.cursor().is_some(),
        outcome: |_| Classification::StopNormal,
    },
    Rule {
        name: "empty-object",
        applies: |p| p.object().is_some_and(|o| o.is_empty()),
        outcome: |_| Classification::StopNormal,
    },
    Rule {
        name: "missing-success-marker",
        applies: |p| {
            let marker = format!("\"{}\"", p.endpoint.success_marker());
            !p.raw().contains(&marker)
        },
        outcome: |p| Classification::AbortUnknown(UnknownCause::Payload(p.raw().to_string())),
    },
    Rule {
        name: "success",
        applies: |_| true,
        outcome: |p| match p.cursor() {
            Some(cursor) => Classification::Continue(cursor.to_string()),
            None => Classification::StopNormal,
        },
    },
];

/// Classify one response of a call to `endpoint`
pub fn classify(endpoint: &Endpoint, exchange: &Exchange) -> Classification {
    let page = Page {
        endpoint,
        exchange,
        json: serde_json::from_str(&exchange.body).ok(),
    };

    for rule in RULES {
        if (rule.applies)(&page) {
            trace!("{} response matched rule '{}'", endpoint.path(), rule.name);
            return (rule.outcome)(&page);
        }
    }

    // The last rule always applies
    Classification::StopNormal
}
