//! Error taxonomy shared by the fetcher, tracker, resolver and actions

/// Failure of a Pushbullet operation
///
/// Every variant maps to its own process exit code so scripts can tell
/// failures apart. `UnrecognizedResponse` is the only catch-all.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// Connection-level failure; `code` follows curl's exit codes
    #[error("transport failure ({code}): {message}")]
    Transport { code: u8, message: String },

    #[error("access token is missing or invalid")]
    Auth,

    #[error("target device or channel not found")]
    UnknownTarget,

    #[error("object not found")]
    ObjectNotFound,

    #[error("'{query}' matches more than one device ({}), be more specific", .matches.join(", "))]
    AmbiguousQuery { query: String, matches: Vec<String> },

    #[error("no device matches '{query}'")]
    NoSuchDevice { query: String },

    #[error("invalid input: {0}")]
    MalformedInput(String),

    #[error("unrecognized response from server: {0}")]
    UnrecognizedResponse(String),

    /// Local failure (watermark store, reading a file to upload)
    #[error(transparent)]
    Local(#[from] anyhow::Error),
}

impl PushError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            PushError::Transport { code, .. } => *code,
            PushError::Auth => 10,
            PushError::UnknownTarget => 11,
            PushError::ObjectNotFound => 12,
            PushError::AmbiguousQuery { .. } => 13,
            PushError::NoSuchDevice { .. } => 14,
            PushError::MalformedInput(_) => 2,
            PushError::UnrecognizedResponse(_) => 15,
            PushError::Local(_) => 3,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        PushError::MalformedInput(message.into())
    }
}

pub type Result<T, E = PushError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            PushError::Auth,
            PushError::UnknownTarget,
            PushError::ObjectNotFound,
            PushError::AmbiguousQuery {
                query: "q".into(),
                matches: vec![],
            },
            PushError::NoSuchDevice { query: "q".into() },
            PushError::MalformedInput("x".into()),
            PushError::UnrecognizedResponse("x".into()),
            PushError::Local(anyhow::anyhow!("disk")),
        ];
        let mut codes: Vec<u8> = errors.iter().map(PushError::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_ambiguous_message_lists_matches() {
        let err = PushError::AmbiguousQuery {
            query: "office".into(),
            matches: vec!["Office-PC".into(), "Office-Laptop".into()],
        };
        assert_eq!(
            err.to_string(),
            "'office' matches more than one device (Office-PC, Office-Laptop), be more specific"
        );
    }
}
