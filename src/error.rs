use std::time::Duration;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ReqwrapError {
    /// Response headers did not arrive within the per-attempt timeout.
    ///
    /// Timeouts are never retried.
    #[error("request timed out after {}: {request}", display_timeout(.timeout))]
    Timeout {
        /// The per-attempt bound that elapsed, if it came from the request.
        timeout: Option<Duration>,
        /// Rendered request, for diagnostics.
        request: String,
    },
    /// Connection-level failure (refused, reset, TLS, DNS) from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// `reqwest` rejected the request while building it.
    #[error("invalid request: {0}")]
    InvalidRequest(reqwest::Error),
    /// The JSON request body could not be encoded.
    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),
    /// A header name or value passed to `try_header` was invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// Every attempt was flagged by the retry predicate.
    #[error("failed after {attempts} attempts (last status {status}) for request {request}")]
    RetryExhausted {
        /// Number of attempts performed.
        attempts: usize,
        /// HTTP status of the final response.
        status: u16,
        /// Rendered request, for diagnostics.
        request: String,
    },
    /// The session was closed before the attempt started.
    #[error("session is closed")]
    SessionClosed,
    /// Building the underlying HTTP client failed.
    #[error("failed to build session: {0}")]
    Build(reqwest::Error),
    /// Reading the response body failed.
    #[error("failed to read response body: {0}")]
    Body(reqwest::Error),
    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(String),
    /// The process-wide logger could not be installed.
    #[error("logger error: {0}")]
    Logger(String),
}

impl ReqwrapError {
    /// Short, stable name of the error variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Transport(_) => "transport",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Serialize(_) => "serialize",
            Self::InvalidHeader(_) => "invalid_header",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::SessionClosed => "session_closed",
            Self::Build(_) => "build",
            Self::Body(_) => "body",
            Self::Decode(_) => "decode",
            Self::Logger(_) => "logger",
        }
    }

    /// Returns `true` for failures that happened below the HTTP response
    /// level.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport(_))
    }
}

fn display_timeout(timeout: &Option<Duration>) -> String {
    match timeout {
        Some(timeout) => format!("{} ms", timeout.as_millis()),
        None => "transport deadline".to_owned(),
    }
}
