use thiserror::Error;

/// Server error codes that mean "try another proxy".
///
/// `TIMEOUT` is the generic deadline error, the rest are RPC layer codes for
/// a broken channel, an unavailable service and an overloaded request queue.
pub mod codes {
    pub const TIMEOUT: i32 = 3;
    pub const TRANSPORT_ERROR: i32 = 100;
    pub const UNAVAILABLE: i32 = 105;
    pub const REQUEST_QUEUE_SIZE_LIMIT_EXCEEDED: i32 = 108;

    /// Returns `true` if a server error with this code should be retried on another endpoint.
    pub fn is_recoverable(code: i32) -> bool {
        matches!(
            code,
            TIMEOUT | TRANSPORT_ERROR | UNAVAILABLE | REQUEST_QUEUE_SIZE_LIMIT_EXCEEDED
        )
    }
}

/// Transient, endpoint-level failure. Eligible for failover.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoverableError {
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Endpoint unavailable (code {code}): {message}")]
    Unavailable { code: i32, message: String },
}

#[derive(Error, Debug)]
pub enum YtError {
    #[error("Incomplete request: {method} requires `{field}`")]
    IncompleteRequest {
        method: &'static str,
        field: &'static str,
    },

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Unknown {enum_name} value: {value}")]
    UnknownEnumValue {
        enum_name: &'static str,
        value: String,
    },

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Recoverable dispatch error: {0}")]
    RecoverableDispatch(#[from] RecoverableError),

    #[error("Request rejected (code {code}): {message}")]
    UnrecoverableDispatch { code: i32, message: String },

    #[error("Retry budget exhausted after {attempts} attempts: {last}")]
    RetryBudgetExhausted {
        attempts: usize,
        #[source]
        last: Box<YtError>,
    },

    #[error("No endpoints available")]
    NoEndpoints,

    #[error("Message too large: {size} bytes (max {max} bytes)")]
    MessageTooLarge { size: usize, max: usize },
}

impl YtError {
    /// Whether the dispatcher may fail over to another endpoint.
    ///
    /// Errors are classified once, where the transport produces them; this is
    /// the only predicate consulted afterwards.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, YtError::RecoverableDispatch(_))
    }

    /// Builds the error for a server-reported failure, classifying it by code.
    pub fn from_server(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        if codes::is_recoverable(code) {
            YtError::RecoverableDispatch(RecoverableError::Unavailable { code, message })
        } else {
            YtError::UnrecoverableDispatch { code, message }
        }
    }
}

pub type Result<T> = std::result::Result<T, YtError>;
