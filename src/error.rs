/// Errors surfaced by the LinkerX client.
///
/// None of these are fatal: callers display the message and let the user
/// retry. [`Error::SessionExpired`] is additionally handled centrally by the
/// gateway, which tears the session down before re-surfacing it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed client input, rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// A protected operation was attempted with no session present.
    #[error("not authenticated")]
    Unauthenticated,

    /// The backend rejected the session credential. The gateway has already
    /// cleared the session when this reaches the caller.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// Transport failure or a non-success response from the backend.
    #[error("{operation} failed{}", fmt_request_failure(.status, .message))]
    RequestFailed {
        /// The endpoint-level operation that failed.
        operation: &'static str,
        /// HTTP status, when a response was received at all.
        status: Option<u16>,
        /// Human-readable message from the server's error payload, if any.
        message: Option<String>,
    },

    /// A call was refused because one is already in flight on this instance.
    #[error("another request is already in progress")]
    Busy,

    /// Link generation refused client-side: the current quota snapshot does
    /// not permit it (or no snapshot has been fetched yet).
    #[error("link generation quota reached, please wait before generating more links")]
    QuotaExceeded,

    /// Durable client storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wraps a transport-level failure for `operation`.
    pub(crate) fn transport(operation: &'static str, err: &reqwest::Error) -> Self {
        Self::RequestFailed {
            operation,
            status: err.status().map(|s| s.as_u16()),
            message: Some(err.to_string()),
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

fn fmt_request_failure(status: &Option<u16>, message: &Option<String>) -> String {
    match (status, message) {
        (Some(s), Some(m)) => format!(" ({s}): {m}"),
        (Some(s), None) => format!(" ({s})"),
        (None, Some(m)) => format!(": {m}"),
        (None, None) => String::new(),
    }
}
