//! Error types for HTTP polling.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Result type for polling operations.
pub type CommResult<T> = Result<T, Report<CommError>>;

/// Errors that can occur while polling a backend over HTTP.
///
/// All variants collapse to a human-readable message at the polling
/// boundary; no error ever propagates past a poll tick.
#[derive(Debug, Display)]
pub enum CommError {
    /// Network connectivity issues
    #[display("Network error: {message}")]
    Network { message: String },

    /// Non-success HTTP status
    #[display("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Malformed or unexpected response body
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// Configuration errors
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// Timeout errors
    #[display("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl Error for CommError {}
