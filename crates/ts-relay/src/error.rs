use thiserror::Error;

/// Why a relay call fell back to its default.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// Connection refused, DNS, TLS, or any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the transport timeout.
    #[error("request timed out")]
    Timeout,

    /// The relay answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    /// The response body was not the expected JSON document.
    #[error("malformed {endpoint} response: {message}")]
    Parse {
        endpoint: &'static str,
        message: String,
    },

    /// The client itself could not be constructed.
    #[error("invalid relay client configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Timeout
        } else {
            RelayError::Transport(err.to_string())
        }
    }
}
