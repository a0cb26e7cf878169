use std::fmt;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The token service could not be reached (connect failure, timeout, ...).
    Transport(reqwest::Error),
    /// The token service answered with a non-success status.
    Authentication { status: StatusCode, body: String },
    /// A success response whose body could not be turned into token data.
    Decode(String),
    Config(String),
}

impl Error {
    /// HTTP status carried by an [`Error::Authentication`].
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Authentication { status, .. } => Some(*status),
            Error::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(err) if err.is_timeout())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Json(err) => write!(f, "json error: {err}"),
            Error::Transport(err) => write!(f, "token request failed: {err}"),
            // The raw response body is the message callers inspect.
            Error::Authentication { body, .. } => f.write_str(body),
            Error::Decode(msg) => write!(f, "malformed token response: {msg}"),
            Error::Config(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err)
    }
}
