// Error types for the library. The binary wraps these with `anyhow` context,
// the library itself keeps them typed so callers can tell an authorization
// failure from a rejected upload.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while turning a source descriptor into bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("GET {url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("GET {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Missing or malformed configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 401/403 from the CMS, or an XML-RPC fault carrying code 403.
    #[error("authorization rejected ({status}): {body}")]
    Auth { status: u16, body: String },

    /// Any other non-2xx from an upload endpoint.
    #[error("upload rejected ({status}): {body}")]
    Upload { status: u16, body: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from server: {0}")]
    Decode(String),

    #[error("sideload needs a remote http(s) URL, got {0:?}")]
    SideloadNeedsUrl(String),

    #[error("filename cannot be sent in a header: {0:?}")]
    InvalidFilename(String),
}

impl Error {
    /// Maps a non-2xx status and its body onto `Auth` or `Upload`.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Error::Auth { status, body },
            _ => Error::Upload { status, body },
        }
    }

    /// True when the server answered 403 Forbidden. This is what lets the
    /// resolver move on to the fallback strategy.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Error::Auth { status: 403, .. })
    }

    /// HTTP status reported by the server, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Upload { status, .. } => Some(*status),
            Error::Fetch(FetchError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
