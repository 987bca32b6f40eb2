use std::fmt;

use thiserror::Error;

/// Method and path of the call that produced an error, e.g. `GET /v1/video-requests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: reqwest::Method,
    pub path: String,
}

impl RequestDescriptor {
    pub(crate) fn new(method: reqwest::Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// An image dimension probe failed for `uri`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not probe image size of {uri}: {reason}")]
pub struct ProbeError {
    pub uri: String,
    pub reason: String,
}

impl ProbeError {
    pub fn new(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}

/// All errors that can occur when using the Videomatik SDK.
#[derive(Error, Debug)]
pub enum VideomatikError {
    /// No usable credential, or a credential that cannot be sent as a header.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An argument was rejected before any request was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("{request} failed: {source}")]
    Transport {
        request: RequestDescriptor,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{request} returned {status_code}: {message}")]
    Api {
        request: RequestDescriptor,
        status_code: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// A payload (or the legacy string-encoded `customJSON`) was not valid JSON
    /// of the expected shape.
    #[error("malformed {context}: {source}")]
    DataFormat {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// An image probe failed while enriching a custom JSON.
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl VideomatikError {
    pub(crate) fn data_format(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::DataFormat {
            context: context.into(),
            source,
        }
    }

    /// HTTP status of an [`Api`](Self::Api) error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// The request that failed, for transport and API errors.
    pub fn request(&self) -> Option<&RequestDescriptor> {
        match self {
            Self::Transport { request, .. } | Self::Api { request, .. } => Some(request),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// A convenience alias for `Result<T, VideomatikError>`.
pub type Result<T> = std::result::Result<T, VideomatikError>;
