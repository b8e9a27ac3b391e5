use thiserror::Error;

/// How an upstream non-2xx response is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// 404: the city could not be resolved.
    NotFound,
    /// 400: the request was rejected, e.g. an empty city name.
    InvalidRequest,
    /// 401: missing or invalid API key.
    Unauthorized,
    Other,
}

impl UpstreamKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => UpstreamKind::NotFound,
            400 => UpstreamKind::InvalidRequest,
            401 => UpstreamKind::Unauthorized,
            _ => UpstreamKind::Other,
        }
    }
}

/// Coarse error classification. Every kind degrades to "no data" in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    NetworkFailure,
    UpstreamError(UpstreamKind),
    MalformedResponse,
}

/// Failure of a single weather or forecast fetch.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// No usable response: connect error, timeout, or body read failure.
    #[error("Network failure: {0}")]
    Network(String),

    /// Upstream answered with a non-2xx status.
    #[error("Upstream returned status {status}: {body}")]
    Upstream {
        status: u16,
        kind: UpstreamKind,
        body: String,
    },

    /// Payload did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn upstream(status: u16, body: &str) -> Self {
        FetchError::Upstream {
            status,
            kind: UpstreamKind::from_status(status),
            body: truncate_body(body),
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network(_) => FetchErrorKind::NetworkFailure,
            FetchError::Upstream { kind, .. } => FetchErrorKind::UpstreamError(*kind),
            FetchError::Malformed(_) => FetchErrorKind::MalformedResponse,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
