//! Error types for the WakaTime client.
//!
//! # Design
//! Failures fall into three families that callers handle differently:
//! transport failures (`NetworkError`, never retried here), credential
//! failures (`AuthError`, from token exchange, refresh, or parsing), and HTTP
//! status failures (`ApiError`, classified from the final response). Every
//! `ApiError` keeps the raw body for diagnostics.

use std::fmt;

use thiserror::Error;

/// The transport could not complete the round-trip (connect, TLS, timeout,
/// or a body that could not be read).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("network error: {message}")]
pub struct NetworkError {
    pub message: String,
}

impl NetworkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures while acquiring, refreshing, or presenting credentials.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// An OAuth credential was asked for a header before any token exchange.
    #[error("not authenticated: no access token has been acquired")]
    NotAuthenticated,

    #[error("no refresh token available")]
    NoRefreshToken,

    /// The token endpoint answered with a non-2xx status.
    #[error("token endpoint returned HTTP {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("malformed token response: {0}")]
    MalformedTokenResponse(String),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Classification of a non-success HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    ServerError,
    Unknown,
}

impl ApiErrorKind {
    /// Map a status code onto its kind. Codes without a dedicated kind,
    /// including other 5xx codes, are `Unknown`.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiErrorKind::BadRequest,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            429 => ApiErrorKind::RateLimited,
            500 => ApiErrorKind::ServerError,
            _ => ApiErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ApiErrorKind::BadRequest => "bad request",
            ApiErrorKind::Unauthorized => "unauthorized: invalid or missing access token",
            ApiErrorKind::Forbidden => "forbidden: insufficient permissions for this request",
            ApiErrorKind::NotFound => "not found: the requested resource does not exist",
            ApiErrorKind::RateLimited => "too many requests: rate limit exceeded",
            ApiErrorKind::ServerError => "internal server error",
            ApiErrorKind::Unknown => "unexpected status",
        };
        f.write_str(text)
    }
}

/// The API answered, but not with 200, 201, or 202.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} (HTTP {status}): {body}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub body: String,
}

impl ApiError {
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            status,
            body: body.into(),
        }
    }
}

/// Every failure a client call can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The response body was not the JSON the caller expected.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The API error kind, if this is an HTTP status failure.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api(err) => Some(err.kind),
            _ => None,
        }
    }
}
