//! The credential capability consumed by the dispatcher.
//!
//! # Design
//! The dispatcher depends only on [`Credential`]: produce the current
//! `Authorization` header value, and try to renew it. [`Auth`] is the tagged
//! union of the schemes WakaTime accepts; other schemes implement the trait
//! directly and plug into the same dispatcher.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::oauth::OAuth2Credential;
use crate::error::AuthError;

/// Something that can sign a request and renew itself.
pub trait Credential: Send + Sync {
    /// The full `Authorization` header value. Performs no I/O.
    fn authorization_header(&self) -> Result<String, AuthError>;

    /// Renew the credential after the server rejected it with 401.
    fn refresh(&self) -> Result<(), AuthError>;

    /// Renew after the server rejected `rejected`, the header value that was
    /// actually sent. Implementations may skip the renewal when the current
    /// header already differs from it.
    fn refresh_rejected(&self, _rejected: &str) -> Result<(), AuthError> {
        self.refresh()
    }
}

impl<C: Credential + ?Sized> Credential for std::sync::Arc<C> {
    fn authorization_header(&self) -> Result<String, AuthError> {
        (**self).authorization_header()
    }

    fn refresh(&self) -> Result<(), AuthError> {
        (**self).refresh()
    }

    fn refresh_rejected(&self, rejected: &str) -> Result<(), AuthError> {
        (**self).refresh_rejected(rejected)
    }
}

/// A static WakaTime API key, sent as HTTP Basic.
#[derive(Clone)]
pub struct ApiKeyCredential {
    api_key: String,
    encoded: String,
}

impl ApiKeyCredential {
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let encoded = STANDARD.encode(api_key.as_bytes());
        Self { api_key, encoded }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for ApiKeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredential")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl Credential for ApiKeyCredential {
    fn authorization_header(&self) -> Result<String, AuthError> {
        Ok(format!("Basic {}", self.encoded))
    }

    // API keys do not expire.
    fn refresh(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Either credential scheme WakaTime supports.
#[derive(Debug)]
pub enum Auth {
    ApiKey(ApiKeyCredential),
    OAuth2(OAuth2Credential),
}

impl Auth {
    pub fn api_key(api_key: impl Into<String>) -> Self {
        Auth::ApiKey(ApiKeyCredential::new(api_key))
    }

    /// An API-key credential from `WAKATIME_API_KEY`, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var("WAKATIME_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(Auth::api_key)
    }

    pub fn as_oauth2(&self) -> Option<&OAuth2Credential> {
        match self {
            Auth::OAuth2(credential) => Some(credential),
            Auth::ApiKey(_) => None,
        }
    }
}

impl From<ApiKeyCredential> for Auth {
    fn from(credential: ApiKeyCredential) -> Self {
        Auth::ApiKey(credential)
    }
}

impl From<OAuth2Credential> for Auth {
    fn from(credential: OAuth2Credential) -> Self {
        Auth::OAuth2(credential)
    }
}

impl Credential for Auth {
    fn authorization_header(&self) -> Result<String, AuthError> {
        match self {
            Auth::ApiKey(credential) => credential.authorization_header(),
            Auth::OAuth2(credential) => credential.authorization_header(),
        }
    }

    fn refresh(&self) -> Result<(), AuthError> {
        match self {
            Auth::ApiKey(credential) => credential.refresh(),
            Auth::OAuth2(credential) => credential.refresh(),
        }
    }

    fn refresh_rejected(&self, rejected: &str) -> Result<(), AuthError> {
        match self {
            Auth::ApiKey(credential) => credential.refresh_rejected(rejected),
            Auth::OAuth2(credential) => credential.refresh_rejected(rejected),
        }
    }
}
