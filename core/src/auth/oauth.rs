//! OAuth2 authorization-code flow against WakaTime.
//!
//! # Design
//! `OAuth2Credential` owns the client registration and the mutable token
//! state. Tokens change only through [`exchange_code`] and
//! [`refresh_access_token`], which replace the access token, refresh token,
//! and lifetime together under one lock. Expiry is not tracked here; the
//! dispatcher reacts to a 401 by calling [`Credential::refresh_rejected`]
//! with the header it sent.
//!
//! Code exchange and refresh are serialized by a dedicated lock held across
//! the token round-trip. A rejected header that no longer matches the stored
//! access token means someone already replaced it, so the refresh is skipped
//! and requests racing on a 401 spend one refresh token between them.
//!
//! [`exchange_code`]: OAuth2Credential::exchange_code
//! [`refresh_access_token`]: OAuth2Credential::refresh_access_token

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::credential::Credential;
use super::scope::{scopes_to_string, Scope};
use crate::config::ClientConfig;
use crate::error::AuthError;
use crate::http::{HttpRequest, HttpResponse};
use crate::sync::MutexExt;
use crate::transport::{Transport, UreqTransport};

/// Bytes of randomness behind a state token.
const STATE_ENTROPY_BYTES: usize = 40;

/// Tokens issued by the token endpoint.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Default)]
struct TokenState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

impl TokenState {
    fn replace(&mut self, tokens: TokenSet) {
        self.access_token = Some(tokens.access_token);
        self.refresh_token = tokens.refresh_token;
        self.expires_in = tokens.expires_in;
    }
}

/// An OAuth2 client registration plus the tokens it has acquired.
pub struct OAuth2Credential {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: Option<String>,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    tokens: Mutex<TokenState>,
    refresh_lock: Mutex<()>,
}

impl OAuth2Credential {
    /// An empty credential talking to `config.base_url` over ureq.
    pub fn new(
        config: &ClientConfig,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: None,
            config: config.clone(),
            transport: Arc::new(UreqTransport::new(config)),
            tokens: Mutex::new(TokenState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_scopes(mut self, scopes: &[Scope]) -> Self {
        self.set_scopes(scopes);
        self
    }

    /// Use a pre-joined scope string as-is.
    pub fn with_raw_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Resume from tokens issued earlier, e.g. loaded by the embedding app.
    pub fn with_tokens(self, access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        self.tokens.lock_or_recover().replace(TokenSet {
            access_token: access_token.into(),
            refresh_token,
            expires_in: None,
        });
        self
    }

    /// An empty scope list clears the scope.
    pub fn set_scopes(&mut self, scopes: &[Scope]) {
        self.scope = if scopes.is_empty() {
            None
        } else {
            Some(scopes_to_string(scopes))
        };
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens.lock_or_recover().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.lock_or_recover().refresh_token.clone()
    }

    /// Lifetime in seconds reported by the last token response.
    pub fn expires_in(&self) -> Option<u64> {
        self.tokens.lock_or_recover().expires_in
    }

    /// The URL to send the user to. `state` is echoed back on the redirect.
    pub fn authorization_url(&self, state: Option<&str>) -> String {
        let mut url = self.config.authorize_url();
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri);
        if let Some(state) = state {
            query.append_pair("state", state);
        }
        if let Some(scope) = &self.scope {
            query.append_pair("scope", scope);
        }
        url.push('?');
        url.push_str(&query.finish());
        url
    }

    /// Trade an authorization code for tokens. Returns the new access token.
    pub fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let _guard = self.refresh_lock.lock_or_recover();
        let request = HttpRequest::post_form(
            self.config.token_url(),
            &[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ],
        );
        let tokens = self.request_tokens(&request)?;
        info!(client_id = %self.client_id, "authorization code exchanged");
        Ok(self.store(tokens))
    }

    /// Obtain a fresh access token with the stored refresh token.
    pub fn refresh_access_token(&self) -> Result<String, AuthError> {
        let _guard = self.refresh_lock.lock_or_recover();
        self.refresh_locked()
    }

    fn refresh_locked(&self) -> Result<String, AuthError> {
        let refresh_token = self
            .tokens
            .lock_or_recover()
            .refresh_token
            .clone()
            .ok_or(AuthError::NoRefreshToken)?;
        let request = HttpRequest::post_form(
            self.config.token_url(),
            &[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ],
        );
        let tokens = self.request_tokens(&request)?;
        debug!(client_id = %self.client_id, "access token refreshed");
        Ok(self.store(tokens))
    }

    /// Revoke a single token.
    pub fn revoke_token(&self, token: &str) -> Result<bool, AuthError> {
        self.revoke(Some(token), false, None)
    }

    /// Revoke every token this app holds for one user.
    pub fn revoke_all_user_tokens(&self, user_id: &str) -> Result<bool, AuthError> {
        self.revoke(None, true, Some(user_id))
    }

    /// Revoke every token issued to this app.
    pub fn revoke_all_app_tokens(&self) -> Result<bool, AuthError> {
        self.revoke(None, true, None)
    }

    /// `Ok(true)` iff the revoke endpoint answered 2xx. WakaTime answers 200
    /// for tokens that were already revoked.
    pub fn revoke(&self, token: Option<&str>, all: bool, user_id: Option<&str>) -> Result<bool, AuthError> {
        let mut fields = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(token) = token {
            fields.push(("token", token));
        }
        if all {
            fields.push(("all", "true"));
        }
        if let Some(user_id) = user_id {
            fields.push(("user_id", user_id));
        }
        let request = HttpRequest::post_form(self.config.revoke_url(), &fields);
        let response = self.transport.execute(&request)?;
        if !response.is_success() {
            warn!(status = response.status, "revoke rejected");
        }
        Ok(response.is_success())
    }

    fn request_tokens(&self, request: &HttpRequest) -> Result<TokenSet, AuthError> {
        let response = self.transport.execute(request)?;
        if !response.is_success() {
            warn!(status = response.status, "token endpoint rejected request");
            return Err(AuthError::TokenEndpoint {
                status: response.status,
                body: response.body,
            });
        }
        parse_token_response(&response)
    }

    fn store(&self, tokens: TokenSet) -> String {
        let access_token = tokens.access_token.clone();
        self.tokens.lock_or_recover().replace(tokens);
        access_token
    }
}

impl Credential for OAuth2Credential {
    fn authorization_header(&self) -> Result<String, AuthError> {
        self.tokens
            .lock_or_recover()
            .access_token
            .as_ref()
            .map(|token| format!("Bearer {token}"))
            .ok_or(AuthError::NotAuthenticated)
    }

    fn refresh(&self) -> Result<(), AuthError> {
        self.refresh_access_token().map(|_| ())
    }

    fn refresh_rejected(&self, rejected: &str) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock_or_recover();
        // Someone replaced the rejected token after it was sent.
        if self.authorization_header().ok().as_deref() != Some(rejected) {
            debug!("rejected access token already replaced");
            return Ok(());
        }
        self.refresh_locked().map(|_| ())
    }
}

impl fmt::Debug for OAuth2Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = self.tokens.lock_or_recover();
        f.debug_struct("OAuth2Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("has_access_token", &tokens.access_token.is_some())
            .field("has_refresh_token", &tokens.refresh_token.is_some())
            .field("expires_in", &tokens.expires_in)
            .finish()
    }
}

/// Decode a form-encoded token endpoint body.
pub fn parse_token_response(response: &HttpResponse) -> Result<TokenSet, AuthError> {
    let fields = parse_form(&response.body);
    let access_token = fields
        .get("access_token")
        .filter(|token| !token.is_empty())
        .cloned()
        .ok_or_else(|| AuthError::MalformedTokenResponse("missing access_token".to_string()))?;
    let expires_in = fields
        .get("expires_in")
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|_| {
                AuthError::MalformedTokenResponse(format!("expires_in is not an integer: {raw}"))
            })
        })
        .transpose()?;
    Ok(TokenSet {
        access_token,
        refresh_token: fields.get("refresh_token").cloned(),
        expires_in,
    })
}

/// Split on `&`, then on the first `=`, percent-decoding both halves.
fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// An opaque anti-CSRF value: SHA-256 over 40 random bytes, lowercase hex.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(Sha256::digest(bytes))
}
