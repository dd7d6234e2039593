//! Credentials: static API keys and the OAuth2 authorization-code flow.

pub mod credential;
pub mod oauth;
pub mod scope;

pub use credential::{ApiKeyCredential, Auth, Credential};
pub use oauth::{generate_state, parse_token_response, OAuth2Credential, TokenSet};
pub use scope::{parse_scopes, scopes_to_string, Scope, UnknownScope};
