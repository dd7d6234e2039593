//! Blocking client for the WakaTime API.
//!
//! # Overview
//! Authenticates with a static API key or OAuth2 tokens, sends requests
//! through a single dispatcher, and decodes JSON responses into
//! `serde_json::Value`.
//!
//! # Design
//! - `Credential` is the only thing the dispatcher knows about auth: a header
//!   value and a way to renew it. `Auth` is the enum of WakaTime's schemes.
//! - `Dispatcher::execute` signs the request, retries once after refreshing
//!   on 401, and classifies the final status into `ApiError`.
//! - Requests and responses are plain data (`HttpRequest` / `HttpResponse`);
//!   the network sits behind the `Transport` trait so tests can script it.
//! - `WakaTimeClient` holds the endpoint methods; each one only builds a URL
//!   and an optional JSON body.

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

mod sync;

pub use auth::{generate_state, ApiKeyCredential, Auth, Credential, OAuth2Credential, Scope};
pub use client::{WakaTimeClient, CURRENT_USER};
pub use config::ClientConfig;
pub use dispatcher::Dispatcher;
pub use error::{ApiError, ApiErrorKind, AuthError, Error, NetworkError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    CommitsQuery, DataDumpType, DurationsQuery, ExternalDurationsQuery, InsightsQuery, LeadersQuery,
    NewDataDump, NewExternalDuration, NewHeartbeat, StatsQuery, SummariesQuery,
};
