//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port with its own state,
//! then drives the client over real HTTP through `UreqTransport`. The shared
//! `Db` handle lets tests inspect what the server saw.

use std::net::SocketAddr;
use std::time::Duration;

use mock_server::{Db, API_KEY, AUTH_CODE, CLIENT_ID, CLIENT_SECRET, USERNAME};
use wakatime_core::{
    ApiErrorKind, Auth, AuthError, ClientConfig, Error, HttpRequest, NewHeartbeat, OAuth2Credential,
    Transport, UreqTransport, WakaTimeClient, CURRENT_USER,
};

fn start_server() -> (SocketAddr, Db) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let db = Db::default();
    let server_db = db.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_state(listener, server_db).await
        })
        .unwrap();
    });

    (addr, db)
}

fn config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::default().with_base_url(&format!("http://{addr}"))
}

/// Hit a `/mock` control route directly.
fn control(config: &ClientConfig, path: &str, fields: &[(&str, &str)]) {
    let request = HttpRequest::post_form(format!("{}{path}", config.base_url), fields);
    let response = UreqTransport::new(config).execute(&request).unwrap();
    assert_eq!(response.status, 204, "control route {path}");
}

fn oauth_client(config: &ClientConfig) -> WakaTimeClient {
    let credential = OAuth2Credential::new(config, CLIENT_ID, CLIENT_SECRET, "http://localhost/callback");
    credential.exchange_code(AUTH_CODE).unwrap();
    WakaTimeClient::new(config, credential)
}

fn oauth(client: &WakaTimeClient) -> &OAuth2Credential {
    client.credential().as_oauth2().unwrap()
}

#[test]
fn api_key_reads_current_user() {
    let (addr, db) = start_server();
    let client = WakaTimeClient::new(&config(addr), Auth::api_key(API_KEY));

    let user = client.user(CURRENT_USER).unwrap();
    assert_eq!(user["data"]["username"], USERNAME);

    let seen = db.blocking_read().last_authorization.clone().unwrap();
    assert!(seen.starts_with("Basic "));
}

#[test]
fn unknown_user_is_not_found() {
    let (addr, _db) = start_server();
    let client = WakaTimeClient::new(&config(addr), Auth::api_key(API_KEY));

    let err = client.user("somebody-else").unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::NotFound));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn wrong_api_key_is_unauthorized_without_refresh() {
    let (addr, db) = start_server();
    let client = WakaTimeClient::new(&config(addr), Auth::api_key("waka_wrong"));

    let err = client.meta().unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::Unauthorized));

    // Refreshing an API key is a no-op, so the retry goes out unchanged.
    let state = db.blocking_read();
    assert_eq!(state.api_requests, 2);
    assert_eq!(state.token_requests, 0);
}

#[test]
fn code_exchange_authorizes_bearer_requests() {
    let (addr, db) = start_server();
    let client = oauth_client(&config(addr));

    assert_eq!(oauth(&client).expires_in(), Some(3600));
    assert!(oauth(&client).refresh_token().unwrap().starts_with("rt_"));

    let today = client.status_bar_today(CURRENT_USER).unwrap();
    assert_eq!(today["data"]["grand_total"]["total_seconds"], 3900.0);

    let token = oauth(&client).access_token().unwrap();
    let state = db.blocking_read();
    assert_eq!(state.last_authorization.as_deref(), Some(format!("Bearer {token}").as_str()));
    assert_eq!(state.token_requests, 1);
}

#[test]
fn bad_authorization_code_is_rejected() {
    let (addr, _db) = start_server();
    let credential = OAuth2Credential::new(&config(addr), CLIENT_ID, CLIENT_SECRET, "http://localhost/callback");

    let err = credential.exchange_code("not-the-code").unwrap_err();
    match err {
        AuthError::TokenEndpoint { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(credential.access_token().is_none());
}

#[test]
fn expired_token_is_refreshed_and_request_retried() {
    let (addr, db) = start_server();
    let config = config(addr);
    let client = oauth_client(&config);
    let before = oauth(&client).access_token().unwrap();

    control(&config, "/mock/expire", &[]);
    let goals = client.goals(CURRENT_USER).unwrap();
    assert_eq!(goals["total"], 0);

    let after = oauth(&client).access_token().unwrap();
    assert_ne!(before, after);

    let state = db.blocking_read();
    assert_eq!(state.token_requests, 2);
    assert_eq!(state.api_requests, 2);
    assert_eq!(state.last_authorization.as_deref(), Some(format!("Bearer {after}").as_str()));
}

#[test]
fn unauthorized_after_refresh_is_final() {
    let (addr, db) = start_server();
    let config = config(addr);
    let client = oauth_client(&config);

    control(&config, "/mock/next_status", &[("status", "401"), ("body", "nope")]);
    control(&config, "/mock/next_status", &[("status", "401"), ("body", "still nope")]);

    let err = client.meta().unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::Unauthorized));
    assert!(err.to_string().contains("still nope"));

    let state = db.blocking_read();
    assert_eq!(state.api_requests, 2);
    assert_eq!(state.token_requests, 2);
}

#[test]
fn failed_refresh_surfaces_auth_error() {
    let (addr, db) = start_server();
    let config = config(addr);
    let client = oauth_client(&config);

    // Revoking everything kills the refresh token too.
    assert!(oauth(&client).revoke_all_app_tokens().unwrap());

    let err = client.meta().unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::TokenEndpoint { status: 400, .. })));
    assert_eq!(db.blocking_read().api_requests, 1);
}

#[test]
fn scripted_failures_map_to_kinds_without_retry() {
    let (addr, db) = start_server();
    let config = config(addr);
    let client = WakaTimeClient::new(&config, Auth::api_key(API_KEY));

    control(&config, "/mock/next_status", &[("status", "429"), ("body", "slow down")]);
    let err = client.meta().unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::RateLimited));

    control(&config, "/mock/next_status", &[("status", "500"), ("body", "")]);
    let err = client.meta().unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::ServerError));

    assert_eq!(db.blocking_read().api_requests, 2);
}

#[test]
fn revoke_single_token() {
    let (addr, db) = start_server();
    let client = oauth_client(&config(addr));
    let token = oauth(&client).access_token().unwrap();

    assert!(oauth(&client).revoke_token(&token).unwrap());
    let state = db.blocking_read();
    assert_eq!(state.revoke_requests, 1);
    assert!(!state.access_tokens.contains(&token));
}

#[test]
fn heartbeats_create_bulk_and_list() {
    let (addr, db) = start_server();
    let client = WakaTimeClient::new(&config(addr), Auth::api_key(API_KEY));

    let mut heartbeat = NewHeartbeat::new("src/lib.rs", "file", 1_700_000_000.0);
    heartbeat.language = Some("Rust".to_string());
    let created = client.create_heartbeat(CURRENT_USER, &heartbeat).unwrap();
    assert_eq!(created["data"]["language"], "Rust");

    let batch = vec![
        NewHeartbeat::new("a.rs", "file", 1_700_000_001.0),
        NewHeartbeat::new("b.rs", "file", 1_700_000_002.0),
    ];
    let bulk = client.create_heartbeats_bulk(CURRENT_USER, &batch).unwrap();
    assert_eq!(bulk["responses"][1][1], 201);

    let listed = client.heartbeats(CURRENT_USER, "2023-11-14").unwrap();
    assert_eq!(listed["data"].as_array().unwrap().len(), 3);
    assert_eq!(db.blocking_read().heartbeats[0]["type"], "file");
}

#[test]
fn closed_port_is_network_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = WakaTimeClient::new(&config(addr), Auth::api_key(API_KEY));

    let err = client.meta().unwrap_err();
    assert!(matches!(err, Error::Network(_)), "unexpected {err:?}");
}

#[test]
fn concurrent_unauthorized_requests_share_refresh() {
    let (addr, db) = start_server();
    let config = config(addr);
    let client = oauth_client(&config);

    control(&config, "/mock/expire", &[]);
    std::thread::scope(|s| {
        let workers: Vec<_> = (0..4).map(|_| s.spawn(|| client.meta())).collect();
        for worker in workers {
            // A refresh racing on a spent refresh token would fail with invalid_grant.
            worker.join().unwrap().unwrap();
        }
    });

    // One exchange plus exactly one refresh, however the requests interleave.
    let state = db.blocking_read();
    assert_eq!(state.token_requests, 2);
}

#[test]
fn sub_second_timeout_reaches_the_server() {
    let (addr, db) = start_server();
    let config = config(addr).with_timeout(Duration::from_millis(500));
    assert_eq!(config.timeout(), Duration::from_millis(500));

    let client = WakaTimeClient::new(&config, Auth::api_key(API_KEY));
    let meta = client.meta().unwrap();
    assert!(meta["data"]["ips"].is_object());
    assert_eq!(db.blocking_read().api_requests, 1);
}
