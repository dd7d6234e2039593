//! Signs, sends, and classifies every resource request.
//!
//! # Design
//! `Dispatcher::execute` is the only path to the resource API. One logical
//! call makes at most two round-trips:
//!
//! 1. attach `Authorization` from the credential and send;
//! 2. on 401, hand the rejected header back to the credential for one
//!    refresh, re-sign, and send again.
//!
//! The second response is final whatever its status. Transport failures and
//! refresh failures propagate unchanged. The final status is then mapped onto
//! [`ApiErrorKind`]; only 200, 201, and 202 count as success.
//!
//! [`ApiErrorKind`]: crate::error::ApiErrorKind

use tracing::{debug, warn};

use crate::auth::Credential;
use crate::error::{ApiError, Error};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

pub const AUTHORIZATION: &str = "Authorization";

#[derive(Debug)]
pub struct Dispatcher<C, T> {
    credential: C,
    transport: T,
}

impl<C: Credential, T: Transport> Dispatcher<C, T> {
    pub fn new(credential: C, transport: T) -> Self {
        Self {
            credential,
            transport,
        }
    }

    pub fn credential(&self) -> &C {
        &self.credential
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` with credentials attached and return the success
    /// response, or the classified failure.
    pub fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let sent = self.credential.authorization_header()?;
        request.set_header(AUTHORIZATION, sent.as_str());
        debug!(method = request.method.as_str(), url = %request.url, "dispatching");
        let mut response = self.transport.execute(&request)?;

        if response.status == 401 {
            warn!(url = %request.url, "request unauthorized; refreshing credential");
            self.credential.refresh_rejected(&sent)?;
            request.set_header(AUTHORIZATION, self.credential.authorization_header()?);
            response = self.transport.execute(&request)?;
        }

        classify(response)
    }
}

/// Map a final response onto success or a typed `ApiError`.
pub fn classify(response: HttpResponse) -> Result<HttpResponse, Error> {
    match response.status {
        200 | 201 | 202 => Ok(response),
        status => {
            debug!(status, "request failed");
            Err(ApiError::from_status(status, response.body).into())
        }
    }
}
