//! services/api/src/adapters/identity.rs
//!
//! This module contains the adapter for the external identity provider.
//! It implements the `IdentityService` port: an opaque session id from the
//! login redirect is exchanged for the user's profile and a session token.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tutor_core::domain::IdentityProfile;
use tutor_core::ports::{IdentityService, PortError, PortResult};

/// The provider is expected to answer within this window; a timeout is
/// treated like any other transport failure.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct SessionDataResponse {
    email: String,
    name: String,
    picture: Option<String>,
    session_token: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `IdentityService` port over plain HTTP.
#[derive(Clone)]
pub struct HttpIdentityAdapter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIdentityAdapter {
    /// Creates a new `HttpIdentityAdapter` for the given session-data endpoint.
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for HttpIdentityAdapter {
    /// Exchanges the opaque session id for the caller's profile.
    ///
    /// A non-success status from the provider means the session id was not
    /// accepted and surfaces as `InvalidRequest`, which handlers translate
    /// to a 400.
    async fn exchange_session(&self, session_id: &str) -> PortResult<IdentityProfile> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("X-Session-ID", session_id)
            .timeout(EXCHANGE_TIMEOUT)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortError::InvalidRequest("Invalid session ID".to_string()));
        }

        let data: SessionDataResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(IdentityProfile {
            email: data.email,
            name: data.name,
            picture: data.picture,
            session_token: data.session_token,
        })
    }
}
