//! OAuth 2.0 Authorization Code flow with PKCE, and the bearer token it yields.
//!
//! A [`Token`] is created once from an authorization code and then kept valid
//! by [`Token::validate`], which every authenticated call runs first. The
//! credentials sit behind an async mutex that is held across the refresh
//! request, so concurrent callers that find the token near expiry queue up
//! behind a single refresh and then reuse its result.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Duration, Utc};
use reqwest::{StatusCode, Url};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    config::PlatformConfig,
    error::ClientError,
    transport::{HttpRequest, HttpResponse, Transport},
    types::TokenResponse,
    utils,
};

/// A token is refreshed once it is this close to expiring.
pub const SAFETY_MARGIN: Duration = Duration::seconds(60);

/// PKCE verifier plus the challenge derived from it.
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier = utils::generate_code_verifier();
        let challenge = utils::generate_code_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Builds the URL the user is sent to in order to grant access.
pub fn authorize_url(
    config: &PlatformConfig,
    challenge: &str,
    state: &str,
) -> Result<Url, ClientError> {
    Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_challenge", challenge),
            ("code_challenge_method", "S256"),
            ("scope", config.scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| ClientError::Config(format!("invalid authorize url '{}': {e}", config.auth_url)))
}

/// What the callback handed back, together with what was used to obtain it.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
    pub verifier: String,
    pub redirect_uri: String,
}

/// Point-in-time copy of the credentials held by a [`Token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    /// `true` unless the access token outlives `now` by more than the margin.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + SAFETY_MARGIN >= self.expires_at
    }
}

/// Credentials plus the outcome of the last refresh attempt.
struct Session {
    credentials: Credentials,
    last_failure: Option<ClientError>,
}

/// Bearer token for the Web API that keeps itself valid.
///
/// Holds the current [`Credentials`] behind an async mutex. The lock is held
/// for the whole refresh round trip, so at most one refresh request is in
/// flight per token.
///
/// # Refresh Coalescing
///
/// Callers that queued on the lock while a refresh was running do not send
/// their own request:
/// - If the refresh succeeded they find fresh credentials and return them
/// - If it failed they return the same error, so a rejected refresh token is
///   posted exactly once
///
/// A caller arriving after the failed attempt finished tries again.
pub struct Token {
    session: Mutex<Session>,
    attempts: AtomicU64,
    token_url: String,
    client_id: String,
    transport: Arc<dyn Transport>,
}

impl Token {
    /// Wraps credentials obtained elsewhere.
    ///
    /// # Arguments
    ///
    /// * `credentials` - Access and refresh token with their expiry
    /// * `config` - Supplies the token endpoint and client id used on refresh
    /// * `transport` - HTTP transport for refresh requests
    pub fn new(
        credentials: Credentials,
        config: &PlatformConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            session: Mutex::new(Session {
                credentials,
                last_failure: None,
            }),
            attempts: AtomicU64::new(0),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            transport,
        }
    }

    /// Exchanges an authorization code for the first set of credentials.
    ///
    /// Posts the `authorization_code` grant together with the PKCE verifier
    /// to the token endpoint.
    ///
    /// # Arguments
    ///
    /// * `grant` - Code from the callback, with the verifier and redirect URI
    ///   used to obtain it
    /// * `config` - Token endpoint and client id
    /// * `transport` - HTTP transport, kept for later refreshes
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] if the endpoint does not answer 200, the body
    ///   is malformed, carries no `refresh_token` or an unusable `expires_in`
    /// - [`ClientError::Remote`] if the request could not be completed
    pub async fn exchange(
        grant: &AuthorizationCode,
        config: &PlatformConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let request = HttpRequest::post(&config.token_url).form(&[
            ("code", grant.code.as_str()),
            ("code_verifier", grant.verifier.as_str()),
            ("client_id", config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", grant.redirect_uri.as_str()),
        ]);

        let response = transport.send(request).await?;
        let granted = token_response(&response)?;
        let expires_at = expiry(response.status, granted.expires_in)?;
        let refresh_token = granted.refresh_token.ok_or_else(|| ClientError::Auth {
            status: response.status,
            message: "token response has no refresh_token".to_string(),
        })?;

        debug!(expires_in = granted.expires_in, "authorization code exchanged");

        let credentials = Credentials {
            access_token: granted.access_token,
            refresh_token,
            expires_at,
        };
        Ok(Self::new(credentials, config, transport))
    }

    /// Returns a usable access token, refreshing first if it is about to expire.
    ///
    /// A token counts as about to expire within [`SAFETY_MARGIN`] of
    /// `expires_at`. Concurrent callers share a single refresh, see
    /// [Refresh Coalescing](Token#refresh-coalescing).
    ///
    /// # Returns
    ///
    /// The access token to send as bearer credential.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Auth`] if the refresh was rejected
    /// - [`ClientError::Remote`] if the refresh request could not be completed
    ///
    /// On error the stored credentials are unchanged.
    pub async fn validate(&self) -> Result<String, ClientError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut session = self.session.lock().await;

        if !session.credentials.needs_refresh(Utc::now()) {
            return Ok(session.credentials.access_token.clone());
        }

        // an attempt finished while this caller waited for the lock
        if self.attempts.load(Ordering::Acquire) != seen {
            if let Some(failure) = &session.last_failure {
                return Err(failure.clone());
            }
        }

        self.refresh_locked(&mut session).await?;
        Ok(session.credentials.access_token.clone())
    }

    /// Unconditionally runs the refresh-token grant.
    ///
    /// # Errors
    ///
    /// Same as [`Token::validate`].
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let mut session = self.session.lock().await;
        self.refresh_locked(&mut session).await
    }

    /// Snapshot of the current credentials.
    pub async fn credentials(&self) -> Credentials {
        self.session.lock().await.credentials.clone()
    }

    async fn refresh_locked(&self, session: &mut Session) -> Result<(), ClientError> {
        let result = self.request_refresh(&session.credentials).await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(credentials) => {
                session.credentials = credentials;
                session.last_failure = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                session.last_failure = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn request_refresh(&self, current: &Credentials) -> Result<Credentials, ClientError> {
        debug!(expires_at = %current.expires_at, "refreshing access token");

        let request = HttpRequest::post(&self.token_url).form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", current.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
        ]);

        let response = self.transport.send(request).await?;
        let granted = token_response(&response)?;

        Ok(Credentials {
            access_token: granted.access_token,
            expires_at: expiry(response.status, granted.expires_in)?,
            // refresh tokens rotate, but keep the old one if none is returned
            refresh_token: granted
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone()),
        })
    }
}

fn token_response(response: &HttpResponse) -> Result<TokenResponse, ClientError> {
    if response.status != StatusCode::OK {
        return Err(ClientError::auth(response.status, &response.body));
    }

    serde_json::from_str(&response.body).map_err(|e| ClientError::Auth {
        status: response.status,
        message: format!("malformed token response: {e}"),
    })
}

/// Absolute expiry for a token valid `expires_in` seconds from now.
fn expiry(status: StatusCode, expires_in: i64) -> Result<DateTime<Utc>, ClientError> {
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| ClientError::Auth {
            status,
            message: format!("invalid expires_in {expires_in}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(expires_in: i64) -> Credentials {
        Credentials {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    #[test]
    fn test_needs_refresh_respects_safety_margin() {
        let now = Utc::now();
        let mut c = credentials(0);

        c.expires_at = now + Duration::seconds(61);
        assert!(!c.needs_refresh(now));

        c.expires_at = now + Duration::seconds(60);
        assert!(c.needs_refresh(now));

        c.expires_at = now - Duration::seconds(1);
        assert!(c.needs_refresh(now));
    }

    #[test]
    fn test_authorize_url_carries_pkce_parameters() {
        let config = PlatformConfig::new("client-123");
        let url = authorize_url(&config, "challenge-abc", "state-xyz").unwrap();

        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(get("client_id"), Some("client-123"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("code_challenge"), Some("challenge-abc"));
        assert_eq!(get("code_challenge_method"), Some("S256"));
        assert_eq!(get("state"), Some("state-xyz"));
        assert_eq!(get("redirect_uri"), Some(config.redirect_uri.as_str()));
    }

    #[test]
    fn test_expiry_rejects_out_of_range_lifetime() {
        let err = expiry(StatusCode::OK, i64::MAX).unwrap_err();
        assert!(err.is_auth());
        assert!(expiry(StatusCode::OK, 3600).unwrap() > Utc::now());
    }

    #[test]
    fn test_pkce_challenge_matches_verifier() {
        let pkce = Pkce::generate();
        assert_eq!(pkce.verifier.len(), utils::CODE_VERIFIER_LEN);
        assert_eq!(pkce.challenge, utils::generate_code_challenge(&pkce.verifier));
    }
}
