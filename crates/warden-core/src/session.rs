// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client-side session state with proactive, single-flighted token rotation.
//!
//! A [`SessionRefreshClient`] holds one access/refresh pair and hands out the
//! access token on demand. When the access token is expired or about to
//! expire, the client exchanges the refresh secret for a fresh pair before
//! returning. Rotation is serialized per session: concurrent callers queue on
//! one exchange instead of racing the store's one-time-use guarantee.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::token::TokenSecret;

// =============================================================================
// Token Pair
// =============================================================================

/// The credential pair a session holds: a signed access token with its expiry
/// and the opaque refresh secret that can replace it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Signed access token, presented as a bearer credential.
    pub access_token: String,
    /// When the access token stops validating.
    pub access_expires_at: DateTime<Utc>,
    /// Opaque secret for the next rotation.
    pub refresh_secret: TokenSecret,
}

impl TokenPair {
    /// Creates a pair.
    pub fn new(
        access_token: impl Into<String>,
        access_expires_at: DateTime<Utc>,
        refresh_secret: TokenSecret,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            access_expires_at,
            refresh_secret,
        }
    }
}

// =============================================================================
// Token Exchanger
// =============================================================================

/// Errors from a refresh exchange attempt.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The endpoint refused the refresh secret.
    ///
    /// Invalid, expired, revoked, and reused secrets all land here; the
    /// endpoint does not say which.
    #[error("Refresh token rejected")]
    Rejected,

    /// The endpoint could not be reached.
    #[error("Token endpoint unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },
}

impl ExchangeError {
    /// Creates an endpoint-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Contract for the token-issuing endpoint, as seen from a client session.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Exchanges a refresh secret for a fresh pair.
    ///
    /// A successful exchange consumes the presented secret server-side; the
    /// returned pair carries its replacement.
    async fn exchange(&self, refresh_secret: &TokenSecret) -> Result<TokenPair, ExchangeError>;
}

// =============================================================================
// Session Error
// =============================================================================

/// Errors surfaced by [`SessionRefreshClient`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// No pair is held. The caller must authenticate first.
    #[error("No authenticated session")]
    NotAuthenticated,

    /// The session was cleared and the caller must log in again.
    #[error("Re-authentication required: {reason}")]
    ReauthenticationRequired {
        /// Why the session ended.
        reason: String,
    },

    /// Rotation exceeded its own deadline. The session was cleared so the
    /// next caller fails fast instead of queuing behind a hung exchange.
    #[error("Token rotation timed out after {timeout:?}")]
    RotationTimeout {
        /// The rotation deadline that elapsed.
        timeout: std::time::Duration,
    },
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// Session Refresh Client
// =============================================================================

/// Holds a session's token pair and rotates it on demand.
///
/// # Concurrency
///
/// All access goes through one async mutex. A caller that decides to rotate
/// holds the lock across the exchange, so every concurrent caller waits and
/// then re-checks the stored pair: they find the fresh one and return it
/// without touching the endpoint. One rotation per expiry, regardless of
/// caller count.
///
/// # Example
///
/// ```rust,ignore
/// use warden_core::session::{SessionRefreshClient, TokenPair};
///
/// let session = SessionRefreshClient::new(exchanger);
/// session.establish(pair_from_login).await;
///
/// // Transparently rotates when the held token is stale.
/// let token = session.get_valid_access_token().await?;
/// ```
pub struct SessionRefreshClient {
    exchanger: Arc<dyn TokenExchanger>,
    state: Mutex<Option<TokenPair>>,
    /// Deadline for one exchange call, independent of any caller's own
    /// request deadline.
    rotation_timeout: std::time::Duration,
    /// Rotate when the access token is within this margin of expiry, so
    /// callers never present a token that dies mid-request.
    refresh_margin: chrono::Duration,
}

impl SessionRefreshClient {
    /// Default rotation deadline: five seconds.
    pub const DEFAULT_ROTATION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    /// Default proactive-refresh margin: thirty seconds.
    pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 30;

    /// Creates a client with no session established.
    pub fn new(exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self {
            exchanger,
            state: Mutex::new(None),
            rotation_timeout: Self::DEFAULT_ROTATION_TIMEOUT,
            refresh_margin: chrono::Duration::seconds(Self::DEFAULT_REFRESH_MARGIN_SECS),
        }
    }

    /// Sets the rotation deadline.
    pub fn with_rotation_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.rotation_timeout = timeout;
        self
    }

    /// Sets the proactive-refresh margin.
    pub fn with_refresh_margin(mut self, margin: chrono::Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Installs the pair obtained from a fresh login.
    pub async fn establish(&self, pair: TokenPair) {
        let mut state = self.state.lock().await;
        *state = Some(pair);
    }

    /// Drops the held pair, if any.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        *state = None;
    }

    /// Returns `true` if a pair is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Returns an access token that will outlive the refresh margin.
    ///
    /// Returns the held token unchanged when it is still comfortably valid.
    /// Otherwise exchanges the refresh secret and replaces the whole pair in
    /// one assignment, so the session never holds a new access token next to
    /// a consumed refresh secret. Any exchange failure clears the session;
    /// the caller's only recourse is a fresh login.
    pub async fn get_valid_access_token(&self) -> SessionResult<String> {
        let mut state = self.state.lock().await;

        // Re-checked under the lock: a caller that queued behind a rotation
        // sees the pair that rotation installed.
        let pair = match state.as_ref() {
            Some(pair) => pair,
            None => return Err(SessionError::NotAuthenticated),
        };
        if !self.needs_rotation(pair) {
            return Ok(pair.access_token.clone());
        }

        debug!(expires_at = %pair.access_expires_at, "access token stale, rotating");
        let exchanged = tokio::time::timeout(
            self.rotation_timeout,
            self.exchanger.exchange(&pair.refresh_secret),
        )
        .await;

        match exchanged {
            Ok(Ok(fresh)) => {
                let token = fresh.access_token.clone();
                *state = Some(fresh);
                Ok(token)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "token rotation failed, clearing session");
                *state = None;
                Err(SessionError::ReauthenticationRequired {
                    reason: e.to_string(),
                })
            }
            Err(_elapsed) => {
                warn!(timeout = ?self.rotation_timeout, "token rotation timed out, clearing session");
                *state = None;
                Err(SessionError::RotationTimeout {
                    timeout: self.rotation_timeout,
                })
            }
        }
    }

    fn needs_rotation(&self, pair: &TokenPair) -> bool {
        Utc::now() + self.refresh_margin >= pair.access_expires_at
    }
}

impl std::fmt::Debug for SessionRefreshClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRefreshClient")
            .field("rotation_timeout", &self.rotation_timeout)
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Exchanger returning fixed-lifetime pairs and counting calls.
    struct CountingExchanger {
        calls: AtomicUsize,
        ttl: chrono::Duration,
        fail: bool,
        delay: Option<std::time::Duration>,
    }

    impl CountingExchanger {
        fn new(ttl: chrono::Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                ttl,
                fail: false,
                delay: None,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(chrono::Duration::hours(1))
            }
        }

        fn slow(delay: std::time::Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new(chrono::Duration::hours(1))
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenExchanger for CountingExchanger {
        async fn exchange(&self, _refresh_secret: &TokenSecret) -> Result<TokenPair, ExchangeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ExchangeError::Rejected);
            }
            Ok(TokenPair::new(
                format!("access-{call}"),
                Utc::now() + self.ttl,
                TokenSecret::from_presented(format!("refresh-{call}")),
            ))
        }
    }

    fn fresh_pair() -> TokenPair {
        TokenPair::new(
            "access-initial",
            Utc::now() + chrono::Duration::hours(1),
            TokenSecret::from_presented("refresh-initial"),
        )
    }

    fn stale_pair() -> TokenPair {
        TokenPair::new(
            "access-stale",
            Utc::now() - chrono::Duration::seconds(1),
            TokenSecret::from_presented("refresh-stale"),
        )
    }

    #[tokio::test]
    async fn test_no_session_yields_not_authenticated() {
        let exchanger = Arc::new(CountingExchanger::new(chrono::Duration::hours(1)));
        let session = SessionRefreshClient::new(exchanger);

        let err = session.get_valid_access_token().await.unwrap_err();
        assert!(matches!(err, SessionError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_valid_token_is_returned_without_exchange() {
        let exchanger = Arc::new(CountingExchanger::new(chrono::Duration::hours(1)));
        let session = SessionRefreshClient::new(Arc::clone(&exchanger) as Arc<dyn TokenExchanger>);
        session.establish(fresh_pair()).await;

        let token = session.get_valid_access_token().await.unwrap();
        assert_eq!(token, "access-initial");
        assert_eq!(exchanger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_rotates_transparently() {
        let exchanger = Arc::new(CountingExchanger::new(chrono::Duration::hours(1)));
        let session = SessionRefreshClient::new(Arc::clone(&exchanger) as Arc<dyn TokenExchanger>);
        session.establish(stale_pair()).await;

        let token = session.get_valid_access_token().await.unwrap();
        assert_eq!(token, "access-0");
        assert_eq!(exchanger.call_count(), 1);

        // The replacement pair serves subsequent calls without rotating again.
        let token = session.get_valid_access_token().await.unwrap();
        assert_eq!(token, "access-0");
        assert_eq!(exchanger.call_count(), 1);
    }

    #[tokio::test]
    async fn test_soon_to_expire_token_rotates_proactively() {
        let exchanger = Arc::new(CountingExchanger::new(chrono::Duration::hours(1)));
        let session = SessionRefreshClient::new(Arc::clone(&exchanger) as Arc<dyn TokenExchanger>);

        // Unexpired, but inside the default thirty-second margin.
        session
            .establish(TokenPair::new(
                "access-soon",
                Utc::now() + chrono::Duration::seconds(5),
                TokenSecret::from_presented("refresh-soon"),
            ))
            .await;

        let token = session.get_valid_access_token().await.unwrap();
        assert_eq!(token, "access-0");
        assert_eq!(exchanger.call_count(), 1);
    }

    #[tokio::test]
    async fn test_exchange_failure_clears_session() {
        let exchanger = Arc::new(CountingExchanger::failing());
        let session = SessionRefreshClient::new(exchanger);
        session.establish(stale_pair()).await;

        let err = session.get_valid_access_token().await.unwrap_err();
        assert!(matches!(err, SessionError::ReauthenticationRequired { .. }));
        assert!(!session.is_authenticated().await);

        // The next caller fails fast instead of retrying the dead secret.
        let err = session.get_valid_access_token().await.unwrap_err();
        assert!(matches!(err, SessionError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_slow_exchange_times_out_and_clears_session() {
        let exchanger = Arc::new(CountingExchanger::slow(std::time::Duration::from_secs(60)));
        let session = SessionRefreshClient::new(exchanger)
            .with_rotation_timeout(std::time::Duration::from_millis(50));
        session.establish(stale_pair()).await;

        let err = session.get_valid_access_token().await.unwrap_err();
        assert!(matches!(err, SessionError::RotationTimeout { .. }));
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_rotation() {
        let exchanger = Arc::new(CountingExchanger::new(chrono::Duration::hours(1)));
        let session = Arc::new(SessionRefreshClient::new(
            Arc::clone(&exchanger) as Arc<dyn TokenExchanger>
        ));
        session.establish(stale_pair()).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let session = Arc::clone(&session);
            handles.push(tokio::spawn(
                async move { session.get_valid_access_token().await },
            ));
        }

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(exchanger.call_count(), 1);
        assert!(tokens.iter().all(|t| t == "access-0"));
    }
}
