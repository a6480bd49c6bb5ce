//! Seam to the external session provider that owns credentials.
//!
//! The client never caches a token: it asks the provider once per operation.

use async_trait::async_trait;
use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};
use thiserror::Error;

/// Permission scope a session is established for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    MediaStorage,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::MediaStorage => "https://ucs.ricoh.com/scope/api/udc2",
        }
    }
}

/// Bearer credential for a single request.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Outcome of establishing a session.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub scope: Scope,
    pub access_token: AccessToken,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("wrong usage: use the connect method to get an access token")]
    NotConnected,
    #[error("session provider failed: {0}")]
    Provider(String),
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Establish (or refresh) a session for `scope`.
    async fn session(&self, scope: Scope) -> Result<AuthResult, SessionError>;

    /// Current access token of the established session.
    async fn access_token(&self) -> Result<AccessToken, SessionError>;
}

/// Provider backed by a token obtained elsewhere (environment, CLI flag, tests).
///
/// Tokens are only handed out after [`SessionProvider::session`] has run.
pub struct StaticTokenProvider {
    token: AccessToken,
    connected: AtomicBool,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
            connected: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticTokenProvider {
    async fn session(&self, scope: Scope) -> Result<AuthResult, SessionError> {
        if self.token.secret().is_empty() {
            return Err(SessionError::Provider("empty access token".into()));
        }
        self.connected.store(true, Ordering::Release);
        Ok(AuthResult {
            scope,
            access_token: self.token.clone(),
        })
    }

    async fn access_token(&self) -> Result<AccessToken, SessionError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(self.token.clone())
        } else {
            Err(SessionError::NotConnected)
        }
    }
}
