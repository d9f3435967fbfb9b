//! Basic-Auth credential providers.
//!
//! A [`CredentialProvider`] is asked for credentials on every query. Wrap a
//! slow provider (a password manager, a vault lookup) in [`CachedCredentials`]
//! to control how often it is actually consulted.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use clusterwatch_adapters::credentials::{
//!     CachedCredentials, CredentialProvider, RefreshPolicy, StaticCredentials,
//! };
//!
//! let provider = CachedCredentials::new(
//!     StaticCredentials::new("agent", "s3cret"),
//!     RefreshPolicy::Ttl(Duration::from_secs(300)),
//! );
//!
//! let creds = provider.credentials().unwrap();
//! assert_eq!(creds.username, "agent");
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::AdapterError;

/// A username/password pair for HTTP Basic-Auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of Basic-Auth credentials.
///
/// The Prometheus client calls providers on tokio's blocking pool, so an
/// implementation may block (e.g. on a password-manager lookup).
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Fetch the current credentials.
    fn credentials(&self) -> Result<Credentials, AdapterError>;
}

/// A fixed username/password pair.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Credentials::new(username, password))
    }
}

impl From<Credentials> for StaticCredentials {
    fn from(creds: Credentials) -> Self {
        Self(creds)
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials, AdapterError> {
        Ok(self.0.clone())
    }
}

/// Reads credentials from two environment variables on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    username_var: String,
    password_var: String,
}

impl EnvCredentials {
    /// Default variable holding the username.
    pub const USERNAME_VAR: &'static str = "PROMETHEUS_USERNAME";
    /// Default variable holding the password.
    pub const PASSWORD_VAR: &'static str = "PROMETHEUS_PASSWORD";

    pub fn new(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(Self::USERNAME_VAR, Self::PASSWORD_VAR)
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Credentials, AdapterError> {
        let read = |var: &str| {
            std::env::var(var)
                .map_err(|e| AdapterError::Credentials(format!("{}: {}", var, e)))
        };
        Ok(Credentials::new(
            read(&self.username_var)?,
            read(&self.password_var)?,
        ))
    }
}

/// When a [`CachedCredentials`] goes back to its inner provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Ask the inner provider on every call (no caching).
    #[default]
    EveryRequest,
    /// Reuse credentials until they are older than the given duration.
    Ttl(Duration),
    /// Fetch once and reuse forever.
    Never,
}

/// Caches another provider's credentials according to a [`RefreshPolicy`].
///
/// Failed fetches are never cached; the next call tries again.
#[derive(Debug)]
pub struct CachedCredentials<P> {
    inner: P,
    policy: RefreshPolicy,
    cached: Mutex<Option<(Credentials, Instant)>>,
}

impl<P: CredentialProvider> CachedCredentials<P> {
    pub fn new(inner: P, policy: RefreshPolicy) -> Self {
        Self {
            inner,
            policy,
            cached: Mutex::new(None),
        }
    }

    /// Drop any cached credentials so the next call refetches.
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }

    fn is_fresh(&self, fetched_at: Instant) -> bool {
        match self.policy {
            RefreshPolicy::EveryRequest => false,
            RefreshPolicy::Ttl(ttl) => fetched_at.elapsed() < ttl,
            RefreshPolicy::Never => true,
        }
    }
}

impl<P: CredentialProvider> CredentialProvider for CachedCredentials<P> {
    fn credentials(&self) -> Result<Credentials, AdapterError> {
        let mut cached = self.cached.lock();

        if let Some((creds, fetched_at)) = cached.as_ref() {
            if self.is_fresh(*fetched_at) {
                return Ok(creds.clone());
            }
        }

        let creds = self.inner.credentials()?;
        tracing::debug!(username = %creds.username, "Fetched credentials");
        if self.policy != RefreshPolicy::EveryRequest {
            *cached = Some((creds.clone(), Instant::now()));
        }
        Ok(creds)
    }
}
