//! Credential lookup.
//!
//! The upstream key is resolved once per request through a
//! [`CredentialSource`] instead of being read from ambient state at the
//! call site, so tests can inject fake keys.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Supplies the upstream credential.
pub trait CredentialSource: Send + Sync + 'static {
    /// Current credential, if any. Blank values are returned as-is; the
    /// caller decides whether they are usable.
    fn credential(&self) -> Option<SecretString>;
}

/// Reads the credential from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialSource for EnvCredential {
    fn credential(&self) -> Option<SecretString> {
        std::env::var(&self.var).ok().map(SecretString::new)
    }
}

/// Fixed credential, mainly for tests and one-shot CLI use.
#[derive(Clone)]
pub struct StaticCredential(Option<String>);

impl StaticCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Some(key.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.0.is_some() { "[REDACTED]" } else { "None" };
        f.debug_tuple("StaticCredential").field(&state).finish()
    }
}

impl CredentialSource for StaticCredential {
    fn credential(&self) -> Option<SecretString> {
        self.0.clone().map(SecretString::new)
    }
}

/// Resolve a usable credential: present and not blank.
pub fn resolve(source: &dyn CredentialSource) -> Option<SecretString> {
    source
        .credential()
        .filter(|key| !key.expose_secret().trim().is_empty())
}
