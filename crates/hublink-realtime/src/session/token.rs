//! Bearer token with optional expiry.

use std::fmt;

use chrono::{DateTime, Utc};

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    /// A token without a known expiry.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// A token that expires at `expires_at`.
    pub fn with_expiry(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(expires_at),
        }
    }

    /// The raw token.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Expiry instant, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether the token is expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_debug_redacts_value() {
        let token = SessionToken::new("eyJhbGciOi.secret");
        let printed = format!("{token:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let token = SessionToken::with_expiry("t", now + Duration::minutes(5));
        assert!(!token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::minutes(5)));
        assert!(!SessionToken::new("t").is_expired());
    }
}
