//! Bearer tokens from a session provider.

use crate::error::AuthError;

/// Source of the bearer token attached to API requests.
///
/// `Ok(None)` means there is no session and requests go out unauthenticated.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<Option<String>, AuthError>;
}

/// A fixed token, e.g. from `NOMINA_TOKEN`.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<Option<String>, AuthError> {
        let token = self.0.trim();
        if token.is_empty() {
            Err(AuthError::NoSession)
        } else {
            Ok(Some(token.to_string()))
        }
    }
}

/// Never authenticates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait::async_trait]
impl TokenProvider for Anonymous {
    async fn token(&self) -> Result<Option<String>, AuthError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_trims() {
        let t = StaticToken(" abc ".into()).token().await.unwrap();
        assert_eq!(t.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn blank_static_token_is_no_session() {
        let err = StaticToken("  ".into()).token().await.unwrap_err();
        assert_eq!(err, AuthError::NoSession);
    }

    #[tokio::test]
    async fn anonymous_has_no_token() {
        assert_eq!(Anonymous.token().await.unwrap(), None);
    }
}
