pub mod watcher;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{cache::KeyValueStore, error::SessionError};

pub use self::watcher::ExpiryWatcher;

/// Store key holding the serialized rspotify token.
pub const TOKEN_CACHE_KEY: &str = "spotify_token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Session {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Builds a session from an OAuth token. Tokens without an absolute expiry
    /// expire `expires_in` after `now`.
    pub fn from_token(token: &rspotify::Token, now: DateTime<Utc>) -> Self {
        let expires_at = token.expires_at.unwrap_or(now + token.expires_in);
        Session::new(token.access_token.clone(), expires_at)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    pub fn access_token_at(&self, now: DateTime<Utc>) -> Result<&str, SessionError> {
        if self.is_expired_at(now) {
            Err(SessionError::Expired {
                expired_at: self.expires_at,
            })
        } else {
            Ok(&self.access_token)
        }
    }
}

/// Current sign-in state. The generation changes on every sign-in and sign-out,
/// which lets background work detect that the session it started with is gone.
pub struct SessionProvider {
    session: Option<Session>,
    generation: u64,
    store: Arc<dyn KeyValueStore>,
}

impl SessionProvider {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        SessionProvider {
            session: None,
            generation: 0,
            store,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn sign_in(&mut self, session: Session) -> u64 {
        self.generation += 1;
        info!("Signed in, session valid until {}", session.expires_at);
        self.session = Some(session);
        self.generation
    }

    pub async fn sign_out(&mut self) {
        self.generation += 1;
        if self.session.take().is_some() {
            info!("Signed out");
        }
        if let Err(e) = self.store.delete(TOKEN_CACHE_KEY).await {
            warn!("Could not remove cached token: {e}");
        }
    }

    /// The live session, or why there is none.
    pub fn require(&self, now: DateTime<Utc>) -> Result<&Session, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::Missing)?;
        session.access_token_at(now)?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    #[test]
    fn token_readable_only_before_expiry() {
        let now = Utc::now();
        let session = Session::new("tok", now + Duration::minutes(5));
        assert_eq!(session.access_token_at(now), Ok("tok"));
        assert_eq!(
            session.access_token_at(now + Duration::minutes(5)),
            Err(SessionError::Expired {
                expired_at: session.expires_at
            })
        );
    }

    #[test]
    fn remaining_never_negative() {
        let now = Utc::now();
        let session = Session::new("tok", now - Duration::seconds(10));
        assert_eq!(session.remaining(now), Duration::zero());
        let session = Session::new("tok", now + Duration::seconds(10));
        assert_eq!(session.remaining(now), Duration::seconds(10));
    }

    #[test]
    fn from_token_falls_back_to_expires_in() {
        let now = Utc::now();
        let token = rspotify::Token {
            access_token: "abc".to_string(),
            expires_in: Duration::seconds(3600),
            expires_at: None,
            ..Default::default()
        };
        let session = Session::from_token(&token, now);
        assert_eq!(session.access_token, "abc");
        assert_eq!(session.expires_at, now + Duration::seconds(3600));
    }

    #[tokio::test]
    async fn sign_out_bumps_generation_and_drops_cached_token() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_CACHE_KEY, "{}").await.unwrap();
        let mut provider = SessionProvider::new(store.clone());

        let generation = provider.sign_in(Session::new("tok", Utc::now() + Duration::hours(1)));
        assert!(provider.is_signed_in());

        provider.sign_out().await;
        assert!(!provider.is_signed_in());
        assert!(provider.generation() > generation);
        assert_eq!(store.get(TOKEN_CACHE_KEY).await.unwrap(), None);
    }

    #[test]
    fn require_reports_missing_session() {
        let provider = SessionProvider::new(Arc::new(MemoryStore::new()));
        assert_eq!(provider.require(Utc::now()).err(), Some(SessionError::Missing));
    }
}
