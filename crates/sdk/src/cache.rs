//! Process-wide expiring cache for session data.
//!
//! Backed by `moka` with a cache-wide TTL. Loads go through
//! `try_get_with`, so concurrent callers for the same key coalesce
//! into a single fetch; in the rare race where two fetches do run, the
//! cached value is last-write-wins consistent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::api::GatewayError;
use crate::session::SessionData;

/// Logical resource the cache is keyed by.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) enum CacheKey {
    Session,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub(crate) enum CacheValue {
    Session(SessionData),
}

/// TTL cache for remote resources that are expensive to refetch.
#[derive(Clone)]
pub(crate) struct ExpiringCache {
    inner: Cache<CacheKey, CacheValue>,
}

impl ExpiringCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(16).time_to_live(ttl).build(),
        }
    }

    /// Get the cached session, fetching through `init` when missing or
    /// expired. Concurrent callers share one fetch.
    pub(crate) async fn session_with<F>(
        &self,
        init: F,
    ) -> Result<SessionData, Arc<GatewayError>>
    where
        F: Future<Output = Result<SessionData, GatewayError>>,
    {
        let value = self
            .inner
            .try_get_with(CacheKey::Session, async { init.await.map(CacheValue::Session) })
            .await?;
        let CacheValue::Session(session) = value;
        Ok(session)
    }

    /// Drop the cached session so the next read refetches (the
    /// "TTL = 0" forced-update path).
    pub(crate) async fn invalidate_session(&self) {
        self.inner.invalidate(&CacheKey::Session).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session(token: &str) -> SessionData {
        SessionData {
            access_token: Some(token.to_string()),
            auth_token: None,
            has_body_profile: false,
        }
    }

    #[tokio::test]
    async fn test_second_read_hits_cache() {
        let cache = ExpiringCache::new(Duration::from_secs(60));
        let fetches = AtomicUsize::new(0);

        for _ in 0..2 {
            let result = cache
                .session_with(async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(session("a"))
                })
                .await
                .expect("session");
            assert_eq!(result.access_token.as_deref(), Some("a"));
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = ExpiringCache::new(Duration::from_secs(60));

        let first = cache.session_with(async { Ok(session("a")) }).await;
        assert_eq!(
            first.expect("session").access_token.as_deref(),
            Some("a")
        );

        cache.invalidate_session().await;

        let second = cache.session_with(async { Ok(session("b")) }).await;
        assert_eq!(
            second.expect("session").access_token.as_deref(),
            Some("b")
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = ExpiringCache::new(Duration::from_secs(60));

        let failed = cache
            .session_with(async {
                Err(GatewayError::Api {
                    status: 500,
                    message: "boom".to_string(),
                })
            })
            .await;
        assert!(failed.is_err());

        let recovered = cache.session_with(async { Ok(session("a")) }).await;
        assert!(recovered.is_ok());
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let cache = ExpiringCache::new(Duration::from_millis(20));

        let _ = cache.session_with(async { Ok(session("a")) }).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let refetched = cache.session_with(async { Ok(session("b")) }).await;
        assert_eq!(
            refetched.expect("session").access_token.as_deref(),
            Some("b")
        );
    }
}
