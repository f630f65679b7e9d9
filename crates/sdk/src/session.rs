//! Session state and the host-app settings store.
//!
//! The SDK keeps two kinds of user state: short-lived session data
//! fetched from the service (cached with a TTL), and a handful of
//! values that survive app restarts (browser id, tokens). Persistence
//! is the host app's concern, exposed through [`SettingsStore`]; the
//! bundled [`InMemorySettings`] is for tests and apps that do not
//! persist anything.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Session data returned by the service's session endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    /// Short-lived access token.
    pub access_token: Option<String>,
    /// Long-lived auth token identifying the logged-in user, if any.
    pub auth_token: Option<String>,
    /// Whether the user has body measurements on file, gating
    /// body-profile fetches.
    pub has_body_profile: bool,
}

/// Keys the SDK persists through the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    /// Stable per-install identifier sent with session requests.
    BrowserId,
    /// Auth token for the logged-in user.
    AuthToken,
    /// Most recent access token.
    AccessToken,
}

/// Simple key/value storage for the few values that survive app
/// restarts. Implementations must be safe to call from any task.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a stored value.
    async fn get(&self, key: SettingsKey) -> Option<String>;

    /// Write a value, or remove it when `value` is `None`.
    async fn set(&self, key: SettingsKey, value: Option<String>);
}

/// Non-persistent settings store.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    values: RwLock<HashMap<SettingsKey, String>>,
}

#[async_trait]
impl SettingsStore for InMemorySettings {
    async fn get(&self, key: SettingsKey) -> Option<String> {
        self.values.read().await.get(&key).cloned()
    }

    async fn set(&self, key: SettingsKey, value: Option<String>) {
        let mut values = self.values.write().await;
        match value {
            Some(value) => {
                values.insert(key, value);
            }
            None => {
                values.remove(&key);
            }
        }
    }
}
