//! SDK configuration supplied by the host application.
//!
//! Configuration is an explicit value passed into [`crate::FitWidget`]
//! at construction. There is no process-wide state; multiple widgets
//! with independent configurations can coexist in one process (and in
//! tests).

use std::time::Duration;

use thiserror::Error;

/// Default time-to-live for cached session data.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Configuration errors reported at widget construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key must not be empty")]
    MissingApiKey,
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Which deployment of the recommendation service to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEnv {
    Production,
    Staging,
    /// Explicit base URL, used by tests and on-premise deployments.
    Custom(String),
}

impl ServiceEnv {
    /// Base URL for the recommendation service, without a trailing
    /// slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        match self {
            Self::Production => "https://api.fitsense.example.com/a/v3".to_string(),
            Self::Staging => "https://staging.fitsense.example.com/a/v3".to_string(),
            Self::Custom(url) => url.trim_end_matches('/').to_string(),
        }
    }
}

/// Widget configuration.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Store API key issued by the recommendation service. This is a
    /// public client key, not a secret.
    pub api_key: String,
    /// Identifier the host app uses for the current shopper, stamped
    /// onto orders and session requests.
    pub external_user_id: Option<String>,
    /// Service deployment to target.
    pub env: ServiceEnv,
    /// BCP-47 language tag for localized widget text.
    pub language: String,
    /// TTL for cached session data.
    pub session_ttl: Duration,
}

impl WidgetConfig {
    /// Create a configuration for the production environment with
    /// default language and TTL.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            external_user_id: None,
            env: ServiceEnv::Production,
            language: "en".to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Set the external user identifier.
    #[must_use]
    pub fn with_external_user_id(mut self, id: impl Into<String>) -> Self {
        self.external_user_id = Some(id.into());
        self
    }

    /// Target a different service deployment.
    #[must_use]
    pub fn with_env(mut self, env: ServiceEnv) -> Self {
        self.env = env;
        self
    }

    /// Set the widget text language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Override the session cache TTL.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the API key is empty or a custom base
    /// URL is not http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if let ServiceEnv::Custom(url) = &self.env
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidBaseUrl(url.clone()));
        }
        Ok(())
    }
}
