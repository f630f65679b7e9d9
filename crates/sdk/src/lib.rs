//! Embeddable size-recommendation SDK for e-commerce apps.
//!
//! The SDK answers one question on a product page: "will this fit
//! me?". It checks the viewed product against the recommendation
//! service, pulls the shopper's owned products and body profile, and
//! publishes a combined size recommendation on an event bus the host
//! app renders from.
//!
//! The public surface is [`FitWidget`]: construct one per widget
//! placement with a [`WidgetConfig`], subscribe to its events, and
//! call [`FitWidget::load`] whenever the shopper views a product.
//! Pipeline failures arrive as events (the widget renders fallbacks),
//! not errors; only construction and order submission return
//! [`WidgetError`].
//!
//! ```no_run
//! use fitsense_sdk::{FitWidget, WidgetConfig, WidgetEvent};
//!
//! # async fn run() -> fitsense_sdk::Result<()> {
//! let widget = FitWidget::new(WidgetConfig::new("store-api-key"))?;
//! let mut events = widget.subscribe();
//!
//! widget.load("sku-123").await;
//! while let Ok(event) = events.recv().await {
//!     if let WidgetEvent::SizeRecommendationReady { comparison, .. } = event {
//!         println!("fit score: {:?}", comparison.map(|c| c.fit_score));
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod repository;
pub mod scoring;
pub mod session;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::instrument;

pub use crate::api::{Gateway, GatewayError, HttpGateway, ProductCheck, StoreInfo};
pub use crate::config::{DEFAULT_SESSION_TTL, ConfigError, ServiceEnv, WidgetConfig};
pub use crate::error::{Result, WidgetError};
pub use crate::events::{EventBus, WidgetEvent};
pub use crate::repository::Repository;
pub use crate::session::{InMemorySettings, SessionData, SettingsKey, SettingsStore};
pub use fitsense_core::{
    BodyProfileRecommendedSize, I18nBundle, Order, OrderItem, Product, ProductId, ProductSize,
    ProductType, ProductTypeId, RecommendationKind, SizeComparisonRecommendedSize, StoreId,
    UserBodyProfile,
};

/// The "check the fit" widget.
///
/// One instance per widget placement. All methods take `&self` and are
/// safe to call from any task; results are delivered through the event
/// bus rather than return values, so a slow fetch never blocks the
/// host app's UI.
pub struct FitWidget {
    repository: Arc<Repository>,
}

impl FitWidget {
    /// Create a widget talking to the configured service deployment
    /// over HTTP, with non-persistent settings.
    ///
    /// Host apps that persist the browser id and tokens across
    /// restarts should use [`FitWidget::with_gateway`] and supply
    /// their own [`SettingsStore`].
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: WidgetConfig) -> Result<Self> {
        config.validate()?;
        let gateway = Arc::new(HttpGateway::new(&config)?);
        Ok(Self::with_gateway(
            config,
            gateway,
            Arc::new(InMemorySettings::default()),
        ))
    }

    /// Create a widget with a custom gateway and settings store.
    #[must_use]
    pub fn with_gateway(
        config: WidgetConfig,
        gateway: Arc<dyn Gateway>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            repository: Arc::new(Repository::new(config, gateway, settings)),
        }
    }

    /// Subscribe to all future widget events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.repository.events().subscribe()
    }

    /// Run the full pipeline for a viewed product: refresh the
    /// session, check product validity, fetch store data, and publish
    /// the recommendation.
    ///
    /// Calling `load` again supersedes any in-flight load; the
    /// superseded pipeline finishes its network calls but publishes
    /// nothing. Failures surface as [`WidgetEvent::ProductCheckFailed`]
    /// or [`WidgetEvent::InPageError`].
    #[instrument(skip(self))]
    pub async fn load(&self, external_product_id: &str) {
        let repo = &self.repository;
        let generation = repo.begin_load();

        repo.update_user_session(false).await;

        let Some(product) = repo
            .check_product_validity(generation, external_product_id)
            .await
        else {
            return;
        };
        let Some(product) = repo.fetch_initial_data(generation, product).await else {
            return;
        };

        let completed = repo
            .fetch_data_for_in_page_recommendation(
                generation,
                Some(product.clone()),
                None,
                true,
                true,
            )
            .await;
        if completed {
            repo.update_in_page_recommendation(generation, Some(product), RecommendationKind::Both)
                .await;
        }
    }

    /// Re-publish the stored recommendation for the last loaded
    /// product, filtered by `kind`. No network calls.
    pub async fn request_recommendation(&self, kind: RecommendationKind) {
        let generation = self.repository.current_generation();
        self.repository
            .update_in_page_recommendation(generation, None, kind)
            .await;
    }

    /// Recompute the recommendation against a single owned product (or
    /// all of them again with `None`) and publish the result. Owned
    /// products and the body profile are reused from the last load
    /// without refetching; when a body profile is on file, the body
    /// recommendation itself is requested from the service again.
    pub async fn select_owned_product(&self, selected: Option<ProductId>) {
        let repo = &self.repository;
        let generation = repo.current_generation();
        let completed = repo
            .fetch_data_for_in_page_recommendation(generation, None, selected, false, false)
            .await;
        if completed {
            repo.update_in_page_recommendation(generation, None, RecommendationKind::Both)
                .await;
        }
    }

    /// Force a session refresh, bypassing the TTL cache. Use after the
    /// shopper logs in through the host app.
    pub async fn refresh_session(&self) {
        self.repository.update_user_session(true).await;
    }

    /// Switch the shopper identity the widget acts for (`None` goes
    /// back to anonymous). The previous user's local data is cleared
    /// and the session refreshed; call [`FitWidget::load`] again to
    /// recompute recommendations for the new identity.
    pub async fn set_user(&self, external_user_id: Option<String>) {
        self.repository.set_user(external_user_id).await;
    }

    /// Localized widget text by dot-separated path (e.g.
    /// `"inpage.no_recommendation"`), from the bundle fetched during
    /// the last successful load. Store-specific overrides are already
    /// merged in.
    pub async fn localized_text(&self, path: &str) -> Option<String> {
        self.repository.localized_text(path).await
    }

    /// Report a completed purchase so the service can grow the
    /// shopper's owned-product history. The SDK stamps the configured
    /// external user id and the store region before submission.
    ///
    /// # Errors
    ///
    /// Returns an error when the submission itself fails; a failed
    /// region lookup is logged and the order goes out without one.
    pub async fn send_order(&self, order: Order) -> Result<()> {
        self.repository.send_order(order).await?;
        Ok(())
    }

    /// Forget the current user: clears persisted tokens, in-memory
    /// user data and recommendations, and the cached session, and
    /// requests remote deletion in the background.
    pub async fn logout(&self) {
        self.repository.clear_user_data().await;
    }
}
