//! Recommendation repository: orchestrates gateway calls, caching,
//! and scoring, and publishes results on the event bus.
//!
//! One repository serves one widget instance. All mutable state lives
//! behind a single async mutex, so concurrent product-view sessions in
//! a multi-screen host app see consistent snapshots. Every pipeline
//! stage takes the generation token handed out by [`Repository::begin_load`];
//! events are only published while that generation is still current,
//! which guarantees a superseded `load` can never publish a stale
//! recommendation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fitsense_core::{
    BodyProfileRecommendedSize, I18nBundle, Order, Product, ProductId, ProductType,
    RecommendationKind, SizeComparisonRecommendedSize, UserBodyProfile,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::api::{Gateway, GatewayError};
use crate::cache::ExpiringCache;
use crate::config::WidgetConfig;
use crate::events::{EventBus, WidgetEvent};
use crate::scoring::find_best_fit_product_size;
use crate::session::{SettingsKey, SettingsStore};

/// Message published when the service rejects a product.
const UNSUPPORTED_PRODUCT_MESSAGE: &str = "This product is not supported";

/// Mutable per-widget state. Owned exclusively by the repository and
/// invalidated wholesale on logout.
#[derive(Default)]
struct RepoState {
    /// Store products seen this session, keyed by internal id.
    products: HashMap<ProductId, Product>,
    /// The most recently loaded store product.
    last_product: Option<Product>,
    product_types: Vec<ProductType>,
    i18n: Option<I18nBundle>,
    /// `None` until the first (successful or 404) user-products fetch.
    user_products: Option<Vec<Product>>,
    body_profile: Option<UserBodyProfile>,
    comparison: Option<SizeComparisonRecommendedSize>,
    body_recommendation: Option<BodyProfileRecommendedSize>,
    store_name: Option<String>,
    store_region: Option<String>,
    /// Sticky: set on the first 403 from store localization, never
    /// cleared for the lifetime of this widget.
    store_i18n_unavailable: bool,
    /// From the session: whether the user has body measurements on
    /// file. Gates body-profile fetches.
    has_body_profile: bool,
    auth_token: Option<SecretString>,
    /// Host-app identifier for the current shopper, stamped onto
    /// orders. Seeded from the config, changeable via `set_user`.
    external_user_id: Option<String>,
}

/// Orchestrates the recommendation pipeline for one widget instance.
pub struct Repository {
    gateway: Arc<dyn Gateway>,
    settings: Arc<dyn SettingsStore>,
    cache: ExpiringCache,
    events: EventBus,
    config: WidgetConfig,
    state: Mutex<RepoState>,
    generation: AtomicU64,
}

impl Repository {
    pub fn new(
        config: WidgetConfig,
        gateway: Arc<dyn Gateway>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let cache = ExpiringCache::new(config.session_ttl);
        let state = RepoState {
            external_user_id: config.external_user_id.clone(),
            ..RepoState::default()
        };
        Self {
            gateway,
            settings,
            cache,
            events: EventBus::new(),
            config,
            state: Mutex::new(state),
            generation: AtomicU64::new(0),
        }
    }

    /// The event bus this repository publishes on.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Start a new load pipeline, superseding any in-flight one.
    /// Returns the generation token the new pipeline must pass to
    /// every stage.
    pub fn begin_load(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The generation of the most recently started load.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Publish only if `generation` has not been superseded by a newer
    /// `load`.
    fn publish_if_current(&self, generation: u64, event: WidgetEvent) {
        if self.current_generation() == generation {
            self.events.publish(event);
        } else {
            debug!(generation, "dropping event for superseded load");
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Refresh session data through the expiring cache and persist any
    /// tokens it carries.
    ///
    /// Failures are logged, not propagated: without a session the
    /// pipeline still runs, it just skips user-data fetches.
    #[instrument(skip(self))]
    pub async fn update_user_session(&self, force: bool) {
        // Pick up a persisted auth token from a previous app run.
        {
            let mut state = self.state.lock().await;
            if state.auth_token.is_none()
                && let Some(token) = self.settings.get(SettingsKey::AuthToken).await
            {
                state.auth_token = Some(SecretString::from(token));
            }
        }

        if force {
            self.cache.invalidate_session().await;
        }

        let browser_id = self.browser_id().await;
        let gateway = Arc::clone(&self.gateway);
        let result = self
            .cache
            .session_with(async move { gateway.session(&browser_id).await })
            .await;

        match result {
            Ok(session) => {
                if let Some(token) = &session.access_token {
                    self.settings
                        .set(SettingsKey::AccessToken, Some(token.clone()))
                        .await;
                }
                if let Some(token) = &session.auth_token {
                    self.settings
                        .set(SettingsKey::AuthToken, Some(token.clone()))
                        .await;
                }

                let mut state = self.state.lock().await;
                state.has_body_profile = session.has_body_profile;
                if let Some(token) = session.auth_token {
                    state.auth_token = Some(SecretString::from(token));
                }
            }
            Err(err) => {
                warn!(error = %err, "session update failed");
            }
        }
    }

    /// Stable per-install browser id, generated on first use.
    async fn browser_id(&self) -> String {
        if let Some(id) = self.settings.get(SettingsKey::BrowserId).await {
            return id;
        }
        let id = Uuid::new_v4().simple().to_string();
        self.settings
            .set(SettingsKey::BrowserId, Some(id.clone()))
            .await;
        id
    }

    // =========================================================================
    // Pipeline stages
    // =========================================================================

    /// Stage 1: ask the service whether the product is supported.
    ///
    /// On success fires the "saw product" / "saw widget button"
    /// analytics events (and, when the service asks for it, the
    /// product image upload) as detached background tasks whose
    /// results are intentionally discarded.
    #[instrument(skip(self), fields(external_id = %external_id))]
    pub async fn check_product_validity(
        &self,
        generation: u64,
        external_id: &str,
    ) -> Option<Product> {
        let check = match self.gateway.check_product(external_id).await {
            Ok(check) => check,
            Err(err) => {
                warn!(error = %err, "product check failed");
                self.publish_if_current(
                    generation,
                    WidgetEvent::ProductCheckFailed {
                        external_product_id: external_id.to_string(),
                        message: err.to_string(),
                    },
                );
                return None;
            }
        };

        let fetch_meta_data = check.fetch_meta_data;
        let product = if check.valid {
            check.into_product()
        } else {
            None
        };
        let Some(product) = product else {
            self.publish_if_current(
                generation,
                WidgetEvent::ProductCheckFailed {
                    external_product_id: external_id.to_string(),
                    message: UNSUPPORTED_PRODUCT_MESSAGE.to_string(),
                },
            );
            return None;
        };

        self.spawn_analytics_event("user-saw-product", &product);
        self.spawn_analytics_event("user-saw-widget-button", &product);
        if fetch_meta_data {
            self.spawn_product_image_upload(&product);
        }

        self.publish_if_current(generation, WidgetEvent::ProductCheckSucceeded(product.clone()));
        Some(product)
    }

    /// Stage 2: fan out for the store-product detail, the product-type
    /// list, and the merged localization bundle. All three are
    /// required; any failure publishes an in-page error.
    ///
    /// A product already fetched this session is served from the
    /// in-memory product cache instead of refetching.
    #[instrument(skip(self, product), fields(external_id = %product.external_id))]
    pub async fn fetch_initial_data(&self, generation: u64, product: Product) -> Option<Product> {
        let external_id = product.external_id.clone();

        let cached = {
            let state = self.state.lock().await;
            state.products.get(&product.id).cloned()
        };
        let product_fut = async {
            match cached {
                Some(cached) => Ok(cached),
                None => self.gateway.store_product(product.id).await,
            }
        };

        let (product_result, types_result, i18n) = tokio::join!(
            product_fut,
            self.gateway.product_types(),
            self.fetch_localization(None),
        );

        let mut store_product = match product_result {
            Ok(detail) => detail,
            Err(err) => {
                warn!(error = %err, "store product fetch failed");
                self.publish_in_page_error(generation, &external_id);
                return None;
            }
        };
        // The detail endpoint is keyed by internal id; carry the
        // external id through for event tagging.
        if store_product.external_id.is_empty() {
            store_product.external_id = external_id.clone();
        }

        let product_types = match types_result {
            Ok(types) if !types.is_empty() => types,
            Ok(_) => {
                warn!("product type list is empty");
                self.publish_in_page_error(generation, &external_id);
                return None;
            }
            Err(err) => {
                warn!(error = %err, "product types fetch failed");
                self.publish_in_page_error(generation, &external_id);
                return None;
            }
        };

        let Some(i18n) = i18n else {
            self.publish_in_page_error(generation, &external_id);
            return None;
        };

        {
            let mut state = self.state.lock().await;
            state
                .products
                .insert(store_product.id, store_product.clone());
            state.last_product = Some(store_product.clone());
            state.product_types = product_types;
            state.i18n = Some(i18n);
        }

        self.publish_if_current(
            generation,
            WidgetEvent::StoreProductFetched(store_product.clone()),
        );
        Some(store_product)
    }

    /// Stage 3: conditionally refresh user data, derive both
    /// recommendations, and store them.
    ///
    /// A 404 for either user fetch means "no data" and the stage keeps
    /// going; any other failure publishes an in-page error and aborts.
    /// Returns whether the stage completed.
    #[instrument(skip(self, product))]
    pub async fn fetch_data_for_in_page_recommendation(
        &self,
        generation: u64,
        product: Option<Product>,
        selected_user_product_id: Option<ProductId>,
        update_user_products: bool,
        update_body_profile: bool,
    ) -> bool {
        let (target, auth_token, has_body_profile, product_types) = {
            let state = self.state.lock().await;
            (
                product.or_else(|| state.last_product.clone()),
                state.auth_token.clone(),
                state.has_body_profile,
                state.product_types.clone(),
            )
        };
        let Some(target) = target else {
            warn!("no product to compute a recommendation for");
            return false;
        };
        let external_id = target.external_id.clone();

        let auth = auth_token.map(|token| token.expose_secret().to_string());
        let fetch_products = update_user_products && auth.is_some();
        let fetch_profile = update_body_profile && has_body_profile && auth.is_some();
        let token = auth.unwrap_or_default();

        // `Ok(None)` means "leave current state untouched".
        let products_fut = async {
            if !fetch_products {
                return Ok(None);
            }
            match self.gateway.user_products(&token).await {
                Ok(products) => Ok(Some(products)),
                Err(err) if err.is_not_found() => Ok(Some(Vec::new())),
                Err(err) => Err(err),
            }
        };
        let profile_fut = async {
            if !fetch_profile {
                return Ok(None);
            }
            match self.gateway.user_body_profile(&token).await {
                Ok(profile) => Ok(Some(Some(profile))),
                Err(err) if err.is_not_found() => Ok(Some(None)),
                Err(err) => Err(err),
            }
        };
        let (products_result, profile_result) = tokio::join!(products_fut, profile_fut);

        let fetched_products = match products_result {
            Ok(products) => products,
            Err(err) => {
                warn!(error = %err, "user products fetch failed");
                self.publish_in_page_error(generation, &external_id);
                return false;
            }
        };
        let fetched_profile = match profile_result {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "body profile fetch failed");
                self.publish_in_page_error(generation, &external_id);
                return false;
            }
        };

        let (body_profile, user_products) = {
            let mut state = self.state.lock().await;
            if let Some(products) = fetched_products {
                state.user_products = Some(products);
            }
            if has_body_profile {
                if let Some(profile) = fetched_profile {
                    state.body_profile = profile;
                }
            } else {
                // The session says there is genuinely no body
                // measurement on file.
                state.body_profile = None;
            }
            (
                state.body_profile.clone(),
                state.user_products.clone().unwrap_or_default(),
            )
        };

        // Body-profile recommendation. Failure here is not fatal: the
        // product comparison can still be shown.
        let body_recommendation = if let Some(profile) = body_profile {
            let footwear = target
                .product_type_id
                .and_then(|id| product_types.iter().find(|t| t.id == id))
                .is_some_and(ProductType::is_footwear);
            match self
                .gateway
                .body_recommended_size(&product_types, &target, &profile, footwear)
                .await
            {
                Ok(recommendation) => Some(recommendation),
                Err(err) => {
                    warn!(error = %err, "body size recommendation failed");
                    None
                }
            }
        } else {
            None
        };

        // Product comparison, optionally narrowed to one owned product.
        let owned: Vec<Product> = match selected_user_product_id {
            Some(id) => user_products.into_iter().filter(|p| p.id == id).collect(),
            None => user_products,
        };
        let comparison = find_best_fit_product_size(&owned, &target, &product_types);

        {
            let mut state = self.state.lock().await;
            state.body_recommendation = body_recommendation;
            state.comparison = comparison.has_match().then_some(comparison);
        }
        true
    }

    /// Publish the stored recommendations for `product` (or the last
    /// viewed product) as one atomic event, filtered by `kind`.
    #[instrument(skip(self, product))]
    pub async fn update_in_page_recommendation(
        &self,
        generation: u64,
        product: Option<Product>,
        kind: RecommendationKind,
    ) {
        let (target, comparison, body) = {
            let state = self.state.lock().await;
            let comparison = matches!(
                kind,
                RecommendationKind::ProductComparison | RecommendationKind::Both
            )
            .then(|| state.comparison.clone())
            .flatten();
            let body = matches!(
                kind,
                RecommendationKind::BodyProfile | RecommendationKind::Both
            )
            .then(|| state.body_recommendation.clone())
            .flatten();
            (product.or_else(|| state.last_product.clone()), comparison, body)
        };
        let Some(target) = target else {
            warn!("no product to publish a recommendation for");
            return;
        };

        self.publish_if_current(
            generation,
            WidgetEvent::SizeRecommendationReady {
                product: target,
                comparison,
                body,
            },
        );
    }

    // =========================================================================
    // Localization
    // =========================================================================

    /// Fetch the shared localization bundle and merge the
    /// store-specific bundle over it.
    ///
    /// Returns `None` only when the shared fetch fails. A 403 from the
    /// store-specific fetch marks store localization unavailable for
    /// the rest of the session; later calls skip the request entirely.
    #[instrument(skip(self))]
    pub async fn fetch_localization(&self, language: Option<&str>) -> Option<I18nBundle> {
        let language = language.unwrap_or(&self.config.language);

        let shared = match self.gateway.i18n(language).await {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!(error = %err, "shared localization fetch failed");
                return None;
            }
        };

        let skip_store = {
            let state = self.state.lock().await;
            state.store_i18n_unavailable
        };
        if skip_store {
            debug!("store localization unavailable, using shared bundle");
            return Some(shared);
        }

        let Some(store_name) = self.store_name().await else {
            return Some(shared);
        };

        match self.gateway.store_i18n(&store_name, language).await {
            Ok(store_bundle) => Some(shared.merged_with(&store_bundle)),
            Err(err) if err.is_forbidden() => {
                debug!("store has no customized localization, disabling further fetches");
                let mut state = self.state.lock().await;
                state.store_i18n_unavailable = true;
                Some(shared)
            }
            Err(err) => {
                warn!(error = %err, "store localization fetch failed");
                Some(shared)
            }
        }
    }

    /// Localized widget text from the current merged bundle, by
    /// dot-separated path. `None` until the first successful load (or
    /// when the key is missing).
    pub async fn localized_text(&self, path: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .i18n
            .as_ref()
            .and_then(|bundle| bundle.text(path))
            .map(str::to_string)
    }

    /// Store short name, resolved once per session and cached along
    /// with the region.
    async fn store_name(&self) -> Option<String> {
        {
            let state = self.state.lock().await;
            if let Some(name) = state.store_name.clone() {
                return Some(name);
            }
        }

        match self.gateway.store_info().await {
            Ok(info) => {
                let mut state = self.state.lock().await;
                state.store_name = Some(info.short_name.clone());
                state.store_region = info.region;
                Some(info.short_name)
            }
            Err(err) => {
                warn!(error = %err, "store info fetch failed");
                None
            }
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Stamp and submit an order.
    ///
    /// The region comes from the cached store info, fetched on first
    /// use. A failed region lookup is logged and the order is
    /// submitted without a region; only the submission itself
    /// propagates an error.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when order submission fails.
    #[instrument(skip(self, order), fields(order_id = %order.external_order_id))]
    pub async fn send_order(&self, mut order: Order) -> Result<(), GatewayError> {
        let (region, external_user_id) = {
            let state = self.state.lock().await;
            (state.store_region.clone(), state.external_user_id.clone())
        };
        let region = match region {
            Some(region) => Some(region),
            None => {
                // Populates the cached name/region on success.
                self.store_name().await;
                let state = self.state.lock().await;
                if state.store_region.is_none() && state.store_name.is_none() {
                    warn!("store region unknown, submitting order without region");
                }
                state.store_region.clone()
            }
        };

        order.external_user_id = external_user_id;
        order.region = region;
        self.gateway.send_order(&order).await
    }

    // =========================================================================
    // User data
    // =========================================================================

    /// Switch the shopper identity the widget acts for. The previous
    /// user's local data is cleared (without remote deletion) and the
    /// session is refreshed for the new identity.
    #[instrument(skip(self, external_user_id))]
    pub async fn set_user(&self, external_user_id: Option<String>) {
        {
            let mut state = self.state.lock().await;
            state.external_user_id = external_user_id;
        }
        let _ = self.reset_local_user_state().await;
        self.update_user_session(true).await;
    }

    /// Clear all user-scoped state: persisted tokens, in-memory user
    /// data and recommendations, and the cached session. Remote
    /// deletion runs best-effort in the background.
    #[instrument(skip(self))]
    pub async fn clear_user_data(&self) {
        if let Some(token) = self.reset_local_user_state().await {
            let gateway = Arc::clone(&self.gateway);
            // Result intentionally discarded: local state is already
            // cleared, remote deletion is best-effort.
            tokio::spawn(async move {
                if let Err(err) = gateway.delete_user_data(token.expose_secret()).await {
                    warn!(error = %err, "remote user data deletion failed");
                }
            });
        }
    }

    /// Drop everything tied to the current user and return the auth
    /// token that was active, if any.
    async fn reset_local_user_state(&self) -> Option<SecretString> {
        let auth_token = {
            let mut state = self.state.lock().await;
            state.user_products = None;
            state.body_profile = None;
            state.comparison = None;
            state.body_recommendation = None;
            state.has_body_profile = false;
            state.auth_token.take()
        };

        self.settings.set(SettingsKey::AuthToken, None).await;
        self.settings.set(SettingsKey::AccessToken, None).await;
        self.cache.invalidate_session().await;
        auth_token
    }

    // =========================================================================
    // Fire-and-forget helpers
    // =========================================================================

    fn publish_in_page_error(&self, generation: u64, external_id: &str) {
        self.publish_if_current(
            generation,
            WidgetEvent::InPageError {
                external_product_id: external_id.to_string(),
            },
        );
    }

    /// Post an analytics event in the background. The result is
    /// intentionally discarded; analytics never block or fail the
    /// pipeline.
    fn spawn_analytics_event(&self, name: &'static str, product: &Product) {
        let gateway = Arc::clone(&self.gateway);
        let payload = serde_json::json!({
            "externalProductId": product.external_id,
            "productId": product.id,
            "storeId": product.store_id,
        });
        tokio::spawn(async move {
            if let Err(err) = gateway.send_event(name, &payload).await {
                warn!(event = name, error = %err, "analytics event failed");
            }
        });
    }

    /// Ask the service to pick up product imagery, in the background.
    fn spawn_product_image_upload(&self, product: &Product) {
        let gateway = Arc::clone(&self.gateway);
        let product = product.clone();
        tokio::spawn(async move {
            if let Err(err) = gateway.send_product_image(&product).await {
                warn!(error = %err, "product image upload failed");
            }
        });
    }
}
