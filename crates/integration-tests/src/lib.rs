//! Integration test harness for the FitSense SDK.
//!
//! Tests drive the real [`fitsense_sdk::FitWidget`] (HTTP gateway
//! included) against a `wiremock` server standing in for the
//! recommendation service. [`TestService`] owns the mock server and
//! knows the service's wire fixtures; individual tests override the
//! endpoints whose behavior they exercise.

use std::time::Duration;

use fitsense_sdk::{FitWidget, ServiceEnv, WidgetConfig, WidgetEvent};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mocked recommendation service plus the widget configuration that
/// points at it.
pub struct TestService {
    pub server: MockServer,
}

impl TestService {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Build a widget wired to the mock service.
    ///
    /// # Panics
    ///
    /// Panics when the widget cannot be constructed; test fixtures are
    /// always valid.
    #[must_use]
    pub fn widget(&self) -> FitWidget {
        let config = WidgetConfig::new("test-api-key")
            .with_env(ServiceEnv::Custom(self.server.uri()))
            .with_external_user_id("user-1");
        FitWidget::new(config).expect("widget builds against mock service")
    }

    /// Mount a JSON 200 response.
    pub async fn mount_json(&self, http_method: &str, route: &str, body: Value) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a bare status-code response.
    pub async fn mount_status(&self, http_method: &str, route: &str, status: u16) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Mount the fire-and-forget sinks (analytics, product images,
    /// remote deletion) so background tasks never hit an unmatched
    /// route.
    pub async fn mount_background_sinks(&self) {
        self.mount_status("POST", "/events", 200).await;
        self.mount_status("POST", "/product-images", 200).await;
        self.mount_status("DELETE", "/user-data", 200).await;
    }

    /// Mount every endpoint the full `load` pipeline touches, with the
    /// standard fixtures below. `logged_in` controls whether the
    /// session carries an auth token.
    pub async fn mount_happy_path(&self, logged_in: bool) {
        self.mount_background_sinks().await;
        self.mount_json("POST", "/sessions", session_json(logged_in, false))
            .await;
        self.mount_json("GET", "/product/check", product_check_json(true))
            .await;
        self.mount_json("GET", "/store-products/101", store_product_json())
            .await;
        self.mount_json("GET", "/product-types", product_types_json())
            .await;
        self.mount_json("GET", "/i18n/en", shared_i18n_json()).await;
        self.mount_json("GET", "/store-info", store_info_json()).await;
        self.mount_json("GET", "/stores/acme/i18n/en", store_i18n_json())
            .await;
        if logged_in {
            self.mount_json("GET", "/user-products", user_products_json())
                .await;
        }
    }
}

// ============================================================================
// Wire fixtures
// ============================================================================

#[must_use]
pub fn product_check_json(valid: bool) -> Value {
    json!({
        "name": "Cotton Tee",
        "productId": if valid { json!(101) } else { Value::Null },
        "storeId": 5,
        "data": {"validProduct": valid, "fetchMetaData": false}
    })
}

#[must_use]
pub fn store_product_json() -> Value {
    json!({
        "id": 101,
        "externalId": "sku-1",
        "name": "Cotton Tee",
        "productType": 2,
        "storeId": 5,
        "sizes": [
            {"name": "S", "measurements": {"chest": 440}},
            {"name": "M", "measurements": {"chest": 480}},
            {"name": "L", "measurements": {"chest": 520}}
        ]
    })
}

#[must_use]
pub fn product_types_json() -> Value {
    json!([
        {
            "id": 2,
            "name": "shirt",
            "compatible_with": [2],
            "weights": {"chest": 1.0}
        }
    ])
}

/// One owned shirt with chest 485 mm; against [`store_product_json`]
/// the best fit is size "M".
#[must_use]
pub fn user_products_json() -> Value {
    json!([
        {
            "id": 20,
            "externalId": "owned-20",
            "name": "Owned Shirt",
            "productType": 2,
            "sizes": [{"measurements": {"chest": 485}}]
        }
    ])
}

#[must_use]
pub fn session_json(logged_in: bool, has_body_profile: bool) -> Value {
    let mut session = json!({"accessToken": "access-token"});
    if logged_in {
        session["authToken"] = json!("auth-token");
        session["user"] = json!({"bodyMeasurement": has_body_profile});
    }
    session
}

#[must_use]
pub fn shared_i18n_json() -> Value {
    json!({"inpage": {"loading": "Loading", "no_recommendation": "Check the fit"}})
}

#[must_use]
pub fn store_i18n_json() -> Value {
    json!({"inpage": {"no_recommendation": "Find your size"}})
}

#[must_use]
pub fn store_info_json() -> Value {
    json!({"shortName": "acme", "region": "US"})
}

// ============================================================================
// Event helpers
// ============================================================================

/// Receive the next event, failing the test after a timeout instead of
/// hanging.
///
/// # Panics
///
/// Panics when no event arrives within five seconds or the bus is
/// closed.
pub async fn next_event(receiver: &mut broadcast::Receiver<WidgetEvent>) -> WidgetEvent {
    tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("timed out waiting for widget event")
        .expect("event bus closed")
}

/// Receive events until one matches `predicate`, failing on timeout.
///
/// # Panics
///
/// Panics when no matching event arrives within five seconds.
pub async fn next_event_matching(
    receiver: &mut broadcast::Receiver<WidgetEvent>,
    predicate: impl Fn(&WidgetEvent) -> bool,
) -> WidgetEvent {
    loop {
        let event = next_event(receiver).await;
        if predicate(&event) {
            return event;
        }
    }
}

/// Drain events already in the channel without waiting.
pub fn drain_events(receiver: &mut broadcast::Receiver<WidgetEvent>) -> Vec<WidgetEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
