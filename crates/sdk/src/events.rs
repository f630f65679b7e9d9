//! Typed event channel the SDK publishes results on.
//!
//! Replaces notification-center-style pub/sub with a broadcast
//! channel: the repository publishes, any number of UI collaborators
//! subscribe. Events are delivered on the subscriber's own task;
//! marshaling onto a UI thread is the host app's responsibility.

use fitsense_core::{BodyProfileRecommendedSize, Product, SizeComparisonRecommendedSize};
use tokio::sync::broadcast;

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 32;

/// Events published by the recommendation pipeline.
#[derive(Debug, Clone)]
pub enum WidgetEvent {
    /// The viewed product is known to the service; the widget may be
    /// shown.
    ProductCheckSucceeded(Product),
    /// The viewed product is not supported (or the check failed); the
    /// widget should not be shown at all.
    ProductCheckFailed {
        external_product_id: String,
        message: String,
    },
    /// Full store-product detail is available.
    StoreProductFetched(Product),
    /// The combined recommendation, published atomically. Either
    /// recommendation may be absent; both absent means "no
    /// recommendation available, render the fallback text".
    SizeRecommendationReady {
        product: Product,
        comparison: Option<SizeComparisonRecommendedSize>,
        body: Option<BodyProfileRecommendedSize>,
    },
    /// A data fetch needed for the in-page recommendation failed; the
    /// widget stays visible with a generic fallback.
    InPageError { external_product_id: String },
}

/// Broadcast bus for [`WidgetEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WidgetEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Subscribe to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: WidgetEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
