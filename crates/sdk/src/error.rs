//! SDK-level error type.
//!
//! Most pipeline failures are delivered as [`crate::events::WidgetEvent`]
//! variants rather than errors, because the widget keeps rendering with
//! fallbacks. Only operations with a direct success/failure expectation
//! (`FitWidget::new`, `FitWidget::send_order`) return `WidgetError`.

use thiserror::Error;

use crate::api::GatewayError;
use crate::config::ConfigError;

/// Errors surfaced to the host application.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// Invalid widget configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A remote service call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Result type alias for `WidgetError`.
pub type Result<T> = std::result::Result<T, WidgetError>;
