//! Remote data gateway for the recommendation service.
//!
//! The [`Gateway`] trait is the seam between the orchestration logic
//! and the wire: the repository only ever talks to `dyn Gateway`, so
//! tests can substitute an in-memory implementation. [`HttpGateway`]
//! is the production implementation over `reqwest`.

mod http;
pub(crate) mod types;

pub use http::HttpGateway;

use async_trait::async_trait;
use fitsense_core::{
    BodyProfileRecommendedSize, I18nBundle, Order, Product, ProductId, ProductType, StoreId,
    UserBodyProfile,
};
use thiserror::Error;

use crate::session::SessionData;

/// Errors from the remote data gateway.
///
/// 404 and 403 get their own variants because callers treat them as
/// data, not failures: a missing user resource means "no data", and a
/// forbidden store-localization fetch means "store not customized".
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network or timeout failure reaching the service.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Requested resource does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access to the resource is forbidden (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Response body did not match the expected shape. The expected
    /// type name is kept for diagnostics.
    #[error("Failed to decode {type_name}: {source}")]
    Decode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The configured API key cannot be sent as an HTTP header.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),
}

impl GatewayError {
    /// Whether this error is a 404, which optional-data callers map to
    /// "no data".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error is a 403.
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }
}

/// Result of a product validity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCheck {
    /// The external id the check was issued for.
    pub external_id: String,
    /// Whether the service recognizes this product.
    pub valid: bool,
    /// Server-assigned product id, present when valid.
    pub product_id: Option<ProductId>,
    /// Store the product belongs to.
    pub store_id: Option<StoreId>,
    /// Product display name, when the service has one.
    pub name: Option<String>,
    /// Whether the service wants the client to upload product imagery.
    pub fetch_meta_data: bool,
}

impl ProductCheck {
    /// Build the (not yet detailed) product this check describes.
    /// Sizes and the product type arrive later with the store-product
    /// detail fetch.
    #[must_use]
    pub fn into_product(self) -> Option<Product> {
        let id = self.product_id?;
        Some(Product {
            external_id: self.external_id.clone(),
            id,
            name: self.name.unwrap_or(self.external_id),
            product_type_id: None,
            sizes: Vec::new(),
            store_id: self.store_id,
            meta: None,
        })
    }
}

/// Store metadata used for localization lookup and order stamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    /// Short name the store-specific localization bundle is keyed by.
    pub short_name: String,
    /// Region code stamped onto submitted orders.
    pub region: Option<String>,
}

/// Async operations exposed by the recommendation service.
///
/// All calls are authenticated HTTP requests in production; the exact
/// wire format is an implementation detail of [`HttpGateway`].
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Check whether a product is known to the service.
    async fn check_product(&self, external_id: &str) -> Result<ProductCheck, GatewayError>;

    /// Fetch full store-product detail (sizes, type, meta).
    async fn store_product(&self, id: ProductId) -> Result<Product, GatewayError>;

    /// Fetch all product types with compatibility sets and weights.
    async fn product_types(&self) -> Result<Vec<ProductType>, GatewayError>;

    /// Fetch the user's owned products. 404 means the user owns none.
    async fn user_products(&self, auth_token: &str) -> Result<Vec<Product>, GatewayError>;

    /// Fetch the user's body profile. 404 means none is on file.
    async fn user_body_profile(&self, auth_token: &str)
    -> Result<UserBodyProfile, GatewayError>;

    /// Map a body profile to a recommended size for the candidate
    /// product. `footwear` selects the shoe-specific variant.
    async fn body_recommended_size(
        &self,
        product_types: &[ProductType],
        product: &Product,
        profile: &UserBodyProfile,
        footwear: bool,
    ) -> Result<BodyProfileRecommendedSize, GatewayError>;

    /// Open or refresh a session for the given browser id.
    async fn session(&self, browser_id: &str) -> Result<SessionData, GatewayError>;

    /// Fetch the shared (cross-store) localization bundle.
    async fn i18n(&self, language: &str) -> Result<I18nBundle, GatewayError>;

    /// Fetch the store-specific localization bundle. 403 means the
    /// store has no customized text.
    async fn store_i18n(
        &self,
        store_name: &str,
        language: &str,
    ) -> Result<I18nBundle, GatewayError>;

    /// Submit a purchase order.
    async fn send_order(&self, order: &Order) -> Result<(), GatewayError>;

    /// Fetch store metadata for the configured API key.
    async fn store_info(&self) -> Result<StoreInfo, GatewayError>;

    /// Post an analytics event. Callers spawn this fire-and-forget.
    async fn send_event(
        &self,
        name: &str,
        payload: &serde_json::Value,
    ) -> Result<(), GatewayError>;

    /// Ask the service to fetch product imagery. Fire-and-forget.
    async fn send_product_image(&self, product: &Product) -> Result<(), GatewayError>;

    /// Delete the user's remote data.
    async fn delete_user_data(&self, auth_token: &str) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_check_without_id_yields_no_product() {
        let check = ProductCheck {
            external_id: "sku-1".to_string(),
            valid: false,
            product_id: None,
            store_id: None,
            name: None,
            fetch_meta_data: false,
        };
        assert!(check.into_product().is_none());
    }

    #[test]
    fn test_product_check_falls_back_to_external_id_for_name() {
        let check = ProductCheck {
            external_id: "sku-1".to_string(),
            valid: true,
            product_id: Some(ProductId::new(10)),
            store_id: Some(StoreId::new(2)),
            name: None,
            fetch_meta_data: false,
        };
        let product = check.into_product().expect("valid check yields product");
        assert_eq!(product.name, "sku-1");
        assert_eq!(product.id, ProductId::new(10));
        assert!(product.sizes.is_empty());
    }

    #[test]
    fn test_gateway_error_classification() {
        assert!(GatewayError::NotFound("x".to_string()).is_not_found());
        assert!(GatewayError::Forbidden("x".to_string()).is_forbidden());
        assert!(
            !GatewayError::Api {
                status: 500,
                message: "boom".to_string()
            }
            .is_not_found()
        );
    }
}
