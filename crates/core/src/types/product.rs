//! Store products and their sizes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::{ProductId, ProductTypeId, StoreId};

/// A product known to the recommendation service.
///
/// The external identifier is the client-assigned natural key used in
/// host-app facing APIs; the internal [`ProductId`] is the
/// server-assigned key used for follow-up service calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Client-assigned identifier (natural key for host-app APIs).
    pub external_id: String,
    /// Server-assigned identifier (natural key for service calls).
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Product type this product belongs to. Not yet known for a
    /// product built from a validity check alone; always present on a
    /// full store-product detail.
    pub product_type_id: Option<ProductTypeId>,
    /// Available sizes with their measurements.
    pub sizes: Vec<ProductSize>,
    /// Store the product belongs to, when known.
    pub store_id: Option<StoreId>,
    /// Optional merchandising metadata.
    pub meta: Option<ProductMeta>,
}

impl Product {
    /// The first size entry, used as the reference size when this
    /// product is on the owned side of a comparison.
    #[must_use]
    pub fn reference_size(&self) -> Option<&ProductSize> {
        self.sizes.first()
    }
}

/// A single size of a product: an optional name (e.g. "M") plus a map
/// from measurement name to value in millimeters.
///
/// A size with no measurements is still valid (name-only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSize {
    /// Size label, if the store provides one.
    pub name: Option<String>,
    /// Measurement name to value. `None` values mean the store did not
    /// provide that dimension for this size.
    #[serde(default)]
    pub measurements: BTreeMap<String, Option<i32>>,
}

impl ProductSize {
    /// Build a size from a label and measurement pairs.
    #[must_use]
    pub fn new(name: Option<String>, measurements: BTreeMap<String, Option<i32>>) -> Self {
        Self { name, measurements }
    }

    /// Look up a measurement value by name.
    #[must_use]
    pub fn measurement(&self, name: &str) -> Option<i32> {
        self.measurements.get(name).copied().flatten()
    }
}

/// Merchandising metadata attached to a store product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMeta {
    pub brand: Option<String>,
    pub gender: Option<String>,
    pub fit: Option<String>,
    pub style: Option<String>,
    /// Measurements of the model shown in product imagery.
    #[serde(default)]
    pub model_measurements: BTreeMap<String, Option<i32>>,
    /// Brand-level sizing hint ("true to size", "runs small", ...).
    pub brand_sizing: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_only_size_is_valid() {
        let size = ProductSize::new(Some("M".to_string()), BTreeMap::new());
        assert_eq!(size.name.as_deref(), Some("M"));
        assert!(size.measurements.is_empty());
    }

    #[test]
    fn test_measurement_lookup_flattens_missing_value() {
        let mut measurements = BTreeMap::new();
        measurements.insert("chest".to_string(), Some(480));
        measurements.insert("sleeve".to_string(), None);
        let size = ProductSize::new(None, measurements);

        assert_eq!(size.measurement("chest"), Some(480));
        assert_eq!(size.measurement("sleeve"), None);
        assert_eq!(size.measurement("waist"), None);
    }

    #[test]
    fn test_reference_size_is_first() {
        let product = Product {
            external_id: "sku-1".to_string(),
            id: ProductId::new(1),
            name: "Tee".to_string(),
            product_type_id: Some(ProductTypeId::new(2)),
            sizes: vec![
                ProductSize::new(Some("S".to_string()), BTreeMap::new()),
                ProductSize::new(Some("M".to_string()), BTreeMap::new()),
            ],
            store_id: None,
            meta: None,
        };
        assert_eq!(
            product.reference_size().and_then(|s| s.name.as_deref()),
            Some("S")
        );
    }
}
