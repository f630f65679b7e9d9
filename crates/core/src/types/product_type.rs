//! Product types: compatibility sets and measurement weights.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::id::ProductTypeId;

/// A product type known to the recommendation service.
///
/// The compatibility set defines which owned-product types are
/// comparable to a store product of this type; the weights express the
/// relative importance of each measurement dimension when scoring fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductType {
    pub id: ProductTypeId,
    pub name: String,
    /// Product types whose measurements are comparable to this one.
    #[serde(default)]
    pub compatible_with: BTreeSet<ProductTypeId>,
    /// Measurement name to non-negative weight.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl ProductType {
    /// Whether an owned product of `other` type can be compared against
    /// a store product of this type.
    #[must_use]
    pub fn is_compatible_with(&self, other: ProductTypeId) -> bool {
        self.compatible_with.contains(&other)
    }

    /// Whether this type is footwear, which selects the shoe-specific
    /// body-profile recommendation endpoint.
    #[must_use]
    pub fn is_footwear(&self) -> bool {
        self.name.eq_ignore_ascii_case("shoe") || self.name.eq_ignore_ascii_case("shoes")
    }
}
