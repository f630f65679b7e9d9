//! Recommendation results produced by the SDK.

use serde::{Deserialize, Serialize};

use super::product::{Product, ProductSize};

/// The result of comparing a store product against the user's owned
/// products.
///
/// Built as a mutable accumulator during the scoring pass and
/// immutable once returned. A `fit_score` of 0 means no compatible
/// owned product was found; callers must treat that as "no
/// product-comparison recommendation available".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeComparisonRecommendedSize {
    /// Best fit score seen so far (20-100 once any pair matched, 0
    /// when nothing was comparable).
    pub fit_score: f64,
    /// The best-fitting size of the store product.
    pub best_size: Option<ProductSize>,
    /// The owned product that produced the best score.
    pub best_product: Option<Product>,
    /// Whether the store product runs smaller than the owned product,
    /// from the first comparable dimension of the winning pair. `None`
    /// when no dimension was comparable.
    pub store_product_is_smaller: Option<bool>,
}

impl SizeComparisonRecommendedSize {
    /// Whether the scoring pass found any compatible pair at all.
    #[must_use]
    pub fn has_match(&self) -> bool {
        self.fit_score > 0.0
    }
}

/// A size name derived from the user's body profile by the remote
/// body-profile-to-size mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyProfileRecommendedSize {
    /// Recommended size name (e.g. "M").
    pub size_name: String,
}

/// Which recommendation combination to publish to subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Product-comparison recommendation only.
    ProductComparison,
    /// Body-profile recommendation only.
    BodyProfile,
    /// Both, when available.
    #[default]
    Both,
}
