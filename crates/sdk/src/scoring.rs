//! Fit-scoring engine.
//!
//! Pure functions, no I/O: compare a candidate store-product size
//! against the shopper's owned products using per-dimension weighted
//! absolute differences, and pick the best-fitting (owned product,
//! candidate size) pair.

use std::collections::BTreeMap;

use fitsense_core::{Product, ProductSize, ProductType, SizeComparisonRecommendedSize};

/// Best achievable fit score (identical measurements).
const FIT_SCORE_CEILING: f64 = 100.0;

/// Worst reported fit score; larger raw differences clamp here.
const FIT_SCORE_FLOOR: f64 = 20.0;

/// Raw weighted-difference units per point of fit score.
const RAW_SCORE_DIVISOR: f64 = 10.0;

/// Result of scoring one size pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FitInfo {
    /// 20-100, higher is closer. 100 when no dimension was comparable.
    pub fit_score: f64,
    /// Whether the store product runs smaller than the owned one,
    /// taken from the first comparable dimension in weight-descending
    /// order. `None` when no dimension was comparable.
    pub store_is_smaller: Option<bool>,
}

/// Score how well `candidate` fits relative to `owned`.
///
/// Dimensions are visited in descending weight order (ties broken by
/// name for determinism). A dimension contributes only when both sizes
/// carry a value for it; everything else is skipped entirely.
#[must_use]
pub fn score_fit(
    owned: &ProductSize,
    candidate: &ProductSize,
    weights: &BTreeMap<String, f64>,
) -> FitInfo {
    let mut raw_score = 0.0_f64;
    let mut store_is_smaller = None;

    for (name, weight) in ordered_weights(weights) {
        let (Some(owned_value), Some(candidate_value)) =
            (owned.measurement(name), candidate.measurement(name))
        else {
            continue;
        };

        let diff = owned_value - candidate_value;
        raw_score += (weight * f64::from(diff)).abs();

        // Only the first comparable dimension decides the direction.
        if store_is_smaller.is_none() {
            store_is_smaller = Some(diff > 0);
        }
    }

    FitInfo {
        fit_score: (FIT_SCORE_CEILING - raw_score / RAW_SCORE_DIVISOR).max(FIT_SCORE_FLOOR),
        store_is_smaller,
    }
}

/// Find the best-fitting size of `candidate` across the user's owned
/// products.
///
/// Only owned products whose type is in the candidate type's
/// compatibility set participate, and only their first size entry is
/// used as the reference. Ties keep the earlier pair in
/// owned-products-then-sizes iteration order.
///
/// Returns the default zero-score accumulator when the candidate's
/// type is unknown or nothing is compatible; callers must treat
/// `fit_score == 0` as "no product-comparison recommendation".
#[must_use]
pub fn find_best_fit_product_size(
    owned_products: &[Product],
    candidate: &Product,
    product_types: &[ProductType],
) -> SizeComparisonRecommendedSize {
    let mut best = SizeComparisonRecommendedSize::default();

    let Some(candidate_type) = candidate
        .product_type_id
        .and_then(|id| product_types.iter().find(|t| t.id == id))
    else {
        return best;
    };

    let compatible = owned_products.iter().filter(|owned| {
        owned
            .product_type_id
            .is_some_and(|id| candidate_type.is_compatible_with(id))
    });

    for owned_product in compatible {
        let Some(owned_size) = owned_product.reference_size() else {
            continue;
        };

        for candidate_size in &candidate.sizes {
            let fit = score_fit(owned_size, candidate_size, &candidate_type.weights);
            if fit.fit_score > best.fit_score {
                best.fit_score = fit.fit_score;
                best.best_size = Some(candidate_size.clone());
                best.best_product = Some(owned_product.clone());
                best.store_product_is_smaller = fit.store_is_smaller;
            }
        }
    }

    best
}

/// Weights sorted descending by value, ties broken by name.
fn ordered_weights(weights: &BTreeMap<String, f64>) -> Vec<(&str, f64)> {
    let mut ordered: Vec<(&str, f64)> = weights
        .iter()
        .map(|(name, weight)| (name.as_str(), *weight))
        .collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsense_core::{ProductId, ProductTypeId};

    fn size(measurements: &[(&str, i32)]) -> ProductSize {
        ProductSize {
            name: None,
            measurements: measurements
                .iter()
                .map(|(name, value)| ((*name).to_string(), Some(*value)))
                .collect(),
        }
    }

    fn named_size(name: &str, measurements: &[(&str, i32)]) -> ProductSize {
        ProductSize {
            name: Some(name.to_string()),
            ..size(measurements)
        }
    }

    fn weights(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(name, weight)| ((*name).to_string(), *weight))
            .collect()
    }

    fn product(
        id: i64,
        type_id: i64,
        sizes: Vec<ProductSize>,
    ) -> Product {
        Product {
            external_id: format!("sku-{id}"),
            id: ProductId::new(id),
            name: format!("product {id}"),
            product_type_id: Some(ProductTypeId::new(type_id)),
            sizes,
            store_id: None,
            meta: None,
        }
    }

    fn product_type(id: i64, compatible: &[i64], w: &[(&str, f64)]) -> ProductType {
        ProductType {
            id: ProductTypeId::new(id),
            name: format!("type {id}"),
            compatible_with: compatible.iter().map(|c| ProductTypeId::new(*c)).collect(),
            weights: weights(w),
        }
    }

    // score_fit

    #[test]
    fn test_exact_match_scores_ceiling_with_direction_false() {
        let fit = score_fit(
            &size(&[("chest", 100)]),
            &size(&[("chest", 100)]),
            &weights(&[("chest", 1.0)]),
        );
        // Zero difference still counts as a comparable pair, so the
        // direction is computed (0 > 0 is false) rather than left None.
        assert!((fit.fit_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(fit.store_is_smaller, Some(false));
    }

    #[test]
    fn test_candidate_smaller() {
        let fit = score_fit(
            &size(&[("chest", 110)]),
            &size(&[("chest", 100)]),
            &weights(&[("chest", 2.0)]),
        );
        // raw = |2.0 * 10| = 20, score = 100 - 2 = 98
        assert!((fit.fit_score - 98.0).abs() < f64::EPSILON);
        assert_eq!(fit.store_is_smaller, Some(true));
    }

    #[test]
    fn test_floor_clamp() {
        let fit = score_fit(
            &size(&[("chest", 500)]),
            &size(&[("chest", 0)]),
            &weights(&[("chest", 1.0)]),
        );
        // raw = 500, unclamped would be 50
        assert!((fit.fit_score - 20.0).abs() < f64::EPSILON);
        assert_eq!(fit.store_is_smaller, Some(true));
    }

    #[test]
    fn test_zero_overlap_defaults() {
        let fit = score_fit(
            &size(&[("chest", 100)]),
            &size(&[("waist", 100)]),
            &weights(&[("chest", 1.0), ("waist", 1.0)]),
        );
        assert!((fit.fit_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(fit.store_is_smaller, None);
    }

    #[test]
    fn test_empty_weights_defaults() {
        let fit = score_fit(
            &size(&[("chest", 100)]),
            &size(&[("chest", 50)]),
            &weights(&[]),
        );
        assert!((fit.fit_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(fit.store_is_smaller, None);
    }

    #[test]
    fn test_direction_comes_from_heaviest_dimension() {
        // chest (weight 2.0) says the owned product is smaller, waist
        // (weight 1.0) says larger; chest wins because it is processed
        // first.
        let fit = score_fit(
            &size(&[("chest", 90), ("waist", 120)]),
            &size(&[("chest", 100), ("waist", 100)]),
            &weights(&[("chest", 2.0), ("waist", 1.0)]),
        );
        assert_eq!(fit.store_is_smaller, Some(false));
    }

    #[test]
    fn test_dimension_missing_on_one_side_is_skipped() {
        let fit = score_fit(
            &size(&[("chest", 100), ("waist", 90)]),
            &size(&[("chest", 100)]),
            &weights(&[("waist", 5.0), ("chest", 1.0)]),
        );
        // waist has the larger weight but no candidate value, so the
        // direction comes from chest and waist adds nothing to raw.
        assert!((fit.fit_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(fit.store_is_smaller, Some(false));
    }

    #[test]
    fn test_null_measurement_is_skipped() {
        let owned = ProductSize {
            name: None,
            measurements: [
                ("chest".to_string(), None),
                ("waist".to_string(), Some(100)),
            ]
            .into(),
        };
        let fit = score_fit(
            &owned,
            &size(&[("chest", 100), ("waist", 90)]),
            &weights(&[("chest", 9.0), ("waist", 1.0)]),
        );
        // raw = |1.0 * 10| = 10 → 99
        assert!((fit.fit_score - 99.0).abs() < f64::EPSILON);
        assert_eq!(fit.store_is_smaller, Some(true));
    }

    #[test]
    fn test_score_bounds_hold_for_large_inputs() {
        for diff in [0, 1, 50, 500, 5000, 50000] {
            let fit = score_fit(
                &size(&[("chest", diff)]),
                &size(&[("chest", 0)]),
                &weights(&[("chest", 3.0)]),
            );
            assert!((FIT_SCORE_FLOOR..=FIT_SCORE_CEILING).contains(&fit.fit_score));
        }
    }

    #[test]
    fn test_larger_difference_never_scores_higher() {
        let mut previous = f64::MAX;
        for diff in [0, 10, 40, 100, 400] {
            let fit = score_fit(
                &size(&[("chest", 100 + diff)]),
                &size(&[("chest", 100)]),
                &weights(&[("chest", 1.0)]),
            );
            assert!(fit.fit_score <= previous);
            previous = fit.fit_score;
        }
    }

    // find_best_fit_product_size

    #[test]
    fn test_incompatible_type_is_excluded() {
        // Candidate type 5 is only compatible with {1, 2}; the owned
        // product of type 3 is excluded even with identical sizes.
        let types = vec![product_type(5, &[1, 2], &[("chest", 1.0)])];
        let candidate = product(10, 5, vec![size(&[("chest", 100)])]);
        let owned = vec![product(20, 3, vec![size(&[("chest", 100)])])];

        let best = find_best_fit_product_size(&owned, &candidate, &types);
        assert!(!best.has_match());
        assert!(best.best_product.is_none());
    }

    #[test]
    fn test_best_of_max_across_pairs() {
        let types = vec![product_type(2, &[2], &[("chest", 1.0)])];
        let candidate = product(
            10,
            2,
            vec![
                named_size("S", &[("chest", 440)]),
                named_size("M", &[("chest", 480)]),
                named_size("L", &[("chest", 520)]),
            ],
        );
        let owned = vec![product(20, 2, vec![size(&[("chest", 485)])])];

        let best = find_best_fit_product_size(&owned, &candidate, &types);
        assert_eq!(
            best.best_size.as_ref().and_then(|s| s.name.as_deref()),
            Some("M")
        );
        // raw = |1.0 * 5| = 5 → 99.5
        assert!((best.fit_score - 99.5).abs() < f64::EPSILON);
        assert_eq!(best.store_product_is_smaller, Some(true));
    }

    #[test]
    fn test_tie_keeps_first_pair_found() {
        let types = vec![product_type(2, &[2], &[("chest", 1.0)])];
        // Both candidate sizes are equidistant from the owned size.
        let candidate = product(
            10,
            2,
            vec![
                named_size("A", &[("chest", 470)]),
                named_size("B", &[("chest", 490)]),
            ],
        );
        let owned = vec![product(20, 2, vec![size(&[("chest", 480)])])];

        let best = find_best_fit_product_size(&owned, &candidate, &types);
        assert_eq!(
            best.best_size.as_ref().and_then(|s| s.name.as_deref()),
            Some("A")
        );
    }

    #[test]
    fn test_only_first_owned_size_is_used() {
        let types = vec![product_type(2, &[2], &[("chest", 1.0)])];
        let candidate = product(10, 2, vec![size(&[("chest", 480)])]);
        // The second owned size would match exactly, but only the
        // first size entry is the reference.
        let owned = vec![product(
            20,
            2,
            vec![size(&[("chest", 400)]), size(&[("chest", 480)])],
        )];

        let best = find_best_fit_product_size(&owned, &candidate, &types);
        // raw = 80 → 92
        assert!((best.fit_score - 92.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_candidate_type_yields_default() {
        let candidate = product(10, 9, vec![size(&[("chest", 480)])]);
        let owned = vec![product(20, 9, vec![size(&[("chest", 480)])])];

        let best = find_best_fit_product_size(&owned, &candidate, &[]);
        assert!(!best.has_match());
    }

    #[test]
    fn test_no_owned_products_yields_default() {
        let types = vec![product_type(2, &[2], &[("chest", 1.0)])];
        let candidate = product(10, 2, vec![size(&[("chest", 480)])]);

        let best = find_best_fit_product_size(&[], &candidate, &types);
        assert!(!best.has_match());
        assert!(best.best_size.is_none());
        assert!(best.store_product_is_smaller.is_none());
    }

    #[test]
    fn test_compatible_pair_with_no_shared_dimensions_still_matches() {
        let types = vec![product_type(2, &[2], &[("chest", 1.0)])];
        let candidate = product(10, 2, vec![named_size("M", &[("waist", 400)])]);
        let owned = vec![product(20, 2, vec![size(&[("hip", 500)])])];

        let best = find_best_fit_product_size(&owned, &candidate, &types);
        // No overlap scores 100 with unknown direction.
        assert!((best.fit_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(best.store_product_is_smaller, None);
        assert!(best.has_match());
    }
}
