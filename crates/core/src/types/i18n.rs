//! Localized text bundles and their merge rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A nested key/value bundle of localized widget text.
///
/// The service serves a shared bundle (defaults for all stores) and an
/// optional store-specific bundle; the store bundle is deep-merged
/// over the shared one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct I18nBundle(pub Value);

impl I18nBundle {
    /// Build a bundle from raw JSON.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Deep-merge `store` over `self`: nested object keys from the
    /// store bundle override same-named keys here, keys absent from the
    /// store bundle keep the shared defaults.
    #[must_use]
    pub fn merged_with(mut self, store: &Self) -> Self {
        merge_value(&mut self.0, &store.0);
        self
    }

    /// Look up a text value by dot-separated path.
    #[must_use]
    pub fn text(&self, path: &str) -> Option<&str> {
        let mut current = &self.0;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        current.as_str()
    }
}

fn merge_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge_value(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_keys_override_shared() {
        let shared = I18nBundle::new(json!({
            "inpage": {"no_recommendation": "Check the fit", "loading": "Loading"}
        }));
        let store = I18nBundle::new(json!({
            "inpage": {"no_recommendation": "Find your size"}
        }));

        let merged = shared.merged_with(&store);
        assert_eq!(merged.text("inpage.no_recommendation"), Some("Find your size"));
        assert_eq!(merged.text("inpage.loading"), Some("Loading"));
    }

    #[test]
    fn test_store_only_keys_are_added() {
        let shared = I18nBundle::new(json!({"a": {"b": "1"}}));
        let store = I18nBundle::new(json!({"a": {"c": "2"}, "d": "3"}));

        let merged = shared.merged_with(&store);
        assert_eq!(merged.text("a.b"), Some("1"));
        assert_eq!(merged.text("a.c"), Some("2"));
        assert_eq!(merged.text("d"), Some("3"));
    }

    #[test]
    fn test_scalar_overlay_replaces_object() {
        let shared = I18nBundle::new(json!({"a": {"b": "1"}}));
        let store = I18nBundle::new(json!({"a": "flat"}));

        let merged = shared.merged_with(&store);
        assert_eq!(merged.text("a"), Some("flat"));
    }

    #[test]
    fn test_text_missing_path_is_none() {
        let bundle = I18nBundle::new(json!({"a": {"b": "1"}}));
        assert_eq!(bundle.text("a.z"), None);
        assert_eq!(bundle.text("a"), None); // object, not a string
    }
}
