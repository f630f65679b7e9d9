//! User body profiles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body measurements a user has stored with the recommendation
/// service.
///
/// Fetched once per session, cached with a TTL, and cleared on logout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBodyProfile {
    pub gender: Option<String>,
    /// Age in years.
    pub age: Option<i32>,
    /// Height in millimeters.
    pub height: Option<i32>,
    /// Weight as reported by the service (free-form unit string).
    pub weight: Option<String>,
    /// Body measurement name to value in millimeters.
    #[serde(default)]
    pub body_data: BTreeMap<String, Option<i32>>,
    /// Footwear-specific measurements (foot length, width, ...).
    #[serde(default)]
    pub footwear_data: BTreeMap<String, Option<i32>>,
}
