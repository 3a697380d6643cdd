//! ID and payload generation utilities
//!
//! Provides correlation identifiers for cycles and the synthetic feature
//! vectors fed to the proposer.

use rand::Rng;
use serde_json::{Map, Value};

/// Feature names sent to the proposer, in canonical order
pub const FEATURE_NAMES: [&str; 2] = ["f1", "f2"];

/// Upper bound (exclusive) for synthetic feature values
const FEATURE_MAX: f64 = 5.0;

/// Generate a fresh correlation ID for one cycle
///
/// Format: hyphenated UUID v4
/// Example: `3f2b8c1e-9d4a-4f6b-8e21-0c7a5d9b1e42`
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a synthetic feature map `{f1, f2}` with values in `[0, 5)`
pub fn synthetic_features() -> Map<String, Value> {
    let mut rng = rand::rng();
    FEATURE_NAMES
        .iter()
        .map(|name| (name.to_string(), Value::from(rng.random_range(0.0..FEATURE_MAX))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_correlation_id_is_unique() {
        let a = generate_correlation_id();
        let b = generate_correlation_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_synthetic_features_shape() {
        let features = synthetic_features();
        assert_eq!(features.len(), 2);
        for name in FEATURE_NAMES {
            let value = features[name].as_f64().unwrap();
            assert!((0.0..FEATURE_MAX).contains(&value));
        }
    }
}
