//! The per-snapshot `options` JSON bag and its allow-list.
//!
//! Per spec §9: "the allow-list `MUTABLE_OPTIONS` is the contract with the
//! rest of the system. Reject unknown keys at config load, not at snapshot
//! apply time." `SnapshotOptions::parse` is therefore the single place that
//! validates a freeform JSON document against the allow-list.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::TypesError;

/// Keys the Recorder is allowed to override per-snapshot (spec §9, §4.9
/// step 2). Anything else found in a snapshot's `options` column, or in a
/// config patch applied to one, is a load-time error.
pub const MUTABLE_OPTIONS: &[&str] = &[
    "encoding",
    "plugin_load_wait",
    "cache_wait",
    "min_duration",
    "max_duration",
    "wait_after_load",
    "wait_per_scroll",
    "plugin_sync_mode",
    "scroll_step",
];

/// A validated, per-snapshot options patch. Holds only keys from
/// [`MUTABLE_OPTIONS`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotOptions(BTreeMap<String, Value>);

impl SnapshotOptions {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Parse a JSON object, rejecting any key outside [`MUTABLE_OPTIONS`].
    pub fn parse(value: &Value) -> Result<Self, TypesError> {
        let object = value
            .as_object()
            .ok_or_else(|| TypesError::InvalidOptionValue {
                key: "<root>".to_string(),
                reason: "options must be a JSON object".to_string(),
            })?;
        let mut map = BTreeMap::new();
        for (key, v) in object {
            if !MUTABLE_OPTIONS.contains(&key.as_str()) {
                return Err(TypesError::UnknownOption(key.clone()));
            }
            map.insert(key.clone(), v.clone());
        }
        Ok(Self(map))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Apply this patch over a base document, overwriting only the keys it
    /// carries. Used to layer a snapshot's mutable overrides on top of the
    /// worker's static config before a capture (spec §4.9 step 2).
    pub fn apply_over(&self, base: &Value) -> Value {
        let mut merged = base.clone();
        if let Value::Object(ref mut map) = merged {
            for (k, v) in &self.0 {
                map.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_known_keys() {
        let opts = SnapshotOptions::parse(&json!({"encoding": "shift_jis", "cache_wait": 5.0})).unwrap();
        assert_eq!(opts.get_str("encoding"), Some("shift_jis"));
        assert_eq!(opts.get_f64("cache_wait"), Some(5.0));
    }

    #[test]
    fn rejects_unknown_key() {
        let err = SnapshotOptions::parse(&json!({"not_a_real_option": 1})).unwrap_err();
        assert!(matches!(err, TypesError::UnknownOption(k) if k == "not_a_real_option"));
    }

    #[test]
    fn apply_over_overwrites_only_patched_keys() {
        let base = json!({"encoding": "utf-8", "cache_wait": 3.0, "untouched": true});
        let opts = SnapshotOptions::parse(&json!({"encoding": "shift_jis"})).unwrap();
        let merged = opts.apply_over(&base);
        assert_eq!(merged["encoding"], "shift_jis");
        assert_eq!(merged["cache_wait"], 3.0);
        assert_eq!(merged["untouched"], true);
    }
}
