use crate::store::StoreScope;
use anyhow::{anyhow, Context, Result};
use playground_resolver::{MatchThresholds, DEFAULT_PREVIEW_LENGTH};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::Path;

pub const DEFAULT_MAP_KEY: &str = "playground.map";
pub const DEFAULT_PIN_KEY: &str = "playground.pin";
const DEFAULT_PARSE_CACHE_CAPACITY: usize = 32;
const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaygroundConfig {
    pub thresholds: MatchThresholds,
    pub preview_length: usize,
    pub parse_cache_capacity: NonZeroUsize,
    pub queue_capacity: usize,
    pub scope: StoreScope,
    pub map_key: String,
    pub pin_key: String,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            thresholds: MatchThresholds::default(),
            preview_length: DEFAULT_PREVIEW_LENGTH,
            parse_cache_capacity: NonZeroUsize::new(DEFAULT_PARSE_CACHE_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            scope: StoreScope::Workspace,
            map_key: DEFAULT_MAP_KEY.to_string(),
            pin_key: DEFAULT_PIN_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    thresholds: Option<RawThresholds>,
    preview_length: Option<usize>,
    parse_cache_capacity: Option<usize>,
    queue_capacity: Option<usize>,
    scope: Option<StoreScope>,
    map_key: Option<String>,
    pin_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThresholds {
    by_path: Option<f64>,
    by_distance: Option<f64>,
    max_distance_ratio: Option<f64>,
}

impl PlaygroundConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_bytes(&bytes)
            .with_context(|| format!("Invalid playground config {}", path.display()))
    }

    /// Accepts JSON or TOML; absent fields keep their defaults.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_raw(parse_raw(bytes)?)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let defaults = Self::default();

        let raw_thresholds = raw.thresholds.unwrap_or_default();
        let thresholds = MatchThresholds {
            by_path: raw_thresholds.by_path.unwrap_or(defaults.thresholds.by_path),
            by_distance: raw_thresholds
                .by_distance
                .unwrap_or(defaults.thresholds.by_distance),
            max_distance_ratio: raw_thresholds
                .max_distance_ratio
                .unwrap_or(defaults.thresholds.max_distance_ratio),
        };
        thresholds.validate()?;

        let preview_length = raw.preview_length.unwrap_or(defaults.preview_length);
        if preview_length < 2 {
            return Err(anyhow!(
                "preview_length must be at least 2 (got {preview_length})"
            ));
        }

        let parse_cache_capacity = match raw.parse_cache_capacity {
            Some(capacity) => NonZeroUsize::new(capacity)
                .ok_or_else(|| anyhow!("parse_cache_capacity must be positive"))?,
            None => defaults.parse_cache_capacity,
        };

        let queue_capacity = raw.queue_capacity.unwrap_or(defaults.queue_capacity);
        if queue_capacity == 0 {
            return Err(anyhow!("queue_capacity must be positive"));
        }

        let map_key = non_empty_key("map_key", raw.map_key, defaults.map_key)?;
        let pin_key = non_empty_key("pin_key", raw.pin_key, defaults.pin_key)?;
        if map_key == pin_key {
            return Err(anyhow!("map_key and pin_key must differ (both {map_key:?})"));
        }

        Ok(Self {
            thresholds,
            preview_length,
            parse_cache_capacity,
            queue_capacity,
            scope: raw.scope.unwrap_or(defaults.scope),
            map_key,
            pin_key,
        })
    }
}

fn non_empty_key(name: &str, value: Option<String>, default: String) -> Result<String> {
    match value {
        None => Ok(default),
        Some(key) if key.trim().is_empty() => Err(anyhow!("{name} must not be empty")),
        Some(key) => Ok(key),
    }
}

fn parse_raw(bytes: &[u8]) -> Result<RawConfig> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                anyhow!("Config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}")
            })?;
            serde_json::to_value(toml_value)
                .map_err(|err| anyhow!("Failed to convert TOML config to JSON: {err}"))?
        }
    };
    serde_json::from_value(value).map_err(|err| anyhow!("Config parse error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_resolver::ResolverError;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_json_object_yields_defaults() {
        let cfg = PlaygroundConfig::from_bytes(b"{}").expect("config");
        assert_eq!(cfg, PlaygroundConfig::default());
        assert_eq!(cfg.preview_length, 160);
        assert_eq!(cfg.map_key, "playground.map");
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let cfg = PlaygroundConfig::from_bytes(
            br#"
scope = "global"
preview_length = 80

[thresholds]
by_distance = 0.5
"#,
        )
        .expect("config");

        assert_eq!(cfg.scope, StoreScope::Global);
        assert_eq!(cfg.preview_length, 80);
        assert_eq!(cfg.thresholds.by_distance, 0.5);
        assert_eq!(cfg.thresholds.by_path, 0.6);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for bad in [
            r#"{"thresholds": {"by_path": 1.5}}"#,
            r#"{"parse_cache_capacity": 0}"#,
            r#"{"queue_capacity": 0}"#,
            r#"{"map_key": "  "}"#,
            r#"{"map_key": "same", "pin_key": "same"}"#,
            r#"{"unknown": true}"#,
        ] {
            assert!(
                PlaygroundConfig::from_bytes(bad.as_bytes()).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn threshold_errors_keep_their_type() {
        let err = PlaygroundConfig::from_bytes(br#"{"thresholds": {"by_distance": -0.1}}"#)
            .expect_err("negative threshold");

        assert_eq!(
            err.downcast_ref::<ResolverError>(),
            Some(&ResolverError::InvalidThreshold {
                name: "by_distance",
                value: -0.1,
            })
        );
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("playground.toml");
        std::fs::write(&path, "queue_capacity = 8\n").expect("write");

        let cfg = PlaygroundConfig::from_file(&path).expect("config");
        assert_eq!(cfg.queue_capacity, 8);
    }
}
