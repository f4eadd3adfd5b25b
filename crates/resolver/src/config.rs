use crate::{ResolverError, Result};
use serde::{Deserialize, Serialize};

/// Minimum matching score for reconciling against the entry at the same path.
pub const MATCH_BY_PATH_THRESHOLD: f64 = 0.6;

/// Minimum matching score for the workspace-wide search. Lower than the path tier so
/// renamed, moved and duplicated files still find their record.
pub const MATCH_BY_DISTANCE_THRESHOLD: f64 = 0.4;

/// Two prompts are "the same, edited" only while their distance ratio stays below this.
pub const MAX_PROMPT_DISTANCE_RATIO: f64 = 0.6;

/// Acceptance thresholds. The defaults are empirical and have no derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    pub by_path: f64,
    pub by_distance: f64,
    pub max_distance_ratio: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            by_path: MATCH_BY_PATH_THRESHOLD,
            by_distance: MATCH_BY_DISTANCE_THRESHOLD,
            max_distance_ratio: MAX_PROMPT_DISTANCE_RATIO,
        }
    }
}

impl MatchThresholds {
    pub fn validate(&self) -> Result<()> {
        validate_unit("by_path", self.by_path)?;
        validate_unit("by_distance", self.by_distance)?;
        validate_unit("max_distance_ratio", self.max_distance_ratio)?;
        Ok(())
    }
}

fn validate_unit(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ResolverError::InvalidThreshold { name, value })
    }
}
