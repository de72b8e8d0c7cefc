//! Join configuration.

use serde::{Deserialize, Serialize};
use tabulax_distance::DistanceOptions;

/// What happens to a source row with no target within the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Leave the row out of the joined data.
    Omit,
    /// Keep the row with null target fields.
    #[default]
    Flag,
}

/// Fuzzy join settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinOptions {
    /// Largest accepted distance, inclusive. Text categories use its floor.
    pub max_distance: f64,
    /// Text normalization before comparing values.
    pub distance: DistanceOptions,
    pub unmatched: UnmatchedPolicy,
    /// Prefix for target columns in joined rows.
    pub target_prefix: String,
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0,
            distance: DistanceOptions::default(),
            unmatched: UnmatchedPolicy::Flag,
            target_prefix: "target_".to_string(),
            workers: None,
        }
    }
}

impl JoinOptions {
    /// Ignores case and surrounding or repeated whitespace.
    pub fn lenient() -> Self {
        Self {
            distance: DistanceOptions::lenient(),
            ..Self::default()
        }
    }

    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_distance(mut self, distance: DistanceOptions) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_unmatched(mut self, unmatched: UnmatchedPolicy) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = prefix.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
}
