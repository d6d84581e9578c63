use chrono::{Duration, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::RankOpts;
use crate::filter::FilterOpts;

pub const DEFAULT_WINDOW_DAYS: i64 = 14;
pub const DEFAULT_MIN_ITEMS_FOUND: u32 = 1;
pub const DEFAULT_MAX_ITEMS_FOUND: u32 = 10;
pub const DEFAULT_MIN_QUERY_CHARS: usize = 4;
pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 85;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 20;
pub const DEFAULT_TOP_N: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("recency_window must be positive, got {0} seconds")]
    NonPositiveWindow(i64),
    #[error("min_items_found ({min}) must not exceed max_items_found ({max})")]
    InvertedItemsBand { min: u32, max: u32 },
    #[error("similarity_threshold must be within 0..=100, got {0}")]
    ThresholdOutOfRange(u32),
    #[error("candidate_limit must be at least 1, got {0}")]
    ZeroCandidateLimit(usize),
    #[error("top_n must be at least 1, got {0}")]
    ZeroTopN(usize),
}

/// All tunables of the trending pipeline. `Default` carries the system-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    pub window_days: i64,
    pub min_items_found: u32,
    pub max_items_found: u32,
    pub min_query_chars: usize,
    pub similarity_threshold: u32,
    pub candidate_limit: usize,
    pub top_n: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            min_items_found: DEFAULT_MIN_ITEMS_FOUND,
            max_items_found: DEFAULT_MAX_ITEMS_FOUND,
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl TrendingConfig {
    pub fn recency_window(&self) -> Duration {
        // Day counts beyond chrono's range saturate instead of panicking.
        Duration::try_days(self.window_days).unwrap_or_else(|| {
            if self.window_days < 0 { TimeDelta::MIN } else { TimeDelta::MAX }
        })
    }

    pub fn filter_opts(&self) -> FilterOpts {
        FilterOpts {
            recency_window: self.recency_window(),
            min_items_found: self.min_items_found,
            max_items_found: self.max_items_found,
            min_query_chars: self.min_query_chars,
        }
    }

    pub fn rank_opts(&self) -> RankOpts {
        RankOpts {
            similarity_threshold: self.similarity_threshold,
            candidate_limit: self.candidate_limit,
            top_n: self.top_n,
        }
    }

    /// Checks every parameter up front; the first offending one is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter_opts().validate()?;
        self.rank_opts().validate()
    }
}
