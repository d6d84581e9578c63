use chrono::{DateTime, Duration, Utc};

use crate::cluster::QueryCount;
use crate::config::{ConfigError, DEFAULT_MIN_QUERY_CHARS};
use crate::normalize;
use crate::parser::SearchLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOpts {
    pub recency_window: Duration,
    pub min_items_found: u32,
    pub max_items_found: u32,
    pub min_query_chars: usize,
}

impl Default for FilterOpts {
    fn default() -> Self {
        crate::config::TrendingConfig::default().filter_opts()
    }
}

impl FilterOpts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recency_window <= Duration::zero() {
            return Err(ConfigError::NonPositiveWindow(self.recency_window.num_seconds()));
        }
        if self.min_items_found > self.max_items_found {
            return Err(ConfigError::InvertedItemsBand {
                min: self.min_items_found,
                max: self.max_items_found,
            });
        }
        Ok(())
    }

    fn keeps(&self, entry: &SearchLogEntry, now: DateTime<Utc>) -> bool {
        // Entries stamped after `now` have a negative age and stay in the window.
        let age = now.signed_duration_since(entry.searched_at);
        age <= self.recency_window
            && entry.items_found >= self.min_items_found
            && entry.items_found <= self.max_items_found
    }
}

/// Count surviving normalized queries, with the default minimum query length.
pub fn filter(
    entries: &[SearchLogEntry],
    recency_window: Duration,
    min_items_found: u32,
    max_items_found: u32,
    now: DateTime<Utc>,
) -> Result<QueryCount, ConfigError> {
    let opts = FilterOpts {
        recency_window,
        min_items_found,
        max_items_found,
        min_query_chars: DEFAULT_MIN_QUERY_CHARS,
    };
    filter_with_opts(entries, &opts, now)
}

pub fn filter_with_opts(
    entries: &[SearchLogEntry],
    opts: &FilterOpts,
    now: DateTime<Utc>,
) -> Result<QueryCount, ConfigError> {
    opts.validate()?;
    let mut counts = QueryCount::new();
    let mut in_band = 0usize;
    for entry in entries.iter().filter(|e| opts.keeps(e, now)) {
        in_band += 1;
        if let Some(q) = normalize::clean_query(&entry.query, opts.min_query_chars) {
            *counts.entry(q).or_insert(0) += 1;
        }
    }
    tracing::debug!(
        entries = entries.len(),
        in_band,
        distinct = counts.len(),
        "filtered search log"
    );
    Ok(counts)
}
