use std::sync::mpsc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::{self, QueryCount, RankedQuery};
use crate::config::{ConfigError, TrendingConfig};
use crate::filter;
use crate::similarity::{Similarity, TokenSortRatio};
use crate::source::{RowError, SearchLogSource, SourceError};

const MAX_ERROR_SAMPLES: usize = 5;

#[derive(Debug, Error)]
pub enum TrendingError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("ranking did not finish within {0:?}")]
    DeadlineExceeded(StdDuration),
    #[error("ranking worker exited without a result")]
    WorkerLost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub now: String,
    pub window_start: String,
    pub fetched_entries: usize,
    pub distinct_queries: usize,
    pub total_searches: usize,
    pub metric: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorsOut {
    pub total: usize,
    pub samples: Vec<RowError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingOut {
    pub summary: Summary,
    pub queries: Vec<RankedQuery>,
    pub errors: ErrorsOut,
}

/// Fetch, filter and rank with the default metric.
pub fn top_queries<S: SearchLogSource + ?Sized>(
    source: &S,
    config: &TrendingConfig,
    now: DateTime<Utc>,
) -> Result<TrendingOut, TrendingError> {
    top_queries_with(source, config, &TokenSortRatio, now)
}

pub fn top_queries_with<S: SearchLogSource + ?Sized>(
    source: &S,
    config: &TrendingConfig,
    metric: &dyn Similarity,
    now: DateTime<Utc>,
) -> Result<TrendingOut, TrendingError> {
    // Reject bad configuration before touching the source.
    config.validate()?;
    let window_start = now
        .checked_sub_signed(config.recency_window())
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let batch = source.fetch(window_start)?;

    let counts: QueryCount = filter::filter_with_opts(&batch.entries, &config.filter_opts(), now)?;
    let queries = cluster::rank_with(&counts, &config.rank_opts(), metric)?;

    let summary = Summary {
        now: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        window_start: window_start.to_rfc3339_opts(SecondsFormat::Secs, true),
        fetched_entries: batch.entries.len(),
        distinct_queries: counts.len(),
        total_searches: counts.values().sum(),
        metric: metric.name().to_string(),
    };
    let errors = ErrorsOut {
        total: batch.skipped.len(),
        samples: batch.skipped.into_iter().take(MAX_ERROR_SAMPLES).collect(),
    };
    Ok(TrendingOut { summary, queries, errors })
}

/// Run `job` on a worker thread and give up after `deadline`.
///
/// The core has no cancellation points, so a late worker is abandoned: it runs
/// to completion in the background and its result is dropped.
pub fn run_with_deadline<T, F>(deadline: StdDuration, job: F) -> Result<T, TrendingError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, TrendingError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        // Receiver may be gone after a timeout
        let _ = tx.send(job());
    });
    match rx.recv_timeout(deadline) {
        Ok(res) => res,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::warn!(?deadline, "abandoning slow ranking job");
            Err(TrendingError::DeadlineExceeded(deadline))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(TrendingError::WorkerLost),
    }
}
