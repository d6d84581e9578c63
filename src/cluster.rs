use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::{
    ConfigError, DEFAULT_CANDIDATE_LIMIT, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_N,
};
use crate::similarity::{Similarity, TokenSortRatio};

/// Normalized query -> occurrence count. Ordered by code point, which is what
/// makes pivot extraction deterministic.
pub type QueryCount = BTreeMap<String, usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Formation order: pivot first, then merged candidates by descending score.
    pub members: Vec<String>,
    pub canonical: String,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedQuery {
    pub query: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOpts {
    pub similarity_threshold: u32,
    pub candidate_limit: usize,
    pub top_n: usize,
}

impl Default for RankOpts {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl RankOpts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.similarity_threshold > 100 {
            return Err(ConfigError::ThresholdOutOfRange(self.similarity_threshold));
        }
        if self.candidate_limit == 0 {
            return Err(ConfigError::ZeroCandidateLimit(self.candidate_limit));
        }
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN(self.top_n));
        }
        Ok(())
    }
}

/// Rank with the default token-sort metric.
pub fn rank(
    counts: &QueryCount,
    similarity_threshold: u32,
    candidate_limit: usize,
    top_n: usize,
) -> Result<Vec<RankedQuery>, ConfigError> {
    let opts = RankOpts { similarity_threshold, candidate_limit, top_n };
    rank_with(counts, &opts, &TokenSortRatio)
}

pub fn rank_with(
    counts: &QueryCount,
    opts: &RankOpts,
    metric: &dyn Similarity,
) -> Result<Vec<RankedQuery>, ConfigError> {
    opts.validate()?;
    let mut clusters = cluster_queries(counts, opts.similarity_threshold, opts.candidate_limit, metric);
    // Vec::sort_by is stable: equal totals keep discovery order.
    clusters.sort_by(|a, b| b.total.cmp(&a.total));
    let produced = clusters.len();
    clusters.truncate(opts.top_n);
    tracing::debug!(
        metric = metric.name(),
        distinct = counts.len(),
        clusters = produced,
        returned = clusters.len(),
        "ranked queries"
    );
    Ok(clusters
        .into_iter()
        .map(|c| RankedQuery { query: c.canonical, count: c.total })
        .collect())
}

/// Greedy partition of `counts` into near-duplicate clusters, in discovery order.
///
/// Each round takes the smallest unvisited query (code-point order) as pivot,
/// scores it against every other unvisited query, keeps the `candidate_limit`
/// best (equal scores keep code-point order) and merges those scoring
/// strictly above `threshold`.
pub fn cluster_queries(
    counts: &QueryCount,
    threshold: u32,
    candidate_limit: usize,
    metric: &dyn Similarity,
) -> Vec<Cluster> {
    let mut unvisited: BTreeSet<&str> = counts.keys().map(|k| k.as_str()).collect();
    let mut clusters = Vec::new();
    let cutoff = threshold as f64;

    while let Some(pivot) = unvisited.pop_first() {
        let mut scored: Vec<(&str, f64)> = unvisited
            .iter()
            .map(|&cand| (cand, metric.score(pivot, cand)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(candidate_limit);

        let mut members = vec![pivot.to_string()];
        for (cand, score) in scored {
            if score > cutoff {
                unvisited.remove(cand);
                members.push(cand.to_string());
            }
        }
        clusters.push(build_cluster(members, counts));
    }
    clusters
}

fn build_cluster(members: Vec<String>, counts: &QueryCount) -> Cluster {
    let total = members.iter().map(|m| counts.get(m).copied().unwrap_or(0)).sum();
    // First longest member wins; max_by_key would return the last one.
    let mut canonical = &members[0];
    for m in &members[1..] {
        if m.chars().count() > canonical.chars().count() {
            canonical = m;
        }
    }
    let canonical = canonical.clone();
    Cluster { members, canonical, total }
}
