use std::cell::Cell;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use trendscope::config::TrendingConfig;
use trendscope::source::{MemoryLog, SearchLogSource, SourceBatch, SourceError};
use trendscope::trending::{self, TrendingError};
use trendscope::{RankedQuery, SearchLogEntry};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn shop_log() -> MemoryLog {
    let rows = [
        ("ayam goreng", 1, 3),
        ("AYAM GORENG", 2, 5),
        ("goreng ayam", 3, 2),
        ("Susu Ultra", 1, 4),
        ("ultra  susu", 5, 4),
        ("susu ultra", 6, 4),
        ("ultra susu", 6, 4),
        ("kecap manis", 2, 1),
        ("x", 1, 2),
        ("promo", 1, 0),
        ("beras", 1, 50),
        ("chicken", 20, 4),
        ("diskon 50%", 1, 3),
    ];
    let mut log = MemoryLog::new();
    for (q, days, items) in rows {
        log.push(SearchLogEntry::new(q, now() - Duration::days(days), items));
    }
    log.push_line("not json at all");
    log
}

#[test]
fn end_to_end_top_queries() {
    let out = trending::top_queries(&shop_log(), &TrendingConfig::default(), now()).unwrap();
    assert_eq!(
        out.queries,
        vec![
            RankedQuery { query: "susu ultra".into(), count: 4 },
            RankedQuery { query: "ayam goreng".into(), count: 3 },
            RankedQuery { query: "kecap manis".into(), count: 1 },
        ]
    );
    assert_eq!(out.summary.distinct_queries, 5);
    assert_eq!(out.summary.total_searches, 8);
    assert_eq!(out.summary.now, "2024-06-15T12:00:00Z");
    assert_eq!(out.summary.window_start, "2024-06-01T12:00:00Z");
    assert_eq!(out.summary.metric, "token-sort");
    assert_eq!(out.errors.total, 1);
}

#[test]
fn top_n_limits_report() {
    let cfg = TrendingConfig { top_n: 1, ..Default::default() };
    let out = trending::top_queries(&shop_log(), &cfg, now()).unwrap();
    assert_eq!(out.queries.len(), 1);
    assert_eq!(out.queries[0].query, "susu ultra");
}

#[test]
fn empty_log_is_not_an_error() {
    let out = trending::top_queries(&MemoryLog::new(), &TrendingConfig::default(), now()).unwrap();
    assert!(out.queries.is_empty());
    assert_eq!(out.summary.total_searches, 0);
    assert_eq!(out.errors.total, 0);
}

struct CountingSource {
    calls: Cell<usize>,
}

impl SearchLogSource for CountingSource {
    fn fetch(&self, _since: DateTime<Utc>) -> Result<SourceBatch, SourceError> {
        self.calls.set(self.calls.get() + 1);
        Ok(SourceBatch::default())
    }
}

#[test]
fn invalid_config_fails_before_fetching() {
    let source = CountingSource { calls: Cell::new(0) };
    let cfg = TrendingConfig { similarity_threshold: 200, ..Default::default() };
    let err = trending::top_queries(&source, &cfg, now()).unwrap_err();
    assert!(matches!(err, TrendingError::Config(_)));
    assert_eq!(source.calls.get(), 0);
}

#[test]
fn report_serializes_to_json() {
    let out = trending::top_queries(&shop_log(), &TrendingConfig::default(), now()).unwrap();
    let v = serde_json::to_value(&out).unwrap();
    assert_eq!(v["queries"][0]["query"], "susu ultra");
    assert_eq!(v["queries"][0]["count"], 4);
    assert_eq!(v["errors"]["samples"][0]["line_number"], 14);
}

#[test]
fn deadline_returns_result_in_time() {
    let log = shop_log();
    let res = trending::run_with_deadline(StdDuration::from_secs(5), move || {
        trending::top_queries(&log, &TrendingConfig::default(), now())
    })
    .unwrap();
    assert_eq!(res.queries.len(), 3);
}

#[test]
fn deadline_abandons_slow_job() {
    let err = trending::run_with_deadline(StdDuration::from_millis(20), || {
        std::thread::sleep(StdDuration::from_millis(500));
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, TrendingError::DeadlineExceeded(_)));
}
