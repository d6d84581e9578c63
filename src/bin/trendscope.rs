use std::sync::Once;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use trendscope::config::{self, TrendingConfig};
use trendscope::similarity;
use trendscope::source::JsonlLog;
use trendscope::trending::{self, TrendingOut};

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_tracing() {
    // stderr keeps stdout clean for the report
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser, Debug)]
#[command(name = "trendscope", version, about = "Rank trending searches from search-log rows")]
struct Cli {
    /// JSON-lines search-log files (`-` for stdin). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// Recency window in days
    #[arg(long = "window-days", env = "TRENDSCOPE_WINDOW_DAYS", default_value_t = config::DEFAULT_WINDOW_DAYS)]
    window_days: i64,
    #[arg(long = "min-items", env = "TRENDSCOPE_MIN_ITEMS", default_value_t = config::DEFAULT_MIN_ITEMS_FOUND)]
    min_items: u32,
    #[arg(long = "max-items", env = "TRENDSCOPE_MAX_ITEMS", default_value_t = config::DEFAULT_MAX_ITEMS_FOUND)]
    max_items: u32,
    /// Shortest normalized query that is counted
    #[arg(long = "min-chars", env = "TRENDSCOPE_MIN_CHARS", default_value_t = config::DEFAULT_MIN_QUERY_CHARS)]
    min_chars: usize,
    /// Merge queries scoring strictly above this (0-100)
    #[arg(long = "threshold", env = "TRENDSCOPE_THRESHOLD", default_value_t = config::DEFAULT_SIMILARITY_THRESHOLD)]
    threshold: u32,
    #[arg(long = "candidate-limit", env = "TRENDSCOPE_CANDIDATE_LIMIT", default_value_t = config::DEFAULT_CANDIDATE_LIMIT)]
    candidate_limit: usize,
    #[arg(long = "top", env = "TRENDSCOPE_TOP_N", default_value_t = config::DEFAULT_TOP_N)]
    top: usize,
    /// Similarity metric: token-sort | indel | levenshtein
    #[arg(long = "metric", env = "TRENDSCOPE_METRIC", default_value = "token-sort")]
    metric: String,
    /// Reference time (RFC 3339); defaults to the current time
    #[arg(long = "now")]
    now: Option<String>,
    /// Abandon ranking after this many milliseconds
    #[arg(long = "timeout-ms", env = "TRENDSCOPE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
    /// Output format: auto | json | table
    #[arg(long = "format", default_value = "auto")]
    format: String,
}

impl Cli {
    fn config(&self) -> TrendingConfig {
        TrendingConfig {
            window_days: self.window_days,
            min_items_found: self.min_items,
            max_items_found: self.max_items,
            min_query_chars: self.min_chars,
            similarity_threshold: self.threshold,
            candidate_limit: self.candidate_limit,
            top_n: self.top,
        }
    }

    fn now(&self) -> anyhow::Result<DateTime<Utc>> {
        match self.now.as_deref() {
            Some(s) => Ok(DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("invalid --now value: {s}"))?
                .with_timezone(&Utc)),
            None => Ok(Utc::now()),
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    init_parallelism();
    let cli = Cli::parse();

    let cfg = cli.config();
    cfg.validate().context("invalid configuration")?;
    let metric = similarity::by_name(&cli.metric)
        .with_context(|| format!("unknown metric: {}", cli.metric))?;
    let now = cli.now()?;
    let table = table_output(&cli.format, atty::is(atty::Stream::Stdout))?;

    // Default to stdin if no input specified
    let source = if cli.input.is_empty() {
        JsonlLog::stdin()
    } else {
        JsonlLog::new(cli.input.iter().cloned())
    };

    let out = match cli.timeout_ms {
        Some(ms) => trending::run_with_deadline(Duration::from_millis(ms), move || {
            trending::top_queries_with(&source, &cfg, metric.as_ref(), now)
        })?,
        None => trending::top_queries_with(&source, &cfg, metric.as_ref(), now)?,
    };

    if table {
        print_table(&out);
    } else {
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

/// `auto` picks a table for terminals and JSON for pipes.
fn table_output(format: &str, stdout_is_tty: bool) -> anyhow::Result<bool> {
    match format {
        "table" => Ok(true),
        "json" => Ok(false),
        "auto" => Ok(stdout_is_tty),
        other => anyhow::bail!("unknown output format: {other} (expected auto, json or table)"),
    }
}

fn print_table(out: &TrendingOut) {
    println!("{:<6} {:<8} {}", "Rank", "Count", "Query");
    for (i, q) in out.queries.iter().enumerate() {
        println!("{:<6} {:<8} {}", i + 1, q.count, q.query);
    }
    println!(
        "\n{} searches, {} distinct, window from {}",
        out.summary.total_searches, out.summary.distinct_queries, out.summary.window_start
    );
    if out.errors.total > 0 {
        eprintln!("{} malformed rows skipped", out.errors.total);
    }
}
