use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One persisted search-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub query: String,
    pub searched_at: DateTime<Utc>,
    pub items_found: u32,
}

impl SearchLogEntry {
    pub fn new(query: impl Into<String>, searched_at: DateTime<Utc>, items_found: u32) -> Self {
        Self { session_id: None, query: query.into(), searched_at, items_found }
    }
}

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("row is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a JSON object row")]
    NotObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has unexpected type, expected {expected}")]
    WrongType { field: &'static str, expected: &'static str },
    #[error("unparseable searched_at: {0}")]
    BadTimestamp(String),
    #[error("items_found must be a non-negative integer, got {0}")]
    BadItemsFound(String),
}

/// Decode a JSON-lines search-log row.
///
/// `searched_at` may be RFC 3339, naive ISO 8601 (read as UTC) or an epoch
/// number (10/13/16 digits for seconds/millis/micros), as string or number.
pub fn parse_entry(line: &str) -> Result<SearchLogEntry, EntryError> {
    let v: Value = serde_json::from_str(line.trim())?;
    let obj = match v {
        Value::Object(map) => map,
        _ => return Err(EntryError::NotObject),
    };

    let query = match obj.get("query") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(EntryError::WrongType { field: "query", expected: "string" }),
        None => return Err(EntryError::MissingField("query")),
    };

    let searched_at = match obj.get("searched_at") {
        Some(Value::String(s)) => parse_ts_candidate(s).ok_or_else(|| EntryError::BadTimestamp(s.clone()))?,
        Some(Value::Number(n)) => {
            let s = n.to_string();
            parse_ts_number_string(&s).ok_or(EntryError::BadTimestamp(s))?
        }
        Some(_) => return Err(EntryError::WrongType { field: "searched_at", expected: "string or number" }),
        None => return Err(EntryError::MissingField("searched_at")),
    };

    // Rows written before a search completed carry no count; treat as zero like the writer does.
    let items_found = match obj.get("items_found") {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .ok_or_else(|| EntryError::BadItemsFound(n.to_string()))?,
        Some(other) => return Err(EntryError::BadItemsFound(other.to_string())),
    };

    let session_id = match obj.get("session_id") {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };

    Ok(SearchLogEntry { session_id, query, searched_at, items_found })
}

pub fn parse_ts_candidate(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    parse_ts_string(s).or_else(|| parse_ts_number_string(s))
}

fn parse_ts_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offsets without a colon (+0700) are not RFC 3339
    let with_offset = [
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S%z",
    ];
    for f in with_offset.iter() {
        if let Ok(dt) = DateTime::parse_from_str(s, f) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    // isoformat() without tzinfo
    let naive = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    for f in naive.iter() {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

fn parse_ts_number_string(s: &str) -> Option<DateTime<Utc>> {
    let digits_only = !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits_only { return None; }
    match s.len() {
        10 => s.parse::<i64>().ok().and_then(epoch_secs_to_dt),
        13 => s.parse::<i64>().ok().and_then(epoch_millis_to_dt),
        16 => s.parse::<i64>().ok().and_then(epoch_micros_to_dt),
        _ => None,
    }
}

fn epoch_secs_to_dt(sec: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(sec, 0)
}
fn epoch_millis_to_dt(ms: i64) -> Option<DateTime<Utc>> {
    let secs = ms.div_euclid(1000);
    let nsub = ms.rem_euclid(1000) as u32 * 1_000_000;
    DateTime::<Utc>::from_timestamp(secs, nsub)
}
fn epoch_micros_to_dt(us: i64) -> Option<DateTime<Utc>> {
    let secs = us.div_euclid(1_000_000);
    let nsub = us.rem_euclid(1_000_000) as u32 * 1_000;
    DateTime::<Utc>::from_timestamp(secs, nsub)
}
