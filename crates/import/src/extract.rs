use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use momo_core::{Amount, EntryError};
use regex::Regex;
use rust_decimal::Decimal;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_amount,
    r"(\d+(?:,\d{3})*(?:\.\d+)?)\s*RWF");
re!(re_from_party,
    r"(?i)\bfrom\s+([^()\d]+?)\s*\(");
re!(re_to_party,
    r"(?i)\bto\s+([a-z][a-z.'\-]*(?:\s+[a-z][a-z.'\-]*){0,3}?)\s*(?:\(|\d)");

// ── Amount ────────────────────────────────────────────────────────────────────

/// Finds the first number quoted in RWF, e.g. `"2,000 RWF"` → 2000.
///
/// Returns `None` when the message carries no amount, which is normal for
/// failure and reversal alerts.
pub fn extract_amount(message: &str) -> Option<Amount> {
    let c = re_amount().captures(message)?;
    let digits = c.get(1)?.as_str().replace(',', "");
    Amount::new(Decimal::from_str(&digits).ok()?)
}

// ── Timestamps ────────────────────────────────────────────────────────────────

/// Converts epoch milliseconds to a UTC timestamp, dropping the milliseconds.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(millis.div_euclid(1000), 0)
}

/// Parses the raw value of a `date`/`date_sent` attribute.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, EntryError> {
    parse_timestamp_attr("date", raw)
}

pub(crate) fn parse_timestamp_attr(
    attribute: &'static str,
    raw: &str,
) -> Result<DateTime<Utc>, EntryError> {
    let malformed = || EntryError::MalformedTimestamp {
        attribute,
        value: raw.to_string(),
    };
    let millis: i64 = raw.trim().parse().map_err(|_| malformed())?;
    from_epoch_millis(millis).ok_or_else(malformed)
}

// ── Counterparty ──────────────────────────────────────────────────────────────

/// Picks the other party's name out of "from NAME (…" or "to NAME 123…".
pub fn extract_counterparty(message: &str) -> Option<String> {
    let c = re_from_party()
        .captures(message)
        .or_else(|| re_to_party().captures(message))?;
    let name = c.get(1)?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
