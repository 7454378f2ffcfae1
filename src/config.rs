//! Time window and query construction.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Fields requested for every message.
pub const MESSAGE_SELECT: &str = "id,subject,uniqueBody,sentDateTime";

/// Inclusive `sentDateTime` range, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::config(
                "start",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse both ends with [`parse_instant`].
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_instant("start", start)?, parse_instant("end", end)?)
    }

    /// Sent-items query for this window under `base_url`.
    pub fn sent_items_query(&self, base_url: &str) -> String {
        format!(
            "{}/me/mailFolders/SentItems/messages?$select={}&$filter=(sentDateTime ge {}) and (sentDateTime le {})",
            base_url.trim_end_matches('/'),
            MESSAGE_SELECT,
            iso8601(self.start),
            iso8601(self.end),
        )
    }
}

fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Accepts RFC 3339 (any offset, converted to UTC) or a bare `YYYY-MM-DD`,
/// which means midnight UTC.
pub fn parse_instant(key: &str, value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(Error::config(
        key,
        format!("`{value}` is neither an RFC 3339 timestamp nor a YYYY-MM-DD date"),
    ))
}
