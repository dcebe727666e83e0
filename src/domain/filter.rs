use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;

use crate::error::{Error, Result};

/// Timestamp layout the store's query language expects.
const QUERY_TIME_FORMAT: &str = "%m/%d/%Y %H:%M %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchMode {
    #[value(name = "UNREAD")]
    Unread,
    #[value(name = "DATE")]
    Date,
    #[value(name = "RANGE")]
    Range,
}

/// What the caller asked to select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub mode: SearchMode,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub subject_substring: Option<String>,
}

impl FilterSpec {
    /// Builds a spec from the raw command line values, where dates are
    /// `YYYY-MM-DD` or `none` and an empty subject means no subject filter.
    /// A date is only parsed in the modes that read it: the start date in
    /// DATE and RANGE, the end date in RANGE.
    pub fn from_args(mode: SearchMode, start: &str, end: &str, subject: &str) -> Result<Self> {
        let start_date = match mode {
            SearchMode::Date | SearchMode::Range => parse_date_arg("start_date", start)?,
            SearchMode::Unread => None,
        };
        let end_date = match mode {
            SearchMode::Range => parse_date_arg("end_date", end)?,
            SearchMode::Unread | SearchMode::Date => None,
        };
        Ok(Self {
            mode,
            start_date,
            end_date,
            subject_substring: (!subject.is_empty()).then(|| subject.to_string()),
        })
    }
}

pub fn parse_date_arg(field: &'static str, value: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::InvalidDate {
            field,
            value: value.to_string(),
        })
}

/// Half-open local-time window `[from, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedRange {
    pub from: NaiveDateTime,
    pub until: NaiveDateTime,
}

impl ReceivedRange {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.from <= at && at < self.until
    }
}

/// Structured predicate over folder items. `Display` gives the textual
/// form understood by the desktop store's restrict operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restriction {
    pub unread_only: bool,
    pub received: Option<ReceivedRange>,
    pub subject_contains: Option<String>,
}

impl Restriction {
    pub fn is_empty(&self) -> bool {
        !self.unread_only && self.received.is_none() && self.subject_contains.is_none()
    }

    /// Subject matching is case-insensitive, like the store's own LIKE.
    pub fn matches(&self, unread: bool, received: NaiveDateTime, subject: &str) -> bool {
        if self.unread_only && !unread {
            return false;
        }
        if let Some(range) = &self.received
            && !range.contains(received)
        {
            return false;
        }
        match &self.subject_contains {
            Some(needle) => subject.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Maps a [`FilterSpec`] onto the predicate handed to the store.
pub fn build_filter(spec: &FilterSpec) -> Restriction {
    let mut restriction = Restriction {
        subject_contains: spec.subject_substring.clone(),
        ..Restriction::default()
    };

    match spec.mode {
        SearchMode::Unread => restriction.unread_only = true,
        SearchMode::Date | SearchMode::Range => {
            if let Some(start) = spec.start_date {
                let last_day = match (spec.mode, spec.end_date) {
                    (SearchMode::Range, Some(end)) => end,
                    _ => start,
                };
                let until = last_day.succ_opt().unwrap_or(NaiveDate::MAX);
                restriction.received = Some(ReceivedRange {
                    from: start.and_time(chrono::NaiveTime::MIN),
                    until: until.and_time(chrono::NaiveTime::MIN),
                });
            }
        }
    }

    restriction
}

fn query_time(at: &NaiveDateTime) -> String {
    at.format(QUERY_TIME_FORMAT).to_string()
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        // Jet and DASL cannot be mixed in one restriction, and only DASL
        // can express a substring match.
        if let Some(subject) = &self.subject_contains {
            if self.unread_only {
                parts.push("\"urn:schemas:httpmail:read\" = 0".to_string());
            }
            if let Some(range) = &self.received {
                parts.push(format!(
                    "\"urn:schemas:httpmail:datereceived\" >= '{}'",
                    query_time(&range.from)
                ));
                parts.push(format!(
                    "\"urn:schemas:httpmail:datereceived\" < '{}'",
                    query_time(&range.until)
                ));
            }
            parts.push(format!(
                "\"urn:schemas:httpmail:subject\" LIKE '%{}%'",
                subject.replace('\'', "''")
            ));
            return write!(f, "@SQL={}", parts.join(" AND "));
        }

        if self.unread_only {
            parts.push("[Unread] = true".to_string());
        }
        if let Some(range) = &self.received {
            parts.push(format!("[ReceivedTime] >= '{}'", query_time(&range.from)));
            parts.push(format!("[ReceivedTime] < '{}'", query_time(&range.until)));
        }
        write!(f, "{}", parts.join(" AND "))
    }
}
