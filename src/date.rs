use anyhow::{anyhow, Result};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Simple "YYYY-MM" utility with safe arithmetic and ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u8, // 1..=12
}

impl YearMonth {
    pub fn new(year: i32, month: u8) -> Self {
        assert!((1..=12).contains(&month), "Month must be 1..=12");
        Self { year, month }
    }
    pub fn next(self) -> Self {
        if self.month < 12 {
            Self { year: self.year, month: self.month + 1 }
        } else {
            Self { year: self.year + 1, month: 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Calendar fields derived from a post timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PostDate {
    pub year: i32,
    pub month: u8,
    /// ISO 8601 week number (1..=53).
    pub week: u8,
}

impl PostDate {
    pub fn from_epoch(ts: i64) -> Result<Self> {
        let dt = OffsetDateTime::from_unix_timestamp(ts)
            .map_err(|e| anyhow!("timestamp {} out of range: {}", ts, e))?;
        Ok(Self {
            year: dt.year(),
            month: dt.month() as u8,
            week: dt.iso_week(),
        })
    }
    pub fn year_month(&self) -> YearMonth {
        YearMonth { year: self.year, month: self.month }
    }
}

/// Parse a timestamp cell: integer or fractional unix seconds, or an RFC 3339 string.
pub fn parse_timestamp(raw: &str) -> Result<i64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    if let Ok(v) = s.parse::<f64>() {
        if v.is_finite() {
            return Ok(v.floor() as i64);
        }
    }
    OffsetDateTime::parse(s, &Rfc3339)
        .map(|dt| dt.unix_timestamp())
        .map_err(|_| anyhow!("unparseable timestamp {:?}", raw))
}

/// Inclusive iteration from `start` to `end` (if `start` <= `end`), else empty.
pub fn iter_year_months(start: YearMonth, end: YearMonth) -> impl Iterator<Item = YearMonth> {
    let mut curr = if start <= end { Some(start) } else { None };
    std::iter::from_fn(move || {
        let ret = curr?;
        curr = Some(ret.next()).filter(|n| *n <= end);
        Some(ret)
    })
}
