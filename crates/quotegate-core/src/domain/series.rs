use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime, Time};

/// Column names produced by provider adapters.
pub mod columns {
    pub const OPEN: &str = "Open";
    pub const HIGH: &str = "High";
    pub const LOW: &str = "Low";
    pub const CLOSE: &str = "Close";
    pub const VOLUME: &str = "Volume";
}

/// Row timestamp. Daily-and-longer rows are date-only; intraday rows carry a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowTimestamp {
    Date(Date),
    DateTime(PrimitiveDateTime),
}

impl RowTimestamp {
    pub const fn date(self) -> Date {
        match self {
            Self::Date(date) => date,
            Self::DateTime(datetime) => datetime.date(),
        }
    }

    pub fn has_time_component(self) -> bool {
        match self {
            Self::Date(_) => false,
            Self::DateTime(datetime) => datetime.time() != Time::MIDNIGHT,
        }
    }

    /// `YYYY-MM-DD HH:MM:SS` when the time of day is nonzero, else `YYYY-MM-DD`.
    pub fn format(self) -> String {
        let date = self.date();
        let day = format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        );

        match self {
            Self::DateTime(datetime) if self.has_time_component() => format!(
                "{day} {:02}:{:02}:{:02}",
                datetime.hour(),
                datetime.minute(),
                datetime.second()
            ),
            _ => day,
        }
    }
}

/// A single provider cell. Providers are loose about types, so text and
/// missing values are representable and resolved at normalization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    /// Numeric view of the cell. Non-finite numbers and unparseable text are `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Missing => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Capability view over a heterogeneous row: callers ask for fields by name
/// instead of relying on a fixed column layout.
pub trait SeriesRow {
    fn timestamp(&self) -> RowTimestamp;

    fn field(&self, name: &str) -> Option<&FieldValue>;

    fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// One provider row: timestamp plus whatever named fields the provider sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    timestamp: RowTimestamp,
    fields: BTreeMap<String, FieldValue>,
}

impl RawRow {
    pub fn new(timestamp: RowTimestamp) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl SeriesRow for RawRow {
    fn timestamp(&self) -> RowTimestamp {
        self.timestamp
    }

    fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Chronological provider series as delivered, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    rows: Vec<RawRow>,
}

impl RawSeries {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The most recent `n` rows, still in chronological order.
    pub fn tail(&self, n: usize) -> &[RawRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }
}

impl FromIterator<RawRow> for RawSeries {
    fn from_iter<I: IntoIterator<Item = RawRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
