use serde::Serialize;

use crate::{Interval, Symbol};

/// Uniform record emitted for every provider row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub date: String,
    pub open: Option<f64>,
    pub close: Option<f64>,
}

/// Per-request result handed to the renderer. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct StockResult {
    pub symbol: Symbol,
    pub current_price: Option<f64>,
    pub source: String,
    pub interval: Interval,
    pub records: Vec<NormalizedRecord>,
}

impl StockResult {
    /// Derives `current_price` from the close of the last record.
    pub fn new(
        symbol: Symbol,
        source: impl Into<String>,
        interval: Interval,
        records: Vec<NormalizedRecord>,
    ) -> Self {
        let current_price = records.last().and_then(|record| record.close);
        Self {
            symbol,
            current_price,
            source: source.into(),
            interval,
            records,
        }
    }

    pub fn records_returned(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, close: Option<f64>) -> NormalizedRecord {
        NormalizedRecord {
            date: date.to_owned(),
            open: Some(1.0),
            close,
        }
    }

    #[test]
    fn current_price_is_last_close() {
        let result = StockResult::new(
            Symbol::parse("ACME").expect("valid"),
            "test",
            Interval::OneDay,
            vec![record("2024-01-01", Some(10.0)), record("2024-01-02", Some(11.5))],
        );
        assert_eq!(result.current_price, Some(11.5));
        assert_eq!(result.records_returned(), 2);
    }

    #[test]
    fn current_price_is_none_when_last_close_missing() {
        let result = StockResult::new(
            Symbol::parse("ACME").expect("valid"),
            "test",
            Interval::OneDay,
            vec![record("2024-01-01", Some(10.0)), record("2024-01-02", None)],
        );
        assert_eq!(result.current_price, None);
    }
}
