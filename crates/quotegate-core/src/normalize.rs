//! Raw provider rows to uniform `(date, open, close)` records.

use crate::domain::{columns, NormalizedRecord, SeriesRow};

/// Normalizes one row. Missing or unparseable `Open`/`Close` become `None`.
pub fn normalize_row<R: SeriesRow>(row: &R) -> NormalizedRecord {
    NormalizedRecord {
        date: row.timestamp().format(),
        open: numeric_field(row, columns::OPEN),
        close: numeric_field(row, columns::CLOSE),
    }
}

/// Normalizes rows in order, one record per row.
pub fn normalize_rows<R: SeriesRow>(rows: &[R]) -> Vec<NormalizedRecord> {
    rows.iter().map(normalize_row).collect()
}

fn numeric_field<R: SeriesRow>(row: &R, name: &str) -> Option<f64> {
    row.field(name).and_then(|value| value.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, RawRow, RawSeries, RowTimestamp};
    use time::macros::{date, datetime};

    /// Row type with a different storage layout, to prove the normalizer only
    /// depends on the capability trait.
    struct TupleRow {
        ts: RowTimestamp,
        open: FieldValue,
    }

    impl SeriesRow for TupleRow {
        fn timestamp(&self) -> RowTimestamp {
            self.ts
        }

        fn field(&self, name: &str) -> Option<&FieldValue> {
            (name == columns::OPEN).then_some(&self.open)
        }
    }

    #[test]
    fn open_without_close_yields_null_close() {
        let row = RawRow::new(RowTimestamp::Date(date!(2024 - 05 - 01)))
            .with_field(columns::OPEN, 101.5);

        let record = normalize_row(&row);
        assert_eq!(record.date, "2024-05-01");
        assert_eq!(record.open, Some(101.5));
        assert_eq!(record.close, None);
    }

    #[test]
    fn non_numeric_values_become_null() {
        let row = RawRow::new(RowTimestamp::DateTime(datetime!(2024-05-01 14:30:00)))
            .with_field(columns::OPEN, "not a number")
            .with_field(columns::CLOSE, FieldValue::Number(f64::INFINITY));

        let record = normalize_row(&row);
        assert_eq!(record.date, "2024-05-01 14:30:00");
        assert_eq!(record.open, None);
        assert_eq!(record.close, None);
    }

    #[test]
    fn numeric_text_is_parsed() {
        let row = RawRow::new(RowTimestamp::Date(date!(2024 - 05 - 01)))
            .with_field(columns::OPEN, "12.5")
            .with_field(columns::CLOSE, FieldValue::Missing);

        let record = normalize_row(&row);
        assert_eq!(record.open, Some(12.5));
        assert_eq!(record.close, None);
    }

    #[test]
    fn works_over_any_row_shape() {
        let rows = vec![TupleRow {
            ts: RowTimestamp::Date(date!(2023 - 12 - 29)),
            open: FieldValue::Number(7.0),
        }];

        let records = normalize_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].open, Some(7.0));
        assert_eq!(records[0].close, None);
    }

    #[test]
    fn preserves_row_order() {
        let series: RawSeries = [date!(2024 - 01 - 02), date!(2024 - 01 - 03), date!(2024 - 01 - 04)]
            .into_iter()
            .enumerate()
            .map(|(i, day)| {
                RawRow::new(RowTimestamp::Date(day)).with_field(columns::CLOSE, i as f64)
            })
            .collect();

        let dates: Vec<String> = normalize_rows(series.rows())
            .into_iter()
            .map(|record| record.date)
            .collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);
    }
}
