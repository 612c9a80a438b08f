//! Candle data model and timestamp/number normalization helpers.
//!
//! Timestamps in the table are naive civil times at a fixed UTC+8
//! offset, truncated to the hour. The offset itself is never stored.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// Fixed offset of the table's civil time, in hours east of UTC.
pub const TABLE_OFFSET_HOURS: i32 = 8;

/// Timestamp cell format used by the persisted table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One hourly OHLCV observation. The timestamp is the natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered collection of candles: timestamps strictly increasing, no
/// duplicates. Loaded once per run, merged once, persisted once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleTable {
    rows: Vec<Candle>,
}

impl CandleTable {
    /// Wraps rows that are already sorted ascending with unique
    /// timestamps (store load and merge both guarantee this).
    pub fn from_rows(rows: Vec<Candle>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self { rows }
    }

    pub fn rows(&self) -> &[Candle] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn earliest(&self) -> Option<NaiveDateTime> {
        self.rows.first().map(|c| c.timestamp)
    }

    pub fn latest(&self) -> Option<NaiveDateTime> {
        self.rows.last().map(|c| c.timestamp)
    }
}

fn table_offset() -> FixedOffset {
    FixedOffset::east_opt(TABLE_OFFSET_HOURS * 3600).expect("valid fixed offset")
}

/// Converts an epoch-millisecond instant to the table's civil time.
pub fn civil_time_from_millis(millis: i64) -> Option<NaiveDateTime> {
    let instant = DateTime::<Utc>::from_timestamp_millis(millis)?;
    Some(instant.with_timezone(&table_offset()).naive_local())
}

/// Converts an epoch-second instant to the table's civil time.
pub fn civil_time_from_secs(secs: i64) -> Option<NaiveDateTime> {
    let instant = DateTime::from_timestamp(secs, 0)?;
    Some(instant.with_timezone(&table_offset()).naive_local())
}

/// Parse-or-mark-invalid numeric coercion for the five value fields.
/// Empty and non-numeric cells become NaN instead of failing the row.
pub fn coerce_price(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return f64::NAN;
    }
    raw.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn millis_convert_to_utc8_civil_time() {
        // 2024-01-01T00:00:00Z
        let ts = civil_time_from_millis(1_704_067_200_000).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(ts, expected);
        assert_eq!(ts.format(TIMESTAMP_FORMAT).to_string(), "2024-01-01 08:00:00");
    }

    #[test]
    fn secs_and_millis_agree() {
        let secs = 1_700_000_000;
        assert_eq!(
            civil_time_from_secs(secs).unwrap(),
            civil_time_from_millis(secs * 1000).unwrap()
        );
    }

    #[test]
    fn civil_time_crosses_the_date_line() {
        // 2023-12-31T20:00:00Z is already 2024-01-01 04:00 at UTC+8
        let ts = civil_time_from_millis(1_704_052_800_000).unwrap();
        assert_eq!(ts.format(TIMESTAMP_FORMAT).to_string(), "2024-01-01 04:00:00");
    }

    #[test]
    fn coerce_parses_valid_numbers() {
        assert_eq!(coerce_price("42345.5"), 42345.5);
        assert_eq!(coerce_price(" 0.001 "), 0.001);
        assert_eq!(coerce_price("-1.5"), -1.5);
    }

    #[test]
    fn coerce_marks_invalid_numbers_as_nan() {
        assert!(coerce_price("").is_nan());
        assert!(coerce_price("n/a").is_nan());
        assert!(coerce_price("12,345").is_nan());
    }

    #[test]
    fn table_reports_bounds() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows: Vec<Candle> = (0..3)
            .map(|h| Candle {
                timestamp: base + chrono::Duration::hours(h),
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                volume: 10.0,
            })
            .collect();
        let table = CandleTable::from_rows(rows);
        assert_eq!(table.len(), 3);
        assert_eq!(table.earliest().unwrap(), base);
        assert_eq!(table.latest().unwrap(), base + chrono::Duration::hours(2));
    }

    #[test]
    fn empty_table_has_no_bounds() {
        let table = CandleTable::default();
        assert!(table.is_empty());
        assert!(table.earliest().is_none());
        assert!(table.latest().is_none());
    }

    proptest::proptest! {
        #[test]
        fn coerce_round_trips_finite_floats(value in -1.0e12f64..1.0e12) {
            proptest::prop_assert_eq!(coerce_price(&value.to_string()), value);
        }

        #[test]
        fn conversion_preserves_the_hour_grid(hours in 0i64..1_000_000) {
            let millis = hours * 3_600_000;
            let ts = civil_time_from_millis(millis).unwrap();
            proptest::prop_assert_eq!(ts.format("%M:%S").to_string(), "00:00");
            proptest::prop_assert_eq!(
                civil_time_from_secs(millis / 1000).unwrap(),
                ts
            );
        }
    }
}
