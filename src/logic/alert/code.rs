//! Alert Code Generation
//!
//! Human-readable, date-encoded codes: `ALERT-YYYYMMDD-NNNN`. The sequence
//! is a count-then-increment over the day's alerts, so two generators can
//! race to the same code; the store's UNIQUE constraint is the arbiter and
//! the generator retries with a recomputed count. The alert's UUID, not the
//! code, is its stable identity.

use chrono::NaiveDate;

/// Format the code for a given day and 1-based sequence number.
pub fn code_for(day: NaiveDate, sequence: u64) -> String {
    format!("ALERT-{}-{:04}", day.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_code_format() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(code_for(day, 1), "ALERT-20260829-0001");
        assert_eq!(code_for(day, 42), "ALERT-20260829-0042");
    }

    #[test]
    fn test_sequence_overflows_field_width() {
        // More than 9999 alerts in a day widens the field instead of wrapping
        let day = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert_eq!(code_for(day, 12345), "ALERT-20260829-12345");
    }
}
