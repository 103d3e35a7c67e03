//! Timestamp codecs for the two epochs found in SRUM data.
//!
//! Both produce UTC-naive values; no timezone adjustment is applied.

use chrono::{DateTime, NaiveDateTime};

use crate::error::FieldDecodeError;

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// 1899-12-30T00:00:00 relative to the Unix epoch, in microseconds.
const OLE_EPOCH_UNIX_MICROS: i64 = -2_209_161_600_000_000;

/// 1601-01-01T00:00:00 relative to the Unix epoch, in microseconds.
const FILETIME_EPOCH_UNIX_MICROS: i64 = -11_644_473_600_000_000;

/// Converts an OLE Automation Date (days since 1899-12-30, fraction is
/// the time of day) to a timestamp, rounded to whole microseconds.
///
/// Negative values are treated linearly: `-0.5` is noon on 1899-12-29.
pub fn ole_automation_date(days: f64) -> Result<NaiveDateTime, FieldDecodeError> {
    let out_of_range = || FieldDecodeError::OutOfRange {
        value: days.to_string(),
    };
    if !days.is_finite() {
        return Err(out_of_range());
    }
    let micros = (days * MICROS_PER_DAY).round();
    if micros.abs() >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    let unix_micros = (micros as i64)
        .checked_add(OLE_EPOCH_UNIX_MICROS)
        .ok_or_else(out_of_range)?;
    DateTime::from_timestamp_micros(unix_micros)
        .map(|value| value.naive_utc())
        .ok_or_else(out_of_range)
}

/// Converts a FILETIME (100ns ticks since 1601-01-01) to a timestamp.
///
/// Ticks are truncated to whole microseconds. Every `u64` converts; zero
/// and implausibly large values are left for analysis to flag.
pub fn windows_filetime(ticks: u64) -> Result<NaiveDateTime, FieldDecodeError> {
    let out_of_range = || FieldDecodeError::OutOfRange {
        value: ticks.to_string(),
    };
    // u64::MAX / 10 is below i64::MAX
    let micros = i64::try_from(ticks / 10).map_err(|_| out_of_range())?;
    let unix_micros = micros
        .checked_add(FILETIME_EPOCH_UNIX_MICROS)
        .ok_or_else(out_of_range)?;
    DateTime::from_timestamp_micros(unix_micros)
        .map(|value| value.naive_utc())
        .ok_or_else(out_of_range)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use srum_model::DecodedValue;

    use super::*;

    fn render(value: NaiveDateTime) -> String {
        DecodedValue::format_timestamp(&value)
    }

    #[test]
    fn ole_epoch() {
        let value = ole_automation_date(0.0).expect("decode");
        assert_eq!(render(value), "1899-12-30 00:00:00.000000");
    }

    #[test]
    fn ole_day_and_a_half() {
        let value = ole_automation_date(1.5).expect("decode");
        assert_eq!(render(value), "1899-12-31 12:00:00.000000");
    }

    #[test]
    fn ole_negative_is_linear() {
        let value = ole_automation_date(-0.5).expect("decode");
        assert_eq!(render(value), "1899-12-29 12:00:00.000000");
    }

    #[test]
    fn ole_rejects_non_finite() {
        assert!(matches!(
            ole_automation_date(f64::NAN),
            Err(FieldDecodeError::OutOfRange { .. })
        ));
        assert!(ole_automation_date(f64::INFINITY).is_err());
        assert!(ole_automation_date(1e300).is_err());
    }

    #[test]
    fn filetime_epoch() {
        let value = windows_filetime(0).expect("decode");
        assert_eq!(render(value), "1601-01-01 00:00:00.000000");
    }

    #[test]
    fn filetime_one_microsecond() {
        let value = windows_filetime(10).expect("decode");
        assert_eq!(render(value), "1601-01-01 00:00:00.000001");
    }

    #[test]
    fn filetime_truncates_sub_microsecond() {
        let value = windows_filetime(19).expect("decode");
        assert_eq!(render(value), "1601-01-01 00:00:00.000001");
    }

    #[test]
    fn filetime_unix_epoch() {
        let value = windows_filetime(116_444_736_000_000_000).expect("decode");
        assert_eq!(render(value), "1970-01-01 00:00:00.000000");
    }

    proptest! {
        #[test]
        fn filetime_converts_every_tick_count(ticks in any::<u64>()) {
            prop_assert!(windows_filetime(ticks).is_ok());
        }

        #[test]
        fn filetime_is_monotonic(a in any::<u64>(), b in any::<u64>()) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let low = windows_filetime(low).expect("decode");
            let high = windows_filetime(high).expect("decode");
            prop_assert!(low <= high);
        }
    }
}
