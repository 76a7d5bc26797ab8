use chrono::offset::LocalResult;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;

/// Zone stops are recorded in unless configured otherwise.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

/// Shape of an ISO calendar date, `d` standing for one ASCII digit.
const DATE_SHAPE: &str = "dddd-dd-dd";
const TIME_SHAPES: &[&str] = &["dd:dd:dd", "dd:dd"];
/// Most fractional second digits kept (nanosecond precision).
const MAX_FRACTION_DIGITS: usize = 9;

/// Parses an IANA timezone name such as `America/Los_Angeles`.
pub fn parse_timezone(name: &str) -> EtlResult<Tz> {
    name.parse::<Tz>().map_err(|_| {
        etl_error!(
            ErrorKind::ConfigError,
            "Unknown timezone",
            format!("`{name}` is not an IANA timezone name")
        )
    })
}

/// Combines an ISO date (`YYYY-MM-DD`) and an ISO time (`HH:MM[:SS[.fffffffff]]`) in `tz`.
///
/// Every component must be zero-padded to its full width. Signed years and leap seconds are
/// rejected.
///
/// The offset is the one `tz` observes at that local instant. During a fall-back transition the
/// earlier instant is chosen. Local times skipped by a spring-forward transition are rejected.
pub fn combine_date_time(date: &str, time: &str, tz: Tz) -> EtlResult<DateTime<FixedOffset>> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    let local = NaiveDateTime::new(date, time);

    match tz.from_local_datetime(&local) {
        LocalResult::Single(timestamp) => Ok(timestamp.fixed_offset()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.fixed_offset()),
        LocalResult::None => Err(etl_error!(
            ErrorKind::ConversionError,
            "Stop time does not exist in the timezone",
            format!("`{local}` falls in a daylight saving gap of {tz}")
        )),
    }
}

fn parse_date(date: &str) -> EtlResult<NaiveDate> {
    let trimmed = date.trim();
    let parsed = has_shape(trimmed, DATE_SHAPE)
        .then(|| {
            NaiveDate::from_ymd_opt(
                digits(&trimmed[0..4]) as i32,
                digits(&trimmed[5..7]),
                digits(&trimmed[8..10]),
            )
        })
        .flatten();

    parsed.ok_or_else(|| {
        etl_error!(
            ErrorKind::ConversionError,
            "Invalid stop date",
            format!("`{date}` is not an ISO date")
        )
    })
}

fn parse_time(time: &str) -> EtlResult<NaiveTime> {
    let trimmed = time.trim();
    let (clock, fraction) = match trimmed.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (trimmed, None),
    };

    let nanos = match fraction {
        None => Some(0),
        Some(fraction)
            if has_shape(clock, TIME_SHAPES[0])
                && (1..=MAX_FRACTION_DIGITS).contains(&fraction.len())
                && fraction.bytes().all(|byte| byte.is_ascii_digit()) =>
        {
            Some(digits(fraction) * 10u32.pow((MAX_FRACTION_DIGITS - fraction.len()) as u32))
        }
        Some(_) => None,
    };

    // `from_hms_nano_opt` refuses second 60, so leap seconds never reach the index.
    let parsed = nanos
        .filter(|_| TIME_SHAPES.iter().any(|shape| has_shape(clock, shape)))
        .and_then(|nanos| {
            let second = if clock.len() == TIME_SHAPES[0].len() {
                digits(&clock[6..8])
            } else {
                0
            };
            NaiveTime::from_hms_nano_opt(digits(&clock[0..2]), digits(&clock[3..5]), second, nanos)
        });

    parsed.ok_or_else(|| {
        etl_error!(
            ErrorKind::ConversionError,
            "Invalid stop time",
            format!("`{time}` is not an ISO time")
        )
    })
}

/// Returns whether `text` matches `shape` byte for byte, `d` matching any ASCII digit.
fn has_shape(text: &str, shape: &str) -> bool {
    text.len() == shape.len()
        && text.bytes().zip(shape.bytes()).all(|(byte, expected)| match expected {
            b'd' => byte.is_ascii_digit(),
            _ => byte == expected,
        })
}

/// Reads a run of ASCII digits already checked by [`has_shape`].
fn digits(text: &str) -> u32 {
    text.bytes()
        .fold(0, |value, byte| value * 10 + u32::from(byte - b'0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn combines_in_the_default_timezone() {
        let timestamp = combine_date_time("2022-01-25", "10:10:05", DEFAULT_TIMEZONE).unwrap();

        assert_eq!(timestamp.year(), 2022);
        assert_eq!(timestamp.month(), 1);
        assert_eq!(timestamp.day(), 25);
        assert_eq!(timestamp.hour(), 10);
        assert_eq!(timestamp.minute(), 10);
        assert_eq!(timestamp.second(), 5);
        assert_eq!(timestamp.offset().local_minus_utc(), -8 * 3600);
        assert_eq!(timestamp.to_rfc3339(), "2022-01-25T10:10:05-08:00");
    }

    #[test]
    fn summer_dates_carry_daylight_offset() {
        let timestamp = combine_date_time("2022-07-04", "21:30", DEFAULT_TIMEZONE).unwrap();

        assert_eq!(timestamp.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn fractional_seconds_are_accepted() {
        let timestamp =
            combine_date_time("2022-01-25", "10:10:05.250000", DEFAULT_TIMEZONE).unwrap();

        assert_eq!(timestamp.nanosecond(), 250_000_000);
    }

    #[test]
    fn malformed_date_is_a_conversion_error() {
        let err = combine_date_time("2022-13-99", "10:10:05", DEFAULT_TIMEZONE).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionError);
        assert!(err.detail().unwrap().contains("2022-13-99"));
    }

    #[test]
    fn malformed_time_is_a_conversion_error() {
        let err = combine_date_time("2022-01-25", "25:61", DEFAULT_TIMEZONE).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionError);
    }

    #[test]
    fn dates_must_be_zero_padded_iso_literals() {
        for date in [
            "2022-1-5",
            "2022-01-5",
            "+2022-01-25",
            "22-01-25",
            "2022/01/25",
            "2022-02-30",
        ] {
            let err = combine_date_time(date, "10:10:05", DEFAULT_TIMEZONE).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConversionError, "{date}");
        }
    }

    #[test]
    fn times_must_be_zero_padded_iso_literals() {
        for time in [
            "1:2:3",
            "10:1:05",
            "10:10:5",
            "1010",
            "10:10:05.",
            "10:10.5",
            "10:10:05.1234567890",
        ] {
            let err = combine_date_time("2022-01-25", time, DEFAULT_TIMEZONE).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConversionError, "{time}");
        }
    }

    #[test]
    fn leap_seconds_are_rejected() {
        let err = combine_date_time("2022-01-25", "10:10:60", DEFAULT_TIMEZONE).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionError);
        assert!(err.detail().unwrap().contains("10:10:60"));
    }

    #[test]
    fn short_fractions_scale_to_nanoseconds() {
        let timestamp = combine_date_time("2022-01-25", "10:10:05.5", DEFAULT_TIMEZONE).unwrap();

        assert_eq!(timestamp.nanosecond(), 500_000_000);
        assert_eq!(timestamp.second(), 5);
    }

    #[test]
    fn ambiguous_times_resolve_to_the_earlier_instant() {
        let timestamp = combine_date_time("2022-11-06", "01:30:00", DEFAULT_TIMEZONE).unwrap();

        assert_eq!(timestamp.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn skipped_times_are_rejected() {
        let err = combine_date_time("2022-03-13", "02:30:00", DEFAULT_TIMEZONE).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionError);
    }

    #[test]
    fn timezone_names_are_validated() {
        assert_eq!(parse_timezone("America/New_York").unwrap(), chrono_tz::America::New_York);
        assert_eq!(
            parse_timezone("Mars/Olympus_Mons").unwrap_err().kind(),
            ErrorKind::ConfigError
        );
    }
}
