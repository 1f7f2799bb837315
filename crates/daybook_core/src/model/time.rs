//! Time-of-day input rules for calendar notes.
//!
//! # Invariants
//! - `format_time_input` output matches `^\d{0,2}(:\d{0,2})?$` and holds at
//!   most four digits.
//! - `format_time_input` is idempotent.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_TIME_DIGITS: usize = 4;

/// Time text that cannot be converted to minutes since midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTimeError {
    pub value: String,
}

impl Display for MalformedTimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed time `{}`; expected HH:MM", self.value)
    }
}

impl Error for MalformedTimeError {}

/// Normalizes raw keyboard input into the `HH:MM` typing shape.
///
/// Non-digits are stripped and digits past the fourth are dropped. Up to two
/// digits are returned as-is; three or four get a colon after the second.
pub fn format_time_input(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(MAX_TIME_DIGITS)
        .collect();

    if digits.len() <= 2 {
        digits
    } else {
        format!("{}:{}", &digits[..2], &digits[2..])
    }
}

/// Converts `H:M`-shaped text to minutes since midnight.
///
/// Both parts must be non-empty ASCII digit runs. Values are not range
/// checked, so `"25:00"` yields `1500`.
pub fn time_to_minutes(time: &str) -> Result<u32, MalformedTimeError> {
    let malformed = || MalformedTimeError {
        value: time.to_string(),
    };

    let (hours, minutes) = time.split_once(':').ok_or_else(malformed)?;
    let hours = parse_part(hours).ok_or_else(malformed)?;
    let minutes = parse_part(minutes).ok_or_else(malformed)?;
    hours
        .checked_mul(60)
        .and_then(|value| value.checked_add(minutes))
        .ok_or_else(malformed)
}

/// Display ordering for two note times.
///
/// Well-formed times compare by minutes; malformed ones (typically a
/// half-typed input) sort after every well-formed time and tie with each
/// other, so a stable sort keeps their stored order.
pub fn compare_times(left: &str, right: &str) -> Ordering {
    match (time_to_minutes(left), time_to_minutes(right)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => Ordering::Equal,
    }
}

fn parse_part(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{compare_times, format_time_input, time_to_minutes};
    use std::cmp::Ordering;

    fn is_time_shape(value: &str) -> bool {
        let (hours, minutes) = match value.split_once(':') {
            Some((h, m)) => (h, Some(m)),
            None => (value, None),
        };
        let digits_ok = |part: &str| part.len() <= 2 && part.bytes().all(|b| b.is_ascii_digit());
        digits_ok(hours) && minutes.map_or(true, digits_ok)
    }

    #[test]
    fn format_inserts_colon_after_two_digits() {
        assert_eq!(format_time_input(""), "");
        assert_eq!(format_time_input("9"), "9");
        assert_eq!(format_time_input("14"), "14");
        assert_eq!(format_time_input("143"), "14:3");
        assert_eq!(format_time_input("1430"), "14:30");
    }

    #[test]
    fn format_strips_non_digits_and_drops_excess() {
        assert_eq!(format_time_input("14:30"), "14:30");
        assert_eq!(format_time_input("1a4b3c0"), "14:30");
        assert_eq!(format_time_input("143059"), "14:30");
        assert_eq!(format_time_input("klo 9.15"), "91:5");
        assert_eq!(format_time_input("１２"), "");
    }

    #[test]
    fn format_is_idempotent_and_keeps_shape() {
        let inputs = [
            "", "0", "07", "073", "0730", "07:30", "7:3", "12:345", "::", "99999", "ab:cd", "1-2-3",
        ];
        for input in inputs {
            let once = format_time_input(input);
            assert_eq!(format_time_input(&once), once, "input {input:?}");
            assert!(is_time_shape(&once), "input {input:?} produced {once:?}");
            assert!(once.bytes().filter(u8::is_ascii_digit).count() <= 4);
        }
    }

    #[test]
    fn minutes_since_midnight() {
        assert_eq!(time_to_minutes(&format_time_input("1430")), Ok(870));
        assert_eq!(time_to_minutes("00:00"), Ok(0));
        assert_eq!(time_to_minutes("9:5"), Ok(545));
    }

    #[test]
    fn minutes_reject_inputs_without_both_parts() {
        assert!(time_to_minutes("").is_err());
        assert!(time_to_minutes("14").is_err());
        assert!(time_to_minutes("14:").is_err());
        assert!(time_to_minutes(":30").is_err());
        assert!(time_to_minutes("1a:30").is_err());
    }

    #[test]
    fn malformed_times_sort_last() {
        assert_eq!(compare_times("08:15", "09:00"), Ordering::Less);
        assert_eq!(compare_times("23:59", "14"), Ordering::Less);
        assert_eq!(compare_times("", "00:00"), Ordering::Greater);
        assert_eq!(compare_times("1", ""), Ordering::Equal);
    }
}
