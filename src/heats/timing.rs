//! Finishing-time parsing.
//!
//! Times are recorded as `MM:SS:mmm` (minutes, seconds, milliseconds).

/// Converts a `MM:SS:mmm` finishing time to total milliseconds.
///
/// Returns `None` for anything that is not exactly two, two and three digits
/// separated by colons, with seconds below 60. Callers treat `None` as "no
/// comparable time".
///
/// The fixed widths make stored times sort the same as text and as numbers.
pub fn parse_finish_time(time: &str) -> Option<u64> {
    let mut parts = time.split(':');
    let minutes = parse_field(parts.next()?, 2)?;
    let seconds = parse_field(parts.next()?, 2)?;
    let millis = parse_field(parts.next()?, 3)?;
    if parts.next().is_some() || seconds >= 60 {
        return None;
    }
    Some((minutes * 60 + seconds) * 1000 + millis)
}

/// True when `time` is a well-formed finishing time.
pub fn is_valid_finish_time(time: &str) -> bool {
    parse_finish_time(time).is_some()
}

fn parse_field(field: &str, width: usize) -> Option<u64> {
    if field.len() != width || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_seconds_and_millis() {
        assert_eq!(parse_finish_time("01:23:456"), Some(83_456));
        assert_eq!(parse_finish_time("00:59:999"), Some(59_999));
        assert_eq!(parse_finish_time("00:00:000"), Some(0));
        assert_eq!(parse_finish_time("10:00:001"), Some(600_001));
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in [
            "",
            "12.34",
            "01:23",
            "01:23:456:7",
            "aa:bb:ccc",
            "01:-3:456",
            "01:60:000",
            "01:00:1000",
            "01::456",
            "+1:02:003",
            "00:9:000",
            "0:09:000",
            "00:09:50",
            "100:00:000",
            " 00:10:000",
        ] {
            assert_eq!(parse_finish_time(bad), None, "{:?} should not parse", bad);
        }
    }

    #[test]
    fn validity_matches_parsing() {
        assert!(is_valid_finish_time("00:10:500"));
        assert!(!is_valid_finish_time("DNF"));
    }
}
