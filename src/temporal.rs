use chrono::{NaiveDate, NaiveTime};

/// Parse a string literal body as an ISO-8601 date (YYYY-MM-DD).
///
/// The shape is checked before handing off to chrono so that strings which
/// merely contain digits and dashes ("12-34", phone numbers) stay strings.
pub(crate) fn parse_date_literal(input: &str) -> Option<NaiveDate> {
    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    if !input
        .chars()
        .enumerate()
        .all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit())
    {
        return None;
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// Parse a string literal body as an ISO-8601 time (HH:MM:SS[.mmm]).
pub(crate) fn parse_time_literal(input: &str) -> Option<NaiveTime> {
    let (main, frac) = match input.split_once('.') {
        Some((main, frac)) => (main, Some(frac)),
        None => (input, None),
    };

    let main_bytes = main.as_bytes();
    if main_bytes.len() != 8 || main_bytes[2] != b':' || main_bytes[5] != b':' {
        return None;
    }
    if !main
        .chars()
        .enumerate()
        .all(|(i, c)| matches!(i, 2 | 5) || c.is_ascii_digit())
    {
        return None;
    }
    if let Some(frac) = frac {
        if frac.is_empty() || frac.len() > 3 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    NaiveTime::parse_from_str(input, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .ok()
}
