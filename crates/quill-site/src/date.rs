//! Date patterns.
//!
//! Site configs describe dates with a reference-time layout such as
//! `2006-01-02` or `Mon Jan _2 15:04:05 2006`.
//! [`DateFormat`] translates such a layout to `strftime` once and then parses
//! and formats with chrono. A pattern containing `%` is taken to be
//! `strftime` already and is used as-is.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::error::SiteError;

/// Reference-time tokens and their `strftime` equivalents, longest match
/// first. The second column is used for formatting, the third for parsing.
const LAYOUT_TOKENS: &[(&str, &str, &str)] = &[
    ("January", "%B", "%B"),
    ("Jan", "%b", "%b"),
    ("Monday", "%A", "%A"),
    ("Mon", "%a", "%a"),
    ("MST", "%Z", "%Z"),
    // All dates are UTC, so the Zulu forms always print "Z".
    ("Z07:00", "Z", "%#z"),
    ("Z0700", "Z", "%#z"),
    ("-07:00", "%:z", "%:z"),
    ("-0700", "%z", "%z"),
    ("2006", "%Y", "%Y"),
    ("01", "%m", "%m"),
    ("02", "%d", "%d"),
    ("03", "%I", "%I"),
    ("04", "%M", "%M"),
    ("05", "%S", "%S"),
    ("06", "%y", "%y"),
    ("15", "%H", "%H"),
    ("_2", "%e", "%e"),
    ("1", "%-m", "%-m"),
    ("2", "%-d", "%-d"),
    ("3", "%-I", "%-I"),
    ("4", "%-M", "%-M"),
    ("5", "%-S", "%-S"),
    ("PM", "%p", "%p"),
    ("pm", "%P", "%P"),
    (".000000000", "%.9f", "%.9f"),
    (".000000", "%.6f", "%.6f"),
    (".000", "%.3f", "%.3f"),
];

#[derive(Clone, Copy)]
enum Direction {
    Format,
    Parse,
}

fn translate(layout: &str, direction: Direction) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    'outer: while !rest.is_empty() {
        for (token, format, parse) in LAYOUT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(match direction {
                    Direction::Format => format,
                    Direction::Parse => parse,
                });
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn is_valid_strftime(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// A validated date pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    layout: String,
    format: String,
    parse: String,
}

impl DateFormat {
    /// Compile a reference-time layout or `strftime` pattern.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::InvalidDateFormat`] if the resulting `strftime`
    /// pattern is malformed.
    pub fn new(layout: &str) -> Result<Self, SiteError> {
        let (format, parse) = if layout.contains('%') {
            (layout.to_owned(), layout.to_owned())
        } else {
            (
                translate(layout, Direction::Format),
                translate(layout, Direction::Parse),
            )
        };

        if !is_valid_strftime(&format) || !is_valid_strftime(&parse) {
            return Err(SiteError::InvalidDateFormat(layout.to_owned()));
        }

        Ok(Self {
            layout: layout.to_owned(),
            format,
            parse,
        })
    }

    /// The pattern as written in the config.
    #[must_use]
    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// The `strftime` pattern used for formatting.
    #[must_use]
    pub fn strftime(&self) -> &str {
        &self.format
    }

    /// Parse a date string.
    ///
    /// Patterns with an offset produce that instant in UTC; patterns without
    /// one are read as UTC, and date-only patterns as UTC midnight.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::InvalidDate`] if `value` does not match.
    pub fn parse(&self, value: &str) -> Result<DateTime<Utc>, SiteError> {
        let value = value.trim();
        if let Ok(date) = DateTime::parse_from_str(value, &self.parse) {
            return Ok(date.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, &self.parse) {
            return Ok(naive.and_utc());
        }
        NaiveDate::parse_from_str(value, &self.parse)
            .map(|date| date.and_time(NaiveTime::default()).and_utc())
            .map_err(|_| SiteError::InvalidDate {
                value: value.to_owned(),
                format: self.layout.clone(),
            })
    }

    /// Format a date.
    #[must_use]
    pub fn format(&self, date: &DateTime<Utc>) -> String {
        // Validated in `new`, so formatting cannot fail.
        date.format(&self.format).to_string()
    }
}

/// Render a date as RFC 3339 (`2012-09-07T00:00:00Z`).
#[must_use]
pub fn to_rfc3339(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC 3339 timestamp into UTC.
///
/// # Errors
///
/// Returns [`SiteError::InvalidDate`] if `value` is not RFC 3339.
pub fn from_rfc3339(value: &str) -> Result<DateTime<Utc>, SiteError> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| SiteError::InvalidDate {
            value: value.to_owned(),
            format: "RFC 3339".to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn sept_7() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 9, 7, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_translate_iso_date() {
        let format = DateFormat::new("2006-01-02").unwrap();

        assert_eq!(format.strftime(), "%Y-%m-%d");
        assert_eq!(format.layout(), "2006-01-02");
    }

    #[test]
    fn test_parse_date_only() {
        let format = DateFormat::new("2006-01-02").unwrap();

        assert_eq!(format.parse("2012-09-07").unwrap(), sept_7());
    }

    #[test]
    fn test_parse_date_and_time() {
        let format = DateFormat::new("2006-01-02 15:04").unwrap();

        let date = format.parse("2012-09-07 08:30").unwrap();

        assert_eq!(date, Utc.with_ymd_and_hms(2012, 9, 7, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_with_offset_normalizes_to_utc() {
        let format = DateFormat::new("2006-01-02T15:04:05-07:00").unwrap();

        let date = format.parse("2012-09-07T02:00:00+02:00").unwrap();

        assert_eq!(date, sept_7());
    }

    #[test]
    fn test_parse_mismatch() {
        let format = DateFormat::new("2006-01-02").unwrap();

        let err = format.parse("09/07/2012").unwrap_err();

        assert!(matches!(err, SiteError::InvalidDate { .. }));
    }

    #[test]
    fn test_format_long_layout() {
        let format = DateFormat::new("Mon Jan _2, 2006").unwrap();

        assert_eq!(format.format(&sept_7()), "Fri Sep  7, 2012");
    }

    #[test]
    fn test_format_zulu() {
        let format = DateFormat::new("2006-01-02T15:04:05Z07:00").unwrap();

        assert_eq!(format.format(&sept_7()), "2012-09-07T00:00:00Z");
    }

    #[test]
    fn test_format_full_names() {
        let format = DateFormat::new("Monday, January 2").unwrap();

        assert_eq!(format.format(&sept_7()), "Friday, September 7");
    }

    #[test]
    fn test_strftime_passthrough() {
        let format = DateFormat::new("%d/%m/%Y").unwrap();

        assert_eq!(format.strftime(), "%d/%m/%Y");
        assert_eq!(format.format(&sept_7()), "07/09/2012");
        assert_eq!(format.parse("07/09/2012").unwrap(), sept_7());
    }

    #[test]
    fn test_invalid_strftime_rejected() {
        assert!(matches!(
            DateFormat::new("%Y-%"),
            Err(SiteError::InvalidDateFormat(_))
        ));
    }

    #[test]
    fn test_rfc3339_round_trip() {
        assert_eq!(to_rfc3339(&sept_7()), "2012-09-07T00:00:00Z");
        assert_eq!(from_rfc3339("2012-09-07T00:00:00Z").unwrap(), sept_7());
        assert!(from_rfc3339("yesterday").is_err());
    }
}
