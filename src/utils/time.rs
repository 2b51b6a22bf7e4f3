use chrono::{DateTime, NaiveDate};

/// hh.ru timestamps look like `2024-03-01T10:15:00+0300`, which is not quite
/// RFC 3339 (no colon in the offset). Both spellings are accepted.
pub fn parse_published_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hh_offset_without_colon() {
        assert_eq!(
            parse_published_date("2024-03-01T10:15:00+0300"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn keeps_the_local_calendar_date() {
        assert_eq!(
            parse_published_date("2024-03-01T01:00:00+05:00"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn accepts_bare_dates_and_rejects_garbage() {
        assert_eq!(
            parse_published_date("2023-12-31"),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
        assert_eq!(parse_published_date("yesterday"), None);
    }
}
