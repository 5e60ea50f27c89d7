use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn submitted_at_now() -> String {
    let now = OffsetDateTime::now_utc();
    format_offset(now.replace_nanosecond(0).unwrap_or(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, PrimitiveDateTime, Time, UtcOffset};

    #[test]
    fn format_offset_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time).assume_utc();
        assert_eq!(format_offset(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn format_offset_preserves_offset() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let utc = PrimitiveDateTime::new(date, time).assume_utc();
        let shifted = utc.to_offset(UtcOffset::from_hms(3, 0, 0).unwrap());
        assert_eq!(format_offset(shifted), "2025-01-02T13:20:30+03:00");
    }

    #[test]
    fn submitted_at_parses_back() {
        let stamp = submitted_at_now();
        assert!(stamp.ends_with('Z'));
        assert!(OffsetDateTime::parse(&stamp, &Rfc3339).is_ok());
    }
}
