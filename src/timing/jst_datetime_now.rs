use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Seconds east of UTC for Japan Standard Time.
const JST_OFFSET_SECS: i32 = 9 * 60 * 60;

pub fn jst_offset() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("UTC+9 is within the valid offset range")
}

pub fn jst_datetime_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst_offset())
}

/// The calendar date "today" as seen from UTC+9. Evaluated fresh on every call.
pub fn jst_today() -> NaiveDate {
    jst_datetime_now().date_naive()
}

/// The calendar date a UTC timestamp falls on in UTC+9.
pub fn jst_date_of(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.with_timezone(&jst_offset()).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn late_utc_evening_is_next_day_in_japan() {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 15, 30, 0).unwrap();
        assert_eq!(
            jst_date_of(timestamp),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
        );
    }

    #[test]
    fn early_utc_morning_stays_on_the_same_day() {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 14, 59, 59).unwrap();
        assert_eq!(
            jst_date_of(timestamp),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
    }

    #[test]
    fn offset_is_nine_hours() {
        assert_eq!(jst_offset().local_minus_utc(), 9 * 3600);
    }
}
