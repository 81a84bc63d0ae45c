//! 时间工具函数 - 业务时区转换
//!
//! Store timestamps are Unix millis; calendar dates are always derived in the
//! configured business timezone.

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析时区名称 (IANA, e.g. `Europe/Madrid`)
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::config(format!("Unknown timezone: {}", name)))
}

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Unix millis → 业务日期
pub fn millis_to_date(millis: i64, tz: Tz) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.date_naive())
}

/// Unix millis → `YYYY-MM-DD` (业务时区)
///
/// Out-of-range values fall back to the UTC date of the epoch.
pub fn date_string(millis: i64, tz: Tz) -> String {
    millis_to_date(millis, tz)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-05T23:30:00Z
    const LATE_EVENING_UTC: i64 = 1_704_497_400_000;

    #[test]
    fn test_date_string_respects_timezone() {
        assert_eq!(date_string(LATE_EVENING_UTC, chrono_tz::UTC), "2024-01-05");
        assert_eq!(
            date_string(LATE_EVENING_UTC, chrono_tz::Europe::Madrid),
            "2024-01-06"
        );
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("Europe/Madrid").is_ok());
        let err = parse_timezone("Mars/Olympus").unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ConfigError);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2024-13-01").is_err());
    }
}
