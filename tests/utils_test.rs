use chrono::{Duration, NaiveDate, TimeZone, Utc};
use crate_digger::utils::*;

#[test]
fn test_generate_state_nonce() {
    let nonce = generate_state_nonce();

    assert_eq!(nonce.len(), 16);
    assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two nonces should differ
    assert_ne!(nonce, generate_state_nonce());
}

#[test]
fn test_year_month_label_and_order() {
    let march = YearMonth::new(2024, 3).unwrap();
    assert_eq!(march.label(), "March 2024");

    let december_before = YearMonth::new(2023, 12).unwrap();
    let february = YearMonth::new(2024, 2).unwrap();

    // ordering is chronological, year first
    assert!(december_before < february);
    assert!(february < march);
    assert!(YearMonth::new(2023, 5).unwrap() < march);
}

#[test]
fn test_year_month_rejects_invalid_month() {
    assert!(YearMonth::new(2024, 0).is_none());
    assert!(YearMonth::new(2024, 13).is_none());
}

#[test]
fn test_year_month_of_date() {
    let date = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
    assert_eq!(YearMonth::of(&date), YearMonth::new(2024, 2).unwrap());
}

#[test]
fn test_parse_year_month_explicit() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    assert_eq!(
        parse_year_month(Some("2023-11"), today).unwrap(),
        YearMonth::new(2023, 11).unwrap()
    );
    assert!(parse_year_month(Some("2023-13"), today).is_err());
    assert!(parse_year_month(Some("november"), today).is_err());
    assert!(parse_year_month(Some("2023-xx"), today).is_err());
}

#[test]
fn test_parse_year_month_defaults_to_previous_month() {
    let mid_year = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    assert_eq!(
        parse_year_month(None, mid_year).unwrap(),
        YearMonth::new(2024, 5).unwrap()
    );

    // January rolls back into last year
    let january = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    assert_eq!(
        parse_year_month(None, january).unwrap(),
        YearMonth::new(2023, 12).unwrap()
    );
}

#[test]
fn test_require_param() {
    assert_eq!(
        require_param("track id", Some(" abc ".to_string())).unwrap(),
        "abc"
    );
    assert_eq!(
        require_param("track id", None),
        Err(MissingParameter("track id"))
    );
    assert_eq!(
        require_param("playlist id", Some("   ".to_string())),
        Err(MissingParameter("playlist id"))
    );
}

#[test]
fn test_seconds_to_minutes() {
    assert_eq!(seconds_to_minutes(0), "0m 00s");
    assert_eq!(seconds_to_minutes(245), "4m 05s");
    assert_eq!(seconds_to_minutes(3600), "60m 00s");
}

#[test]
fn test_key_to_string() {
    assert_eq!(key_to_string(0), "C");
    assert_eq!(key_to_string(1), "C♯");
    assert_eq!(key_to_string(11), "B");

    // -1 is what Spotify returns when no key was detected
    assert_eq!(key_to_string(-1), "Unknown");
    assert_eq!(key_to_string(12), "Unknown");
}

#[test]
fn test_relative_date_string() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

    assert_eq!(relative_date_string(now, now), "today");
    assert_eq!(relative_date_string(now - Duration::days(1), now), "yesterday");
    assert_eq!(relative_date_string(now - Duration::days(10), now), "10 days ago");
    assert_eq!(relative_date_string(now - Duration::days(45), now), "1 month ago");
    assert_eq!(relative_date_string(now - Duration::days(100), now), "3 months ago");
    assert_eq!(relative_date_string(now - Duration::days(400), now), "1 year ago");
    assert_eq!(relative_date_string(now - Duration::days(800), now), "2 years ago");

    // future dates are shown as-is
    assert_eq!(
        relative_date_string(now + Duration::days(3), now),
        "2024-06-18"
    );
}

#[test]
fn test_optional_or_na() {
    assert_eq!(optional_or_na(Some(120.4_f64), |t| format!("{:.0}", t)), "120");
    assert_eq!(optional_or_na(None::<f64>, |t| format!("{:.0}", t)), "N/A");
    assert_eq!(optional_or_na(Some(5), key_to_string), "F");
}
