//! Trigger computation across weekends and DST transitions.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;

use maxpain_rs::scheduler::{Clock, Schedule, SystemClock};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

fn market_open() -> Schedule {
    Schedule::new(time(9, 31), New_York)
}

// ===================================================================
// Weekdays
// ===================================================================

#[test]
fn test_before_run_time_triggers_same_day() {
    // Wednesday 08:00 EDT
    let next = market_open().next_trigger(utc(2024, 6, 12, 12, 0));
    assert_eq!(next, utc(2024, 6, 12, 13, 31));
}

#[test]
fn test_after_run_time_triggers_next_day() {
    // Wednesday 10:00 EDT
    let next = market_open().next_trigger(utc(2024, 6, 12, 14, 0));
    assert_eq!(next, utc(2024, 6, 13, 13, 31));
}

#[test]
fn test_trigger_is_strictly_after_now() {
    let at_trigger = utc(2024, 6, 12, 13, 31);
    let next = market_open().next_trigger(at_trigger);
    assert_eq!(next, utc(2024, 6, 13, 13, 31));
}

#[test]
fn test_local_date_decides_the_day() {
    // Thursday 01:00 UTC is still Wednesday evening in New York
    let next = market_open().next_trigger(utc(2024, 6, 13, 1, 0));
    assert_eq!(next, utc(2024, 6, 13, 13, 31));
}

// ===================================================================
// Weekends
// ===================================================================

#[test]
fn test_friday_after_run_skips_to_monday() {
    let next = market_open().next_trigger(utc(2024, 6, 14, 15, 0));
    assert_eq!(next, utc(2024, 6, 17, 13, 31));
}

#[test]
fn test_saturday_and_sunday_skip_to_monday() {
    let schedule = market_open();
    assert_eq!(schedule.next_trigger(utc(2024, 6, 15, 9, 0)), utc(2024, 6, 17, 13, 31));
    assert_eq!(schedule.next_trigger(utc(2024, 6, 16, 20, 0)), utc(2024, 6, 17, 13, 31));
}

#[test]
fn test_is_trading_day() {
    let friday = NaiveDate::from_ymd_opt(2024, 6, 14).expect("valid date");
    let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
    assert!(Schedule::is_trading_day(friday));
    assert!(!Schedule::is_trading_day(saturday));
}

// ===================================================================
// Daylight saving time
// ===================================================================

#[test]
fn test_utc_trigger_moves_with_dst() {
    // Friday 2024-03-08 runs at 14:31 UTC (EST); after the 2024-03-10
    // switch Monday runs at 13:31 UTC (EDT)
    let schedule = market_open();
    assert_eq!(schedule.next_trigger(utc(2024, 3, 8, 12, 0)), utc(2024, 3, 8, 14, 31));
    assert_eq!(schedule.next_trigger(utc(2024, 3, 8, 15, 0)), utc(2024, 3, 11, 13, 31));
}

#[test]
fn test_nonexistent_local_time_shifts_forward() {
    // 02:30 does not exist in New York on 2024-03-10
    let schedule = Schedule::new(time(2, 30), New_York);
    let date = NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date");
    assert_eq!(schedule.trigger_on(date), utc(2024, 3, 10, 7, 30));
}

#[test]
fn test_ambiguous_local_time_takes_earlier_instant() {
    // 01:30 happens twice in New York on 2024-11-03
    let schedule = Schedule::new(time(1, 30), New_York);
    let date = NaiveDate::from_ymd_opt(2024, 11, 3).expect("valid date");
    assert_eq!(schedule.trigger_on(date), utc(2024, 11, 3, 5, 30));
}

// ===================================================================
// System clock
// ===================================================================

#[tokio::test]
async fn test_system_clock_past_deadline_returns() {
    let clock = SystemClock;
    let past = clock.now() - chrono::Duration::seconds(5);
    tokio::time::timeout(std::time::Duration::from_secs(1), clock.sleep_until(past))
        .await
        .expect("sleep_until should return immediately");
}
