//! Report writer tests against a temporary data directory.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use maxpain_rs::calculator::MaxPainCalculator;
use maxpain_rs::chain::{ChainSnapshot, Contract};
use maxpain_rs::error::WriteError;
use maxpain_rs::report::text::group_thousands;
use maxpain_rs::report::{ReportWriter, RunReport};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn expiry() -> NaiveDate {
    date(2024, 6, 21)
}

/// 09:31 New York time on `trade_date`.
fn run_time(trade_date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&trade_date.and_hms_opt(13, 31, 0).expect("valid time"))
}

fn report_for(trade_date: NaiveDate, price: Decimal, calls_at_105: u64) -> RunReport {
    let chain = ChainSnapshot::new(
        "SPY",
        price,
        run_time(trade_date),
        trade_date,
        [expiry()],
        vec![
            Contract::call(dec!(100), 50, expiry()),
            Contract::call(dec!(105), calls_at_105, expiry()),
            Contract::put(dec!(95), 20, expiry()),
            Contract::put(dec!(100), 40, expiry()),
        ],
    );
    let result = MaxPainCalculator::default()
        .compute(&chain, expiry())
        .expect("compute failed");
    RunReport::new(&chain, vec![result])
}

fn leftover_staging_files(dir: &Path) -> Vec<String> {
    let mut found = Vec::new();
    for sub in ["daily", "summaries"] {
        let Ok(entries) = fs::read_dir(dir.join(sub)) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".tmp") || name.ends_with(".bak") {
                found.push(name);
            }
        }
    }
    found
}

// ===================================================================
// Artifacts
// ===================================================================

#[test]
fn test_write_produces_all_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = ReportWriter::new(dir.path(), New_York);
    let report = report_for(date(2024, 6, 14), dec!(102), 30);

    let written = writer.write(&report).expect("write failed");

    assert_eq!(written.json, dir.path().join("daily/SPY_2024-06-14_max_pain.json"));
    assert_eq!(written.report, dir.path().join("daily/SPY_2024-06-14_report.txt"));
    assert_eq!(written.history, dir.path().join("summaries/SPY_max_pain_history.csv"));

    let json = fs::read_to_string(&written.json).expect("read json");
    let decoded: RunReport = serde_json::from_str(&json).expect("decode json");
    assert_eq!(decoded, report);
    assert!(json.contains("nearby_strikes"));

    let rows = writer.load_history("SPY", None).expect("load_history failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, date(2024, 6, 14));
    assert_eq!(rows[0].expiration, expiry());
    assert_eq!(rows[0].max_pain_strike, dec!(100));
    assert_eq!(rows[0].put_call_ratio, Some(dec!(0.75)));

    assert!(leftover_staging_files(dir.path()).is_empty());
}

#[test]
fn test_text_report_layout() {
    let writer = ReportWriter::new("unused", New_York);
    let text = writer.render_text(&report_for(date(2024, 6, 14), dec!(102), 30));

    assert!(text.starts_with("MAX PAIN REPORT - SPY\n"));
    assert!(text.contains("Generated: 2024-06-14 09:31:00 EDT"));
    assert!(text.contains("Current Price: $102.00"));
    assert!(text.contains(&"=".repeat(60)));
    assert!(text.contains("EXPIRATION: 2024-06-21 (7 days)"));
    assert!(text.contains("Max Pain Price: $100.00"));
    assert!(text.contains("Distance from Current: $2.00 (+1.96%)"));
    assert!(text.contains("Put/Call Ratio: 0.750"));
    assert!(text.contains("Total Call OI: 80"));
    assert!(text.contains("  $95.00: Pain Value = $20,000\n"));
    assert!(text.contains("  $100.00: Pain Value = $0 <- MAX PAIN\n"));
    assert_eq!(text.matches("<- MAX PAIN").count(), 1);
}

#[test]
fn test_text_report_without_call_oi() {
    let trade_date = date(2024, 6, 14);
    let chain = ChainSnapshot::new(
        "QQQ",
        dec!(100),
        run_time(trade_date),
        trade_date,
        [expiry()],
        vec![Contract::put(dec!(100), 1_250_000, expiry())],
    );
    let result = MaxPainCalculator::default()
        .compute(&chain, expiry())
        .expect("compute failed");
    let text = ReportWriter::new("unused", New_York).render_text(&RunReport::new(&chain, vec![result]));

    assert!(text.contains("Put/Call Ratio: N/A"));
    assert!(text.contains("Total Put OI: 1,250,000"));
    assert!(text.contains("Total Call OI: 0"));
}

#[test]
fn test_group_thousands() {
    assert_eq!(group_thousands(0), "0");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1_000), "1,000");
    assert_eq!(group_thousands(1_234_567), "1,234,567");
}

// ===================================================================
// Reruns
// ===================================================================

#[test]
fn test_same_day_rerun_replaces() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = ReportWriter::new(dir.path(), New_York);
    let day = date(2024, 6, 14);

    writer.write(&report_for(day, dec!(102), 30)).expect("first write failed");
    let second = report_for(day, dec!(103), 35);
    let written = writer.write(&second).expect("second write failed");

    let decoded: RunReport =
        serde_json::from_str(&fs::read_to_string(&written.json).expect("read json")).expect("decode json");
    assert_eq!(decoded, second);

    let text = fs::read_to_string(&written.report).expect("read report");
    assert!(text.contains("Current Price: $103.00"));
    assert!(!text.contains("Current Price: $102.00"));

    let rows = writer.load_history("SPY", None).expect("load_history failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].current_price, dec!(103));
    assert_eq!(rows[0].total_call_oi, 85);

    let daily: Vec<_> = fs::read_dir(dir.path().join("daily")).expect("read_dir").collect();
    assert_eq!(daily.len(), 2);
}

#[test]
fn test_next_day_appends() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = ReportWriter::new(dir.path(), New_York);
    let monday = date(2024, 6, 17);
    let tuesday = date(2024, 6, 18);

    writer.write(&report_for(monday, dec!(101), 30)).expect("write failed");
    writer.write(&report_for(tuesday, dec!(99), 30)).expect("write failed");
    // rerun of the earlier day keeps row order
    writer.write(&report_for(monday, dec!(100.5), 30)).expect("write failed");

    let rows = writer.load_history("SPY", None).expect("load_history failed");
    let summary: Vec<(NaiveDate, Decimal)> = rows.iter().map(|r| (r.date, r.current_price)).collect();
    assert_eq!(summary, vec![(monday, dec!(100.5)), (tuesday, dec!(99))]);
    assert_eq!(rows[1].days_to_expiration, 3);
}

#[test]
fn test_load_history_since() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = ReportWriter::new(dir.path(), New_York);
    let start = date(2024, 6, 10);

    for offset in 0..4 {
        let day = start + Duration::days(offset);
        writer.write(&report_for(day, dec!(100), 30)).expect("write failed");
    }

    let recent = writer
        .load_history("SPY", Some(date(2024, 6, 12)))
        .expect("load_history failed");
    let dates: Vec<NaiveDate> = recent.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date(2024, 6, 12), date(2024, 6, 13)]);
}

#[test]
fn test_load_history_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = ReportWriter::new(dir.path(), New_York);

    let rows = writer.load_history("IWM", None).expect("load_history failed");
    assert!(rows.is_empty());
}

// ===================================================================
// Atomicity
// ===================================================================

#[test]
fn test_failed_commit_leaves_nothing_behind() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = ReportWriter::new(dir.path(), New_York);
    let report = report_for(date(2024, 6, 14), dec!(102), 30);

    // a directory in place of the JSON file makes the rename fail
    let json_path = writer.json_path("SPY", report.trade_date);
    fs::create_dir_all(json_path.join("blocker")).expect("create blocker");

    let err = writer.write(&report).expect_err("write should fail");
    assert!(matches!(err, WriteError::Io { .. }));

    assert!(!writer.report_path("SPY", report.trade_date).exists());
    assert!(!writer.history_path("SPY").exists());
    assert!(leftover_staging_files(dir.path()).is_empty());
}

#[test]
fn test_failed_second_rename_unpublishes_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = ReportWriter::new(dir.path(), New_York);
    let report = report_for(date(2024, 6, 14), dec!(102), 30);

    // the JSON lands first, then the report rename fails
    let report_path = writer.report_path("SPY", report.trade_date);
    fs::create_dir_all(report_path.join("blocker")).expect("create blocker");

    let err = writer.write(&report).expect_err("write should fail");
    assert!(matches!(err, WriteError::Io { ref path, .. } if *path == report_path));

    assert!(!writer.json_path("SPY", report.trade_date).exists());
    assert!(!writer.history_path("SPY").exists());
    assert!(leftover_staging_files(dir.path()).is_empty());
}

#[test]
fn test_failed_rerun_restores_previous_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = ReportWriter::new(dir.path(), New_York);
    let trade_date = date(2024, 6, 14);

    let first = writer
        .write(&report_for(trade_date, dec!(102), 30))
        .expect("first write failed");
    let json_before = fs::read(&first.json).expect("read json");
    let history_before = fs::read(&first.history).expect("read history");

    fs::remove_file(&first.report).expect("remove report");
    fs::create_dir_all(first.report.join("blocker")).expect("create blocker");

    writer
        .write(&report_for(trade_date, dec!(101), 500))
        .expect_err("rerun should fail");

    assert_eq!(fs::read(&first.json).expect("read json"), json_before);
    assert_eq!(fs::read(&first.history).expect("read history"), history_before);
    assert!(first.report.is_dir());
    assert!(leftover_staging_files(dir.path()).is_empty());
}
