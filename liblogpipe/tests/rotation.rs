//! Midnight rotation and dual-file behavior of the file sink

use liblogpipe::*;

use chrono::{Duration, Local, NaiveTime, TimeZone};
use std::fs;

/// Epoch nanos of the local midnight `days` from today.
fn midnight_nanos(days: i64) -> i64 {
    let day = Local::now().date_naive() + Duration::days(days);
    Local
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .unwrap()
        .timestamp_millis()
        * 1_000_000
}

/// ISO date string of the local day `days` from today.
fn day_iso(days: i64) -> String {
    (Local::now().date_naive() + Duration::days(days)).to_string()
}

fn hours(h: i64) -> i64 {
    h * 3_600_000_000_000
}

fn minutes(m: i64) -> i64 {
    m * 60_000_000_000
}

#[test]
fn test_split_mode_filters_the_plain_file() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("app-%F.log").to_string_lossy().into_owned();
    let mut writer = RollingFileWriter::new(template, true);
    let day0 = midnight_nanos(0);

    writer.write(day0 + hours(1), Level::Fine, "detail", None, None).unwrap();
    writer.write(day0 + hours(2), Level::Info, "notice", None, None).unwrap();
    writer.write(day0 + hours(3), Level::Warn, "watch out", None, None).unwrap();
    writer.write(day0 + hours(4), Level::Err, "broken", None, None).unwrap();

    let all = fs::read_to_string(dir.path().join(format!("app-{}.all.log", day_iso(0)))).unwrap();
    let plain = fs::read_to_string(dir.path().join(format!("app-{}.log", day_iso(0)))).unwrap();

    for line in ["detail", "notice", "watch out", "broken"] {
        assert!(all.contains(line), "missing from .all: {}", line);
    }
    assert!(!plain.contains("detail"), "FINE leaked into the plain file");
    for line in ["notice", "watch out", "broken"] {
        assert!(plain.contains(line), "missing from plain: {}", line);
    }
}

#[test]
fn test_midnight_rolls_both_files_together() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("app-%F.log").to_string_lossy().into_owned();
    let mut writer = RollingFileWriter::new(template, true);

    writer
        .write(midnight_nanos(0) + hours(3), Level::Fine, "tonight", None, None)
        .unwrap();
    writer
        .write(midnight_nanos(1) + hours(1), Level::Warn, "tomorrow", None, None)
        .unwrap();

    let all0 = fs::read_to_string(dir.path().join(format!("app-{}.all.log", day_iso(0)))).unwrap();
    let all1 = fs::read_to_string(dir.path().join(format!("app-{}.all.log", day_iso(1)))).unwrap();
    assert_eq!(all0.lines().count(), 1);
    assert_eq!(all1.lines().count(), 1);
    assert!(all0.contains("tonight"));
    assert!(all1.contains("tomorrow"));

    // both days opened a plain file, but only the WARN record passed the gate
    let plain0 = fs::read_to_string(dir.path().join(format!("app-{}.log", day_iso(0)))).unwrap();
    let plain1 = fs::read_to_string(dir.path().join(format!("app-{}.log", day_iso(1)))).unwrap();
    assert!(plain0.is_empty());
    assert!(plain1.contains("tomorrow"));
    assert_eq!(plain1.lines().count(), 1);
}

#[test]
fn test_single_mode_opens_one_file_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("run-%d.log").to_string_lossy().into_owned();
    let mut writer = RollingFileWriter::new(template, false);
    let day0 = midnight_nanos(0);

    for i in 0..50 {
        writer
            .write(day0 + minutes(i), Level::Info, "tick", None, None)
            .unwrap();
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

    writer
        .write(midnight_nanos(1) + minutes(1), Level::Info, "tock", None, None)
        .unwrap();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);

    // the %d template names files by the day's midnight millis
    let expected = dir.path().join(format!("run-{}.log", day0 / 1_000_000));
    assert!(expected.exists());
    let content = fs::read_to_string(expected).unwrap();
    assert_eq!(content.lines().count(), 50);
}

#[test]
fn test_reopen_appends_within_the_same_day() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("run-%d.log").to_string_lossy().into_owned();
    let time = midnight_nanos(0) + hours(5);

    let mut first = RollingFileWriter::new(template.clone(), false);
    first.write(time, Level::Info, "before restart", None, None).unwrap();
    drop(first);

    let mut second = RollingFileWriter::new(template, false);
    second
        .write(time + minutes(1), Level::Info, "after restart", None, None)
        .unwrap();

    let name = dir
        .path()
        .join(format!("run-{}.log", midnight_nanos(0) / 1_000_000));
    let content = fs::read_to_string(name).unwrap();
    assert!(content.contains("before restart"));
    assert!(content.contains("after restart"));
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn test_dual_mode_writes_records_with_templates_and_errors() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("app-%F.log").to_string_lossy().into_owned();
    let mut writer = RollingFileWriter::new(template, true);
    let time = midnight_nanos(0) + hours(6);

    writer
        .write(
            time,
            Level::Err,
            "job %d failed",
            Some(&[Arg::from(7)]),
            Some(&Thrown::new("E", "oops", "E: oops\n")),
        )
        .unwrap();

    let all = fs::read_to_string(dir.path().join(format!("app-{}.all.log", day_iso(0)))).unwrap();
    let plain = fs::read_to_string(dir.path().join(format!("app-{}.log", day_iso(0)))).unwrap();
    assert_eq!(all, plain, "an ERR record lands identically in both files");
    assert!(all.contains(" ERR: job 7 failed\nE: oops\n"));
    assert!(all.contains(" FINE: E: oops\n"));
}

#[test]
fn test_bad_name_template_fails_before_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("run-%c.log").to_string_lossy().into_owned();
    let mut writer = RollingFileWriter::new(template, false);

    let result = writer.write(midnight_nanos(0) + 1, Level::Info, "x", None, None);
    assert!(matches!(result, Err(Error::MalformedTemplate { .. })));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
