#![cfg(unix)]

mod common;

use jdkscan::config::ScanConfig;
use jdkscan::models::JdkRecord;
use jdkscan::scanner::{DetectOptions, JdkScanner};
use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const EVENT_TIMEOUT: Duration = Duration::from_secs(15);

fn watch_scanner() -> JdkScanner {
    JdkScanner::new(ScanConfig {
        debounce_ms: 200,
        ..Default::default()
    })
}

fn watch_opts(dirs: &[&Path]) -> DetectOptions {
    DetectOptions {
        paths: dirs
            .iter()
            .map(|d| d.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .into(),
        ignore_platform_paths: true,
        observable: true,
        ..Default::default()
    }
}

/// Waits for a results event satisfying `pred`, skipping intermediate events.
fn wait_for(
    receiver: &Receiver<Vec<JdkRecord>>,
    pred: impl Fn(&[JdkRecord]) -> bool,
) -> Vec<JdkRecord> {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .expect("timed out waiting for results event");
        let records = receiver
            .recv_timeout(remaining)
            .expect("no results event before timeout");
        if pred(&records) {
            return records;
        }
    }
}

#[test]
fn watch_picks_up_added_and_removed_installations() {
    let temp = TempDir::new().unwrap();
    let dir_a = temp.path().join("a");
    let dir_b = temp.path().join("b");
    fs::create_dir_all(&dir_a).unwrap();
    fs::create_dir_all(&dir_b).unwrap();
    common::create_fake_jdk(&dir_a, "jdk8", "1.8.0", 92);

    let scanner = watch_scanner();
    let handle = scanner.watch(&watch_opts(&[&dir_a, &dir_b])).unwrap();

    let baseline = handle.collection().snapshot();
    assert_eq!(baseline.len(), 1);
    assert_eq!(baseline[0].build, Some(92));

    let (sender, receiver) = mpsc::channel();
    handle.on_results(move |records| {
        let _ = sender.send(records.to_vec());
    });

    // A JDK copied into the empty directory appears alongside the baseline.
    let jdk7 = common::create_fake_jdk(&dir_b, "jdk7", "1.7.0", 80);
    let records = wait_for(&receiver, |records| records.len() == 2);
    assert!(records.iter().any(|r| r.build == Some(80)));
    assert!(records.iter().any(|r| r.build == Some(92)));

    // Removing it again leaves only the original record.
    fs::remove_dir_all(&jdk7).unwrap();
    let records = wait_for(&receiver, |records| records.len() == 1);
    assert_eq!(records[0].build, Some(92));

    handle.stop();
}

#[test]
fn watch_preserves_records_outside_the_changed_directory() {
    let temp = TempDir::new().unwrap();
    let dir_a = temp.path().join("a");
    let dir_b = temp.path().join("b");
    fs::create_dir_all(&dir_a).unwrap();
    fs::create_dir_all(&dir_b).unwrap();
    common::create_fake_jdk(&dir_a, "jdk8", "1.8.0", 92);
    common::create_fake_jdk(&dir_b, "jdk7", "1.7.0", 80);

    let scanner = watch_scanner();
    let handle = scanner.watch(&watch_opts(&[&dir_a, &dir_b])).unwrap();
    assert_eq!(handle.collection().len(), 2);

    let (sender, receiver) = mpsc::channel();
    handle.on_results(move |records| {
        let _ = sender.send(records.to_vec());
    });

    // Dropping everything under b must not disturb a's record.
    fs::remove_dir_all(dir_b.join("jdk7")).unwrap();
    let records = wait_for(&receiver, |records| records.len() == 1);
    assert_eq!(records[0].build, Some(92));

    handle.stop();
}

#[test]
fn event_burst_coalesces_into_one_rescan() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("jdks");
    fs::create_dir_all(&dir).unwrap();

    let scanner = watch_scanner();
    let handle = scanner.watch(&watch_opts(&[&dir])).unwrap();

    let (sender, receiver) = mpsc::channel();
    handle.on_results(move |records| {
        let _ = sender.send(records.to_vec());
    });

    // A burst of sibling installs arriving within the debounce window.
    common::create_fake_jdk(&dir, "jdk6", "1.6.0", 45);
    common::create_fake_jdk(&dir, "jdk7", "1.7.0", 80);
    common::create_fake_jdk(&dir, "jdk8", "1.8.0", 92);

    let records = wait_for(&receiver, |records| records.len() == 3);
    let versions: Vec<String> = records
        .iter()
        .map(|r| r.version.as_ref().unwrap().to_string())
        .collect();
    assert_eq!(versions, vec!["1.6.0", "1.7.0", "1.8.0"]);

    handle.stop();
}

#[test]
fn stop_is_idempotent_and_silences_events() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("jdks");
    fs::create_dir_all(&dir).unwrap();

    let scanner = watch_scanner();
    let handle = scanner.watch(&watch_opts(&[&dir])).unwrap();

    let (sender, receiver) = mpsc::channel();
    handle.on_results(move |records| {
        let _ = sender.send(records.to_vec());
    });

    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());

    common::create_fake_jdk(&dir, "jdk8", "1.8.0", 92);
    assert!(
        receiver.recv_timeout(Duration::from_secs(1)).is_err(),
        "stopped session must not emit results"
    );
}

#[test]
fn watch_session_shares_the_detect_cache_entry() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("jdks");
    fs::create_dir_all(&dir).unwrap();
    common::create_fake_jdk(&dir, "jdk8", "1.8.0", 92);

    let scanner = watch_scanner();
    let opts = watch_opts(&[&dir]);
    let handle = scanner.watch(&opts).unwrap();

    match scanner.detect(&opts).unwrap() {
        jdkscan::scanner::DetectOutcome::Live(collection) => {
            assert!(std::sync::Arc::ptr_eq(&collection, &handle.collection()));
        }
        jdkscan::scanner::DetectOutcome::Snapshot(_) => panic!("expected live collection"),
    }

    handle.stop();
}
