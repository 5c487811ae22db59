//! Logger integration tests
//!
//! Build real loggers against scratch directories and check what ends up
//! in the dated log files.

use std::fs;
use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use logkit_core::logging::{log_file_name, REF_ID_KEY, TRACE_ID_KEY};
use logkit_core::{Field, Level, LogOptions, Logger, Params, RequestIdGenerator};
use serde_json::{json, Value};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn scratch() -> (TempDir, String) {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("log").display().to_string();
    (temp, dir)
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn records(path: &Path) -> Vec<Value> {
    lines(path)
        .iter()
        .map(|l| serde_json::from_str(l).expect("JSON record"))
        .collect()
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

#[derive(Debug)]
struct ServiceError;

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("found an error in the service")
    }
}

impl std::error::Error for ServiceError {}

// ============================================================================
// Path derivation
// ============================================================================

#[test]
fn test_prefix_in_file_name() {
    let (_temp, dir) = scratch();
    let opts = LogOptions::default().with_time_zone("UTC");

    let plain = Logger::new(&dir, "", &opts).unwrap();
    let prefixed = Logger::new(&dir, "svc", &opts).unwrap();

    let today = Utc::now().date_naive();
    assert_eq!(
        plain.output_file().file_name().unwrap().to_str().unwrap(),
        log_file_name("", today)
    );
    assert_eq!(
        prefixed.output_file().file_name().unwrap().to_str().unwrap(),
        log_file_name("svc", today)
    );
    assert_eq!(plain.output_file().parent().unwrap(), Path::new(&dir));
}

// ============================================================================
// Level & encoding
// ============================================================================

#[test]
fn test_production_drops_debug() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default()).unwrap();

    assert_eq!(logger.min_level(), Level::Info);
    logger.debug("debug message", &[]);
    logger.sugar().debug("sugared debug");

    assert!(lines(logger.output_file()).is_empty());
}

#[test]
fn test_development_keeps_debug() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default().development()).unwrap();

    assert_eq!(logger.min_level(), Level::Debug);
    assert!(logger.is_development());
    logger.debug("debug message", &[]);

    let lines = lines(logger.output_file());
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("\tDEBUG\tdebug message"));
}

#[test]
fn test_all_levels_in_order() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default().development()).unwrap();

    logger.debug("debug message", &[]);
    logger.error("error message", &[]);
    logger.info("info message", &[]);
    logger.warn("warning message", &[]);

    let levels: Vec<String> = lines(logger.output_file())
        .iter()
        .map(|l| l.split('\t').nth(1).unwrap().to_string())
        .collect();
    assert_eq!(levels, vec!["DEBUG", "ERROR", "INFO", "WARN"]);
}

// ============================================================================
// Field injection
// ============================================================================

#[test]
fn test_trace_only() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default().with_trace()).unwrap();
    logger.info("one", &[]);
    logger.info("two", &[]);

    let records = records(logger.output_file());
    let trace = logger.trace_id().unwrap();
    for record in &records {
        assert_eq!(record[TRACE_ID_KEY], trace);
        assert!(record.get(REF_ID_KEY).is_none());
    }
}

#[test]
fn test_ref_only() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default().with_ref_id("X")).unwrap();
    logger.info("one", &[]);

    let records = records(logger.output_file());
    assert_eq!(records[0][REF_ID_KEY], "X");
    assert!(records[0].get(TRACE_ID_KEY).is_none());
    assert_eq!(logger.trace_id(), None);
}

#[test]
fn test_trace_and_ref() {
    let (_temp, dir) = scratch();
    let opts = LogOptions::default().with_trace().with_ref_id("X");
    let logger = Logger::new(&dir, "", &opts).unwrap();
    logger.info("one", &[]);

    let records = records(logger.output_file());
    assert!(records[0][TRACE_ID_KEY].is_string());
    assert_eq!(records[0][REF_ID_KEY], "X");
}

#[test]
fn test_neither_trace_nor_ref() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default()).unwrap();
    logger.info("one", &[]);

    let records = records(logger.output_file());
    assert!(records[0].get(TRACE_ID_KEY).is_none());
    assert!(records[0].get(REF_ID_KEY).is_none());
    assert!(logger.initial_fields().is_empty());
}

#[test]
fn test_trace_id_comes_from_given_generator() {
    let (_temp, dir) = scratch();
    let gen = RequestIdGenerator::new();
    let opts = LogOptions::default().with_trace();

    let first = Logger::with_generator(&dir, "a", &opts, &gen).unwrap();
    let second = Logger::with_generator(&dir, "b", &opts, &gen).unwrap();

    assert!(first.trace_id().unwrap().ends_with("-000001"));
    assert!(second.trace_id().unwrap().ends_with("-000002"));
}

// ============================================================================
// Message / params / error convenience call
// ============================================================================

#[test]
fn test_log_message_only() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default()).unwrap();
    logger.log("m", None, None);

    let records = records(logger.output_file());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "info");
    assert_eq!(records[0]["msg"], "m");
}

#[test]
fn test_log_message_with_params() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default()).unwrap();
    logger.log("m", Some(&params(&[("k", "v")])), None);

    let records = records(logger.output_file());
    assert_eq!(records[0]["level"], "info");
    assert_eq!(records[0]["msg"], "m");
    assert_eq!(records[0]["k"], "v");
}

#[test]
fn test_log_error_only() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default()).unwrap();
    logger.log("", None, Some(&ServiceError));

    let records = records(logger.output_file());
    assert_eq!(records[0]["level"], "error");
    assert_eq!(records[0]["msg"], "found an error in the service");
}

#[test]
fn test_log_error_with_params() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default()).unwrap();
    logger.log("m", Some(&params(&[("k", "v")])), Some(&ServiceError));

    let records = records(logger.output_file());
    assert_eq!(records[0]["level"], "error");
    assert_eq!(records[0]["msg"], "found an error in the service");
    assert_eq!(records[0]["k"], "v");
}

#[test]
fn test_log_sequence_in_development() {
    let (_temp, dir) = scratch();
    let opts = LogOptions::default().development().with_trace();
    let logger = Logger::new(&dir, "", &opts).unwrap();

    let full = params(&[("request", "a request"), ("response", "a response")]);
    logger.log("a full service", Some(&full), None);
    logger.log("an empty service", None, None);
    logger.log("a full error service", Some(&full), Some(&ServiceError));
    logger.log("an empty error service", None, Some(&ServiceError));

    let lines = lines(logger.output_file());
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("\tINFO\ta full service\t"));
    assert!(lines[0].contains("\"request\":\"a request\""));
    assert!(lines[1].contains("\tINFO\tan empty service\t{\"trace-id\""));
    assert!(lines[2].contains("\tERROR\tfound an error in the service\t"));
    assert!(lines[2].contains("\"response\":\"a response\""));
    assert!(lines[3].contains("\tERROR\tfound an error in the service\t"));
}

// ============================================================================
// Sinks
// ============================================================================

#[test]
fn test_extra_file_sink() {
    let (temp, dir) = scratch();
    let extra = temp.path().join("mirror.log");
    let opts = LogOptions::default().with_output(extra.display().to_string());
    let logger = Logger::new(&dir, "", &opts).unwrap();

    logger.info("mirrored", &[]);

    assert_eq!(lines(logger.output_file()), lines(&extra));
    assert_eq!(logger.sinks().len(), 2);
}

#[test]
fn test_duplicate_sink_is_written_twice() {
    let (temp, dir) = scratch();
    let extra = temp.path().join("twice.log").display().to_string();
    let opts = LogOptions::default()
        .with_output(extra.clone())
        .with_output(extra.clone());
    let logger = Logger::new(&dir, "", &opts).unwrap();

    logger.info("once", &[]);

    assert_eq!(lines(logger.output_file()).len(), 1);
    assert_eq!(lines(Path::new(&extra)).len(), 2);
    assert_eq!(logger.sinks()[1..], [extra.clone(), extra]);
}

#[test]
fn test_console_sinks_follow_file() {
    let (_temp, dir) = scratch();
    let opts = LogOptions::default().with_output("stdout").with_output("stderr");
    let logger = Logger::new(&dir, "", &opts).unwrap();

    let sinks = logger.sinks();
    assert_eq!(sinks[0], logger.output_file().display().to_string());
    assert_eq!(sinks[1..], ["stdout".to_string(), "stderr".to_string()]);

    logger.info("to console too", &[]);
    assert_eq!(lines(logger.output_file()).len(), 1);
}

// ============================================================================
// Timestamps
// ============================================================================

#[test]
fn test_timestamps_in_configured_zone() {
    let (_temp, dir) = scratch();
    for zone in ["Pacific/Kiritimati", "America/Los_Angeles", "Asia/Jakarta"] {
        let opts = LogOptions::default().with_time_zone(zone);
        let logger = Logger::new(&dir, zone.replace('/', "_").as_str(), &opts).unwrap();
        logger.info("tick", &[]);

        let records = records(logger.output_file());
        let ts = records[0]["ts"].as_str().unwrap();
        let logged = NaiveDateTime::parse_from_str(ts, "%Y/%m/%d %H:%M:%S").unwrap();
        let expected = Utc::now().with_timezone(&logger.time_zone()).naive_local();

        let drift = (expected - logged).num_seconds().abs();
        assert!(drift <= 5, "{zone}: logged {logged}, expected about {expected}");
    }
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_logging() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default().development()).unwrap();

    std::thread::scope(|s| {
        for t in 0..8 {
            let logger = logger.clone();
            s.spawn(move || {
                for i in 0..50 {
                    logger.info("worker", &[Field::int("thread", t), Field::int("i", i)]);
                }
            });
        }
    });

    let lines = lines(logger.output_file());
    assert_eq!(lines.len(), 400);
    assert!(lines.iter().all(|l| l.contains("\tINFO\tworker\t")));
}

#[test]
fn test_production_sampling_bounds_volume() {
    let (_temp, dir) = scratch();
    let logger = Logger::new(&dir, "", &LogOptions::default()).unwrap();

    for _ in 0..150 {
        logger.info("same message", &[]);
    }
    logger.info("different message", &[]);

    let records = records(logger.output_file());
    // at most one tick boundary can pass while writing
    assert!(records.len() <= 152);
    assert!(records.len() >= 101);
    assert_eq!(records.last().unwrap()["msg"], json!("different message"));
}
