//! End-to-end library tests: log text in, path tables out.

mod common;

use std::fs;
use std::io::Write;

use common::{sample_log, LogBuilder};
use delay_meas::{
    delay_stats, extract_delay, extract_delay_from_log, parse_log_file, Config, OpenPolicy,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

fn write_log(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_two_anchors_on_one_hash() {
    let dir = TempDir::new().unwrap();
    let log = write_log(&dir, "delay.log", &sample_log());

    let tables = extract_delay_from_log(&log, &Config::default()).unwrap();
    let mut keys = tables.keys();
    keys.sort();
    assert_eq!(keys, vec!["Ims_1->Upc_1", "Upc_1->Ims_1", "Upc_2->Ims_2"]);

    for key in ["Upc_1->Ims_1", "Upc_2->Ims_2"] {
        let table = tables.get_by_key(key).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].hash, 7);
        assert_eq!(table.rows()[0].delay_global_us, 2_000_000);
    }

    let table = tables.get_by_key("Ims_1->Upc_1").unwrap();
    assert_eq!(table.rows()[0].hash, 8);
    assert_eq!(table.rows()[0].delay_global_us, 1_000_500);
}

#[test]
fn test_parse_stats() {
    let dir = TempDir::new().unwrap();
    let log = write_log(&dir, "delay.log", &sample_log());

    let parsed = parse_log_file(&log).unwrap();
    assert_eq!(parsed.stats.lines, 5);
    assert_eq!(parsed.stats.commands, 2);
    assert_eq!(parsed.stats.blocks, 2);
    assert_eq!(parsed.stats.measurements, 6);
    assert_eq!(parsed.stats.decode_failures, 0);
    assert_eq!(parsed.stats.unrecognized, 1);
}

#[test]
fn test_gzip_log_matches_plain_log() {
    let dir = TempDir::new().unwrap();
    let plain = write_log(&dir, "delay.log", &sample_log());

    let gz_path = dir.path().join("delay.log.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(sample_log().as_bytes()).unwrap();
    fs::write(&gz_path, encoder.finish().unwrap()).unwrap();

    let config = Config {
        all_paths: true,
        ..Default::default()
    };
    assert_eq!(
        extract_delay_from_log(&plain, &config).unwrap(),
        extract_delay_from_log(&gz_path, &config).unwrap()
    );
}

#[test]
fn test_corrupt_block_does_not_abort() {
    let text = LogBuilder::new()
        .start("2021-10-01T07:19:58+00:00")
        .raw("2021-10-01T07:20:00+00:00  INFO centralservice::delay_meas_core: mime=application/json, data=bm90IGd6aXA=")
        .block(
            "2021-10-01T07:20:01+00:00",
            3,
            &[(1633072801, 0, "Upc", Some("1")), (1633072802, 0, "Ims", None)],
        )
        .stop("2021-10-01T07:20:10+00:00")
        .build();
    let dir = TempDir::new().unwrap();
    let parsed = parse_log_file(&write_log(&dir, "delay.log", &text)).unwrap();

    assert_eq!(parsed.stats.decode_failures, 1);
    let tables = extract_delay(&parsed, &Config::default());
    assert_eq!(tables.row_count(), 1);
}

#[test]
fn test_restart_policy_drops_early_events() {
    let text = LogBuilder::new()
        .start("2021-10-01T07:19:58+00:00")
        .block(
            "2021-10-01T07:20:00+00:00",
            3,
            &[(1633072800, 0, "Upc", Some("1")), (1633072801, 0, "Ims", None)],
        )
        .start("2021-10-01T07:20:05+00:00")
        .stop("2021-10-01T07:20:10+00:00")
        .build();
    let dir = TempDir::new().unwrap();
    let parsed = parse_log_file(&write_log(&dir, "delay.log", &text)).unwrap();

    assert_eq!(extract_delay(&parsed, &Config::default()).row_count(), 1);
    let restart = Config {
        open_policy: OpenPolicy::Restart,
        ..Default::default()
    };
    assert!(extract_delay(&parsed, &restart).is_empty());
}

#[test]
fn test_stats_over_sample_log() {
    let dir = TempDir::new().unwrap();
    let log = write_log(&dir, "delay.log", &sample_log());
    let stats = delay_stats(&extract_delay_from_log(&log, &Config::default()).unwrap());

    assert_eq!(stats.summary.path_count, 3);
    assert_eq!(stats.summary.total_rows, 3);
    assert!(stats.paths.iter().all(|p| p.rows == 1));
}
