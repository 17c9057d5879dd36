//! Common test utilities for delay-meas integration tests.

#![allow(dead_code)]

use std::io::Write;

use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;

/// Module path every test line is logged under.
pub const LOG_PREFIX: &str = "INFO centralservice::delay_meas_core:";

/// One measurement inside a block: (secs, nanos, origin, meas_id).
pub type Meas<'a> = (u64, u32, &'a str, Option<&'a str>);

/// Base64 of the gzipped JSON block for `hash`.
pub fn block_payload(hash: u64, meas: &[Meas<'_>]) -> String {
    let entries: Vec<serde_json::Value> = meas
        .iter()
        .map(|&(secs, nanos, origin, meas_id)| {
            json!({
                "timestamp": {"secs": secs, "nanos": nanos},
                "meas_id": meas_id,
                "origin": origin,
            })
        })
        .collect();
    let doc = json!({"hash": hash, "meas": entries}).to_string();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(doc.as_bytes()).unwrap();
    base64::engine::general_purpose::STANDARD.encode(encoder.finish().unwrap())
}

/// Line builder for synthetic service logs.
#[derive(Default)]
pub struct LogBuilder {
    lines: Vec<String>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, ts: &str) -> Self {
        self.lines
            .push(format!("{ts}  {LOG_PREFIX} Start msg from FSW received"));
        self
    }

    pub fn stop(mut self, ts: &str) -> Self {
        self.lines
            .push(format!("{ts}  {LOG_PREFIX} Stop msg from FSW received"));
        self
    }

    pub fn block(mut self, ts: &str, hash: u64, meas: &[Meas<'_>]) -> Self {
        self.lines.push(format!(
            "{ts}  {LOG_PREFIX} mime=application/json, data={}",
            block_payload(hash, meas)
        ));
        self
    }

    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn build(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Log with one session, two hashes and two anchors on the same hash.
///
/// Hash 7: Upc(id 1)@0, Upc(id 2)@1, Ims@2, Ims@3 -> Upc_1->Ims_1 and Upc_2->Ims_2
/// Hash 8: Ims@4, Upc(id 1)@5 -> Ims_1->Upc_1
pub fn sample_log() -> String {
    const T0: u64 = 1633072800;
    LogBuilder::new()
        .start("2021-10-01T07:19:58+00:00")
        .block(
            "2021-10-01T07:20:00+00:00",
            7,
            &[
                (T0, 0, "Upc", Some("1")),
                (T0 + 1, 0, "Upc", Some("2")),
                (T0 + 2, 0, "Ims", None),
                (T0 + 3, 0, "Ims", None),
            ],
        )
        .block(
            "2021-10-01T07:20:04+00:00",
            8,
            &[(T0 + 4, 0, "Ims", None), (T0 + 5, 500_000, "Upc", Some("1"))],
        )
        .raw("2021-10-01T07:20:05+00:00  INFO centralservice::other: unrelated message")
        .stop("2021-10-01T07:20:10+00:00")
        .build()
}
