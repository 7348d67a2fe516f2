//! Common test utilities for minio-statemap integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

/// Run minio-statemap with the given arguments, returning the full Output.
pub fn run_statemap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_minio-statemap"))
        .args(args)
        .output()
        .expect("Failed to run minio-statemap")
}

/// Write `contents` to `name` inside `dir` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write test input");
    path
}

/// One non-verbose `mc admin trace --json` record.
pub fn minio_record(host: &str, time: &str, duration_ns: u64, api: &str) -> String {
    serde_json::json!({
        "host": host,
        "time": time,
        "client": "10.0.0.9",
        "callStats": {
            "rx": 0,
            "tx": 1024,
            "duration": duration_ns,
            "timeToFirstByte": 0,
        },
        "api": api,
        "path": "/bucket/object",
        "query": "",
        "statusCode": 200,
        "statusMsg": "OK",
    })
    .to_string()
}

/// One native event stream record.
pub fn native_event(entity: &str, op: &str, phase: &str, time: u64, request: &str) -> String {
    serde_json::json!({
        "entity": entity,
        "op": op,
        "phase": phase,
        "time": time,
        "request": request,
    })
    .to_string()
}

/// Parsed statemap output: the metadata object and the state records.
pub struct Statemap {
    pub meta: Value,
    pub states: Vec<Value>,
}

impl Statemap {
    pub fn parse(stdout: &[u8]) -> Statemap {
        let mut stream = serde_json::Deserializer::from_slice(stdout).into_iter::<Value>();
        let meta = stream
            .next()
            .expect("statemap output is empty")
            .expect("statemap metadata is not JSON");
        let states = stream
            .map(|record| record.expect("statemap record is not JSON"))
            .collect();
        Statemap { meta, states }
    }

    /// Label for a numeric state value, from the metadata legend.
    pub fn label(&self, value: u64) -> String {
        self.meta["states"]
            .as_object()
            .expect("states is not an object")
            .iter()
            .find(|(_, entry)| entry["value"] == value)
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| panic!("state {value} missing from legend"))
    }

    /// `(time, label)` pairs for one entity, in output order.
    pub fn entity_states(&self, entity: &str) -> Vec<(u64, String)> {
        self.states
            .iter()
            .filter(|s| s["entity"] == entity)
            .map(|s| {
                let time = s["time"]
                    .as_str()
                    .expect("time is not a string")
                    .parse()
                    .expect("time is not a number");
                (time, self.label(s["state"].as_u64().expect("state is not a number")))
            })
            .collect()
    }
}
