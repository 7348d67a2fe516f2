//! MinIO trace reader.
//!
//! `mc admin trace --json` emits one record per completed call, sorted by
//! completion time, carrying only the completion time and the call duration.
//! Each record is expanded into a BEGIN at `time - duration` and an END at
//! `time`. Because the derived BEGINs are not in capture order, the reader
//! loads the whole trace and hands out the expanded events sorted by time.

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Deserializer;

use super::{EventSource, MemorySource};
use crate::error::{ConvertError, Result};
use crate::events::{timestamp_ns, IndexedEvent, OpKind, Phase, RequestId, TraceEvent};

/// Default, non-verbose MinIO trace record. Only the fields the conversion
/// needs are decoded; the rest of the record is ignored.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TraceData {
    host: String,
    time: DateTime<Utc>,
    call_stats: CallStats,
    api: String,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CallStats {
    duration: u64,
}

/// Tie-break for events sharing a timestamp: calls that finish at `t` close
/// before calls that start at `t`, and a zero-length call keeps its BEGIN
/// ahead of its END.
fn phase_rank(phase: Phase, zero_length: bool) -> u8 {
    match (phase, zero_length) {
        (Phase::End, false) => 0,
        (Phase::Begin, false) => 1,
        (Phase::Begin, true) => 2,
        (Phase::End, true) => 3,
    }
}

pub struct MinioReader {
    events: MemorySource,
    calls: u64,
}

impl MinioReader {
    pub fn new<R: Read>(reader: R) -> Result<Self> {
        let mut keyed = Vec::new();
        let mut calls = 0u64;

        let records = Deserializer::from_reader(reader).into_iter::<TraceData>();
        for (record, result) in (1u64..).zip(records) {
            let data = result.map_err(|e| ConvertError::Parse {
                record,
                message: format!("invalid minio json: {e}"),
            })?;
            for (key, event) in expand(record, data)? {
                keyed.push((key, IndexedEvent { record, event }));
            }
            calls = record;
        }

        keyed.sort_by_key(|(key, _)| *key);
        let events = keyed.into_iter().map(|(_, event)| event).collect();
        Ok(MinioReader {
            events: MemorySource::from_indexed(events),
            calls,
        })
    }

    /// Number of MinIO calls read from the trace.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

type SortKey = (u64, u8, u64);

fn expand(record: u64, data: TraceData) -> Result<[(SortKey, TraceEvent); 2]> {
    let end = timestamp_ns(&data.time).ok_or_else(|| ConvertError::Parse {
        record,
        message: format!("time {} is outside the supported range", data.time),
    })?;
    let begin = end
        .checked_sub(data.call_stats.duration)
        .ok_or_else(|| ConvertError::Parse {
            record,
            message: format!(
                "call duration {}ns exceeds completion time {}",
                data.call_stats.duration, data.time
            ),
        })?;
    let zero_length = begin == end;

    let event = |phase, timestamp| TraceEvent {
        entity_id: data.host.clone(),
        op_kind: OpKind::from(data.api.as_str()),
        phase,
        timestamp,
        request_id: RequestId::from(record.to_string()),
        tag: data.path.clone(),
    };

    Ok([
        (
            (begin, phase_rank(Phase::Begin, zero_length), record),
            event(Phase::Begin, begin),
        ),
        (
            (end, phase_rank(Phase::End, zero_length), record),
            event(Phase::End, end),
        ),
    ])
}

impl EventSource for MinioReader {
    fn next_event(&mut self) -> Result<Option<IndexedEvent>> {
        self.events.next_event()
    }
}
