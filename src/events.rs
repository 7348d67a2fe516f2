//! Trace event model.
//!
//! A [`TraceEvent`] is one BEGIN or END of a request on one entity (a MinIO
//! server instance). Events are transient: readers produce them, the converter
//! folds them into per-entity timelines and drops them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Whether an event opens or closes a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Begin,
    End,
}

/// Operation kind of a request, e.g. `s3.GetObject`.
///
/// The op kind doubles as the state label shown while it is the most
/// significant thing an entity is doing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpKind(String);

impl OpKind {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OpKind {
    fn from(s: &str) -> Self {
        OpKind(s.to_string())
    }
}

impl From<String> for OpKind {
    fn from(s: String) -> Self {
        OpKind(s)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque request token, unique among the open requests of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId(s)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One trace record in the native event stream format:
///
/// ```json
/// {"entity": "minio-1:9000", "op": "s3.GetObject", "phase": "begin",
///  "time": 1591980000123456789, "request": "r1", "tag": "/bucket/key"}
/// ```
///
/// `time` is either nanoseconds since the Unix epoch or an RFC3339 string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceEvent {
    #[serde(rename = "entity")]
    pub entity_id: String,
    #[serde(rename = "op")]
    pub op_kind: OpKind,
    pub phase: Phase,
    #[serde(rename = "time", deserialize_with = "deserialize_timestamp")]
    pub timestamp: u64,
    #[serde(rename = "request")]
    pub request_id: RequestId,
    #[serde(default)]
    pub tag: Option<String>,
}

impl TraceEvent {
    pub fn begin(entity: &str, op: &str, request: &str, timestamp: u64) -> Self {
        Self::new(entity, op, Phase::Begin, request, timestamp)
    }

    pub fn end(entity: &str, op: &str, request: &str, timestamp: u64) -> Self {
        Self::new(entity, op, Phase::End, request, timestamp)
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    fn new(entity: &str, op: &str, phase: Phase, request: &str, timestamp: u64) -> Self {
        TraceEvent {
            entity_id: entity.to_string(),
            op_kind: OpKind::from(op),
            phase,
            timestamp,
            request_id: RequestId::from(request),
            tag: None,
        }
    }
}

/// An event together with its 1-based position in the input, used to point
/// error messages at the offending record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEvent {
    pub record: u64,
    pub event: TraceEvent,
}

/// Nanoseconds since the Unix epoch, or `None` for times before 1970 or past
/// the range of an i64 nanosecond count.
pub fn timestamp_ns(time: &DateTime<Utc>) -> Option<u64> {
    time.timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTime {
        Nanos(u64),
        Rfc3339(DateTime<Utc>),
    }

    match RawTime::deserialize(deserializer)? {
        RawTime::Nanos(ns) => Ok(ns),
        RawTime::Rfc3339(time) => timestamp_ns(&time)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {time}"))),
    }
}
