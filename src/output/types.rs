//! Records handed to output sinks.

use serde::Serialize;

use crate::legend::FrozenLegend;

/// Descriptive metadata for the statemap header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatemapMeta {
    pub title: String,
    /// Shown as the statemap `host`; for MinIO this is the cluster name.
    pub host: String,
    pub entity_kind: Option<String>,
}

impl Default for StatemapMeta {
    fn default() -> Self {
        Self {
            title: "MinIO".to_string(),
            host: "minio cluster".to_string(),
            entity_kind: None,
        }
    }
}

/// Statemap metadata object.
///
/// `start` is the absolute time of the earliest state as `[seconds,
/// nanoseconds]` since the Unix epoch; every state change is relative to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatemapHeader<'a> {
    pub start: [u64; 2],
    pub title: &'a str,
    pub host: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_kind: Option<&'a str>,
    pub states: &'a FrozenLegend,
}

/// One entity entering a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange<'a> {
    pub entity: &'a str,
    pub state: &'a str,
    pub value: u32,
    /// Tag of the request that opened the state, when the input carries one.
    pub tag: Option<&'a str>,
    /// Absolute start and end, in nanoseconds since the Unix epoch.
    pub start: u64,
    pub end: u64,
}
