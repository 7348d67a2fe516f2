//! Per-entity timeline reconstruction.
//!
//! Each entity (MinIO server instance) gets one [`EntityTimelineBuilder`]. It
//! keeps the requests currently open on that entity and the interval the
//! entity is currently in. Every BEGIN/END recomputes the composite label via
//! the [`PriorityTable`]; when the label changes, the active interval is closed
//! and a new one is opened at the same timestamp, so intervals never overlap
//! and never leave gaps.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{ConvertError, ProtocolViolation, Result};
use crate::events::{OpKind, Phase, RequestId, TraceEvent};
use crate::policy::PriorityTable;

/// What to do with an END whose request was never opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Abort the conversion with a protocol error.
    #[default]
    Fail,
    /// Drop the event and log a warning.
    Warn,
}

/// A maximal span during which an entity's composite state was constant.
///
/// `start` is inclusive and `end` exclusive, both in nanoseconds since the
/// Unix epoch. `tag` is the tag of the request that put the entity into this
/// state: the earliest opened request of the winning op kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub start: u64,
    pub end: u64,
}

/// Finished, ordered intervals for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTimeline {
    pub entity_id: String,
    pub intervals: Vec<Interval>,
}

/// Result of feeding one event to a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The composite label is unchanged; no boundary was produced.
    Absorbed,
    /// A new active interval was opened with a different label.
    Changed,
    /// The event was an orphan END and was dropped.
    DroppedOrphan,
}

/// The interval an entity is currently in; it has a start but no end yet.
#[derive(Debug)]
struct ActiveInterval {
    state: String,
    tag: Option<String>,
    start: u64,
}

#[derive(Debug)]
struct OpenRequest {
    kind: OpKind,
    tag: Option<String>,
    // arrival order within the entity
    seq: u64,
}

#[derive(Debug)]
pub struct EntityTimelineBuilder {
    entity_id: String,
    open: HashMap<RequestId, OpenRequest>,
    // multiset of open op kinds, the input to the reduction policy
    kinds: BTreeMap<OpKind, usize>,
    active: Option<ActiveInterval>,
    last_ts: Option<u64>,
    next_seq: u64,
    intervals: Vec<Interval>,
}

impl EntityTimelineBuilder {
    pub fn new(entity_id: &str) -> Self {
        EntityTimelineBuilder {
            entity_id: entity_id.to_string(),
            open: HashMap::new(),
            kinds: BTreeMap::new(),
            active: None,
            last_ts: None,
            next_seq: 0,
            intervals: Vec::new(),
        }
    }

    /// Label of the active interval, if the entity has been introduced.
    pub fn current_state(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.state.as_str())
    }

    /// Number of requests currently open on this entity.
    pub fn open_requests(&self) -> usize {
        self.open.len()
    }

    fn protocol_error(
        &self,
        record: u64,
        timestamp: u64,
        violation: ProtocolViolation,
    ) -> ConvertError {
        ConvertError::Protocol {
            entity: self.entity_id.clone(),
            record,
            timestamp,
            violation,
        }
    }

    /// Fold one event into the timeline.
    ///
    /// `record` is the event's position in the input and is only used for
    /// error reporting.
    pub fn on_event(
        &mut self,
        record: u64,
        event: &TraceEvent,
        table: &PriorityTable,
        orphans: OrphanPolicy,
    ) -> Result<Outcome> {
        let ts = event.timestamp;
        if let Some(previous) = self.last_ts {
            if ts < previous {
                return Err(self.protocol_error(
                    record,
                    ts,
                    ProtocolViolation::TimeWentBackwards { previous },
                ));
            }
        }

        match event.phase {
            Phase::Begin => {
                if event.op_kind.as_str() == table.idle_label() {
                    return Err(self.protocol_error(
                        record,
                        ts,
                        ProtocolViolation::ReservedLabel {
                            op: event.op_kind.clone(),
                        },
                    ));
                }
                if self.open.contains_key(&event.request_id) {
                    return Err(self.protocol_error(
                        record,
                        ts,
                        ProtocolViolation::DuplicateBegin {
                            request: event.request_id.clone(),
                        },
                    ));
                }
                self.open.insert(
                    event.request_id.clone(),
                    OpenRequest {
                        kind: event.op_kind.clone(),
                        tag: event.tag.clone(),
                        seq: self.next_seq,
                    },
                );
                self.next_seq += 1;
                *self.kinds.entry(event.op_kind.clone()).or_insert(0) += 1;
            }
            Phase::End => {
                let Some(request) = self.open.remove(&event.request_id) else {
                    let violation = ProtocolViolation::OrphanEnd {
                        request: event.request_id.clone(),
                    };
                    return match orphans {
                        OrphanPolicy::Fail => Err(self.protocol_error(record, ts, violation)),
                        OrphanPolicy::Warn => {
                            warn!(
                                "record {}: entity {} at {}: dropping {}",
                                record, self.entity_id, ts, violation
                            );
                            Ok(Outcome::DroppedOrphan)
                        }
                    };
                };
                if let Some(count) = self.kinds.get_mut(&request.kind) {
                    *count -= 1;
                    if *count == 0 {
                        self.kinds.remove(&request.kind);
                    }
                }
            }
        }
        self.last_ts = Some(ts);

        let label = table.reduce(self.kinds.keys());
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.state == label)
        {
            return Ok(Outcome::Absorbed);
        }
        let label = label.to_string();
        let tag = self.opening_tag(&label);

        match self.active.take() {
            Some(active) => {
                trace!(
                    "{}: {} -> {} at {}",
                    self.entity_id,
                    active.state,
                    label,
                    ts
                );
                self.close(active, ts);
            }
            None => debug!("{}: first seen at {} in {}", self.entity_id, ts, label),
        }
        self.open_interval(label, tag, ts);
        Ok(Outcome::Changed)
    }

    // Tag of the earliest opened request whose kind is `label`.
    fn opening_tag(&self, label: &str) -> Option<String> {
        self.open
            .values()
            .filter(|request| request.kind.as_str() == label)
            .min_by_key(|request| request.seq)
            .and_then(|request| request.tag.clone())
    }

    // Zero-length intervals are not recorded; their neighbours stay contiguous.
    fn close(&mut self, active: ActiveInterval, end: u64) {
        if end > active.start {
            self.intervals.push(Interval {
                state: active.state,
                tag: active.tag,
                start: active.start,
                end,
            });
        }
    }

    fn open_interval(&mut self, state: String, tag: Option<String>, ts: u64) {
        // A dropped zero-length interval can leave us resuming the state we
        // just left; extend that interval instead of starting a twin.
        let resumed = match self.intervals.last() {
            Some(last) if last.state == state && last.end == ts => self.intervals.pop(),
            _ => None,
        };
        self.active = Some(match resumed {
            Some(last) => ActiveInterval {
                state,
                tag: last.tag,
                start: last.start,
            },
            None => ActiveInterval {
                state,
                tag,
                start: ts,
            },
        });
    }

    /// Close the active interval at `end` and hand back the finished timeline.
    ///
    /// An entity that never accepted an event yields an empty timeline.
    pub fn flush(mut self, end: u64) -> EntityTimeline {
        if !self.open.is_empty() {
            debug!(
                "{}: {} requests still open at end of trace",
                self.entity_id,
                self.open.len()
            );
        }
        if let Some(active) = self.active.take() {
            let end = end.max(active.start);
            self.close(active, end);
        }
        EntityTimeline {
            entity_id: self.entity_id,
            intervals: self.intervals,
        }
    }
}
