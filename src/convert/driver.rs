//! Conversion driver.
//!
//! Reads events strictly in input order, routes each one to its entity's
//! [`EntityTimelineBuilder`] and, once the stream is exhausted, flushes every
//! builder at the last timestamp seen. Entities are kept in first-seen order
//! so repeated runs over the same input produce identical output.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::ConvertConfig;
use crate::error::Result;
use crate::events::IndexedEvent;
use crate::legend::{FrozenLegend, Legend};
use crate::policy::PriorityTable;
use crate::reader::EventSource;
use crate::timeline::{EntityTimeline, EntityTimelineBuilder, OrphanPolicy, Outcome};

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub records: u64,
    pub entities: usize,
    pub intervals: usize,
    pub dropped_orphans: u64,
}

/// Everything the output stage needs: the legend plus one timeline per
/// entity, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub legend: FrozenLegend,
    pub timelines: Vec<EntityTimeline>,
    /// Timestamp of the earliest accepted event, 0 for an empty trace.
    pub start: u64,
    /// Timestamp every timeline is flushed at.
    pub end: u64,
    pub summary: ConversionSummary,
}

#[derive(Debug, Clone)]
pub struct Converter {
    table: PriorityTable,
    orphans: OrphanPolicy,
    colors: HashMap<String, String>,
}

impl Converter {
    pub fn new(config: &ConvertConfig) -> Result<Self> {
        Ok(Converter {
            table: config.priority_table()?,
            orphans: config.orphan_policy,
            colors: config.state_colors(),
        })
    }

    /// Consume `source` and reconstruct every entity's timeline.
    ///
    /// The first malformed or inconsistent event aborts the run; nothing is
    /// returned for a partially converted trace.
    pub fn run<S: EventSource + ?Sized>(&self, source: &mut S) -> Result<Conversion> {
        let mut builders: IndexMap<String, EntityTimelineBuilder> = IndexMap::new();
        let mut legend = Legend::new();
        let mut summary = ConversionSummary::default();
        let mut bounds: Option<(u64, u64)> = None;

        while let Some(IndexedEvent { record, event }) = source.next_event()? {
            summary.records += 1;

            let index = match builders.get_index_of(event.entity_id.as_str()) {
                Some(index) => index,
                None => {
                    debug!("new entity {} at record {}", event.entity_id, record);
                    let builder = EntityTimelineBuilder::new(&event.entity_id);
                    builders.insert_full(event.entity_id.clone(), builder).0
                }
            };
            let builder = &mut builders[index];

            match builder.on_event(record, &event, &self.table, self.orphans)? {
                Outcome::DroppedOrphan => {
                    summary.dropped_orphans += 1;
                    continue;
                }
                Outcome::Changed => {
                    if let Some(state) = builder.current_state() {
                        legend.register(state);
                    }
                }
                Outcome::Absorbed => {}
            }

            let ts = event.timestamp;
            bounds = Some(match bounds {
                Some((start, end)) => (start.min(ts), end.max(ts)),
                None => (ts, ts),
            });
        }

        let (start, end) = bounds.unwrap_or((0, 0));
        let timelines: Vec<EntityTimeline> = builders
            .into_values()
            .map(|builder| builder.flush(end))
            .filter(|timeline| !timeline.intervals.is_empty())
            .collect();

        // States whose every interval was zero-length never reach the output.
        let used: HashSet<&str> = timelines
            .iter()
            .flat_map(|timeline| timeline.intervals.iter())
            .map(|interval| interval.state.as_str())
            .collect();
        legend.retain(|label| used.contains(label));

        summary.entities = timelines.len();
        summary.intervals = timelines.iter().map(|t| t.intervals.len()).sum();
        info!(
            "converted {} records: {} entities, {} intervals, {} states",
            summary.records,
            summary.entities,
            summary.intervals,
            legend.len()
        );
        if summary.dropped_orphans > 0 {
            info!(
                "dropped {} END events without a matching BEGIN",
                summary.dropped_orphans
            );
        }

        Ok(Conversion {
            legend: legend.freeze(&self.colors),
            timelines,
            start,
            end,
            summary,
        })
    }
}
