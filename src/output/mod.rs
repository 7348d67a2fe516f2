//! Output assembly.
//!
//! [`assemble`] turns a finished [`Conversion`] into a header followed by
//! state changes and feeds them to a [`StatemapOutput`] sink. Sinks only deal
//! with formatting; ordering and legend lookups happen here, so every sink
//! sees intervals already sorted and labels already registered.

mod intervals;
mod statemap;
mod types;

pub use intervals::IntervalsWriter;
pub use statemap::StatemapWriter;
pub use types::*;

use crate::convert::Conversion;
use crate::error::{ConvertError, Result};

/// Output formats understood by the command line tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Statemap input: a metadata object then one state change per line
    #[default]
    Statemap,
    /// One JSON interval per line, with absolute start and end
    Intervals,
}

/// Sink for an assembled statemap.
pub trait StatemapOutput {
    /// Write the metadata, including the complete legend.
    fn write_header(&mut self, header: &StatemapHeader) -> Result<()>;

    /// Write one state change; calls arrive ordered by start time.
    fn write_state(&mut self, header: &StatemapHeader, change: &StateChange) -> Result<()>;

    /// Flush anything buffered.
    fn finish(&mut self) -> Result<()>;
}

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Write `conversion` to `out`.
///
/// State changes are ordered by start time, then by entity first-seen order,
/// which keeps each entity's intervals in order.
pub fn assemble(
    conversion: &Conversion,
    meta: &StatemapMeta,
    out: &mut dyn StatemapOutput,
) -> Result<()> {
    let header = StatemapHeader {
        start: [
            conversion.start / NANOS_PER_SEC,
            conversion.start % NANOS_PER_SEC,
        ],
        title: &meta.title,
        host: &meta.host,
        entity_kind: meta.entity_kind.as_deref(),
        states: &conversion.legend,
    };
    out.write_header(&header)?;

    let mut order: Vec<(u64, usize, usize)> = conversion
        .timelines
        .iter()
        .enumerate()
        .flat_map(|(entity, timeline)| {
            timeline
                .intervals
                .iter()
                .enumerate()
                .map(move |(index, interval)| (interval.start, entity, index))
        })
        .collect();
    order.sort_unstable();

    for (_, entity, index) in order {
        let timeline = &conversion.timelines[entity];
        let interval = &timeline.intervals[index];
        let value = conversion.legend.value(&interval.state).ok_or_else(|| {
            ConvertError::Config(format!(
                "state {} of {} missing from legend",
                interval.state, timeline.entity_id
            ))
        })?;
        out.write_state(
            &header,
            &StateChange {
                entity: &timeline.entity_id,
                state: &interval.state,
                value,
                tag: interval.tag.as_deref(),
                start: interval.start,
                end: interval.end,
            },
        )?;
    }

    out.finish()
}

/// Collects everything it is given; used to check assembly order.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct VecOutput {
    pub headers: usize,
    pub states: Vec<(String, String, u32, u64, u64)>,
    pub finished: bool,
}

#[cfg(test)]
impl StatemapOutput for VecOutput {
    fn write_header(&mut self, _header: &StatemapHeader) -> Result<()> {
        self.headers += 1;
        Ok(())
    }

    fn write_state(&mut self, _header: &StatemapHeader, change: &StateChange) -> Result<()> {
        self.states.push((
            change.entity.to_string(),
            change.state.to_string(),
            change.value,
            change.start,
            change.end,
        ));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use crate::convert::Converter;
    use crate::events::TraceEvent;
    use crate::reader::MemorySource;

    fn conversion(events: Vec<TraceEvent>) -> Conversion {
        let config = ConvertConfig {
            priorities: vec!["A".into(), "B".into()],
            ..ConvertConfig::default()
        };
        Converter::new(&config)
            .unwrap()
            .run(&mut MemorySource::new(events))
            .unwrap()
    }

    #[test]
    fn test_states_ordered_by_time_then_entity() {
        let conversion = conversion(vec![
            TraceEvent::begin("h2", "B", "1", 5),
            TraceEvent::begin("h1", "A", "1", 5),
            TraceEvent::end("h1", "A", "1", 7),
            TraceEvent::end("h2", "B", "1", 9),
        ]);
        let mut out = VecOutput::default();
        assemble(&conversion, &StatemapMeta::default(), &mut out).unwrap();

        assert_eq!(out.headers, 1);
        assert!(out.finished);
        let order: Vec<(&str, &str, u64)> = out
            .states
            .iter()
            .map(|(entity, state, _, start, _)| (entity.as_str(), state.as_str(), *start))
            .collect();
        assert_eq!(
            order,
            vec![("h2", "B", 5), ("h1", "A", 5), ("h1", "idle", 7)]
        );
    }

    #[test]
    fn test_values_match_legend() {
        let conversion = conversion(vec![
            TraceEvent::begin("h", "B", "1", 0),
            TraceEvent::end("h", "B", "1", 1),
            TraceEvent::begin("h", "A", "2", 2),
            TraceEvent::end("h", "A", "2", 3),
        ]);
        let mut out = VecOutput::default();
        assemble(&conversion, &StatemapMeta::default(), &mut out).unwrap();
        for (_, state, value, _, _) in &out.states {
            assert_eq!(conversion.legend.value(state), Some(*value));
        }
    }

    #[test]
    fn test_empty_conversion_writes_header_only() {
        let conversion = conversion(Vec::new());
        let mut out = VecOutput::default();
        assemble(&conversion, &StatemapMeta::default(), &mut out).unwrap();
        assert_eq!(out.headers, 1);
        assert!(out.states.is_empty());
    }
}
