//! Trace input readers.
//!
//! Readers turn raw trace records into [`IndexedEvent`]s in capture order.
//! Any record that cannot be decoded aborts the run with a parse error; a
//! skipped record would silently corrupt the timelines built from it.

mod minio;
mod native;

pub use minio::MinioReader;
pub use native::NativeReader;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::events::{IndexedEvent, TraceEvent};

/// A stream of trace events in the order they must be processed.
pub trait EventSource {
    /// The next event, or `None` once the input is exhausted.
    fn next_event(&mut self) -> Result<Option<IndexedEvent>>;
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// `mc admin trace --json` output, one completed call per record
    #[default]
    Minio,
    /// One BEGIN or END event per JSON record
    Native,
}

/// Open `path` for reading, with `-` meaning standard input.
pub fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if path == Path::new("-") {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Build the reader for `format` on top of `input`.
pub fn event_source<'a>(
    format: InputFormat,
    input: Box<dyn Read + 'a>,
) -> Result<Box<dyn EventSource + 'a>> {
    let source: Box<dyn EventSource + 'a> = match format {
        InputFormat::Native => Box::new(NativeReader::new(input)),
        InputFormat::Minio => {
            let reader = MinioReader::new(input)?;
            debug!("loaded {} minio calls", reader.calls());
            Box::new(reader)
        }
    };
    Ok(source)
}

/// Events already in memory, numbered from 1 in vector order.
#[derive(Debug)]
pub struct MemorySource {
    events: std::vec::IntoIter<IndexedEvent>,
}

impl MemorySource {
    pub fn new(events: Vec<TraceEvent>) -> Self {
        let indexed = events
            .into_iter()
            .zip(1u64..)
            .map(|(event, record)| IndexedEvent { record, event })
            .collect();
        Self::from_indexed(indexed)
    }

    pub fn from_indexed(events: Vec<IndexedEvent>) -> Self {
        MemorySource {
            events: events.into_iter(),
        }
    }
}

impl EventSource for MemorySource {
    fn next_event(&mut self) -> Result<Option<IndexedEvent>> {
        Ok(self.events.next())
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_event(&mut self) -> Result<Option<IndexedEvent>> {
        (**self).next_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_numbers_records() {
        let mut source = MemorySource::new(vec![
            TraceEvent::begin("h1", "read", "a", 1),
            TraceEvent::end("h1", "read", "a", 2),
        ]);
        assert_eq!(source.next_event().unwrap().unwrap().record, 1);
        let second = source.next_event().unwrap().unwrap();
        assert_eq!(second.record, 2);
        assert_eq!(second.event.timestamp, 2);
        assert!(source.next_event().unwrap().is_none());
    }

    #[test]
    fn test_event_source_selects_format() {
        let input = r#"{"entity": "h1", "op": "x", "phase": "begin", "time": 5, "request": "a"}"#;
        let mut source =
            event_source(InputFormat::Native, Box::new(input.as_bytes())).unwrap();
        let event = source.next_event().unwrap().unwrap();
        assert_eq!(event.event.entity_id, "h1");
    }
}
