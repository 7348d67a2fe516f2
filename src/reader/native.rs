//! Native event stream: one JSON [`TraceEvent`] per record.

use std::io::Read;

use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer};

use super::EventSource;
use crate::error::{ConvertError, Result};
use crate::events::{IndexedEvent, TraceEvent};

pub struct NativeReader<R: Read> {
    stream: StreamDeserializer<'static, IoRead<R>, TraceEvent>,
    record: u64,
}

impl<R: Read> NativeReader<R> {
    pub fn new(reader: R) -> Self {
        NativeReader {
            stream: Deserializer::from_reader(reader).into_iter(),
            record: 0,
        }
    }
}

impl<R: Read> EventSource for NativeReader<R> {
    fn next_event(&mut self) -> Result<Option<IndexedEvent>> {
        let Some(result) = self.stream.next() else {
            return Ok(None);
        };
        self.record += 1;
        let event = result.map_err(|e| ConvertError::Parse {
            record: self.record,
            message: e.to_string(),
        })?;
        Ok(Some(IndexedEvent {
            record: self.record,
            event,
        }))
    }
}
