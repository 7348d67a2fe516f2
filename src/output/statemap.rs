//! Statemap input format writer.
//!
//! ```text
//! {
//!   "start": [1591977600, 123000000],
//!   "title": "MinIO",
//!   "host": "minio cluster",
//!   "states": {
//!     "s3.GetObject": {"value": 0, "color": "#DAF7A6"},
//!     "idle": {"value": 1, "color": "white"}
//!   }
//! }
//! {"time":"0","entity":"minio1:9000","state":0}
//! {"time":"2500","entity":"minio1:9000","state":1}
//! ```
//!
//! `time` is nanoseconds since `start`, as a string.

use std::io::{self, BufWriter, Write};

use serde::Serialize;

use super::{StateChange, StatemapHeader, StatemapOutput};
use crate::error::Result;

#[derive(Serialize)]
struct StateRecord<'a> {
    time: String,
    entity: &'a str,
    state: u32,
}

pub struct StatemapWriter<W: Write> {
    out: BufWriter<W>,
}

impl<W: Write> StatemapWriter<W> {
    pub fn new(out: W) -> Self {
        StatemapWriter {
            out: BufWriter::new(out),
        }
    }
}

fn start_ns(header: &StatemapHeader) -> u64 {
    header.start[0] * 1_000_000_000 + header.start[1]
}

impl<W: Write> StatemapOutput for StatemapWriter<W> {
    fn write_header(&mut self, header: &StatemapHeader) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, header).map_err(io::Error::from)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn write_state(&mut self, header: &StatemapHeader, change: &StateChange) -> Result<()> {
        let record = StateRecord {
            time: (change.start - start_ns(header)).to_string(),
            entity: change.entity,
            state: change.value,
        };
        serde_json::to_writer(&mut self.out, &record).map_err(io::Error::from)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
