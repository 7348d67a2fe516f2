//! Interval listing: a metadata line, then one interval per line with
//! absolute timestamps. Handy for checking timelines with `jq`.

use std::io::{self, BufWriter, Write};

use serde::Serialize;

use super::{StateChange, StatemapHeader, StatemapOutput};
use crate::error::Result;

#[derive(Serialize)]
struct IntervalRecord<'a> {
    entity: &'a str,
    state: &'a str,
    value: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
    start: u64,
    end: u64,
    duration: u64,
}

pub struct IntervalsWriter<W: Write> {
    out: BufWriter<W>,
}

impl<W: Write> IntervalsWriter<W> {
    pub fn new(out: W) -> Self {
        IntervalsWriter {
            out: BufWriter::new(out),
        }
    }
}

impl<W: Write> StatemapOutput for IntervalsWriter<W> {
    fn write_header(&mut self, header: &StatemapHeader) -> Result<()> {
        serde_json::to_writer(&mut self.out, header).map_err(io::Error::from)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn write_state(&mut self, _header: &StatemapHeader, change: &StateChange) -> Result<()> {
        let record = IntervalRecord {
            entity: change.entity,
            state: change.state,
            value: change.value,
            tag: change.tag,
            start: change.start,
            end: change.end,
            duration: change.end - change.start,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legend::Legend;
    use std::collections::HashMap;

    #[test]
    fn test_interval_lines() {
        let legend = Legend::new().freeze(&HashMap::new());
        let header = StatemapHeader {
            start: [0, 100],
            title: "t",
            host: "h",
            entity_kind: None,
            states: &legend,
        };
        let mut buf = Vec::new();
        let mut writer = IntervalsWriter::new(&mut buf);
        writer.write_header(&header).unwrap();
        writer
            .write_state(
                &header,
                &StateChange {
                    entity: "e",
                    state: "s3.PutObject",
                    value: 0,
                    tag: Some("/bucket/key"),
                    start: 100,
                    end: 350,
                },
            )
            .unwrap();
        writer
            .write_state(
                &header,
                &StateChange {
                    entity: "e",
                    state: "idle",
                    value: 1,
                    tag: None,
                    start: 350,
                    end: 400,
                },
            )
            .unwrap();
        writer.finish().unwrap();
        drop(writer);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["start"], serde_json::json!([0, 100]));
        assert_eq!(lines[1]["state"], "s3.PutObject");
        assert_eq!(lines[1]["tag"], "/bucket/key");
        assert_eq!(lines[1]["start"], 100);
        assert_eq!(lines[1]["duration"], 250);
        assert!(lines[2].get("tag").is_none());
    }
}
