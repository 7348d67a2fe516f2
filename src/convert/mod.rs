//! Trace to statemap conversion.
//!
//! [`Converter`] rebuilds per-entity timelines from an event stream;
//! [`convert_file`] wires a reader, the converter and an output sink together
//! for the command line tool.

mod driver;

pub use driver::{Conversion, ConversionSummary, Converter};

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ConvertConfig;
use crate::output::{assemble, IntervalsWriter, OutputFormat, StatemapMeta, StatemapWriter};
use crate::reader::{event_source, open_input, InputFormat};

/// Convert the trace at `input` and write the result to `out`.
///
/// The whole trace is converted before anything is written, so a trace that
/// fails to convert produces no output at all.
pub fn convert_file<W: Write>(
    input: &Path,
    format: InputFormat,
    config: &ConvertConfig,
    meta: &StatemapMeta,
    output: OutputFormat,
    out: W,
) -> Result<ConversionSummary> {
    let converter = Converter::new(config).context("Invalid conversion configuration")?;

    let reader = open_input(input)
        .with_context(|| format!("Failed to open trace file: {}", input.display()))?;
    let mut source = event_source(format, reader)
        .with_context(|| format!("Failed to read trace file: {}", input.display()))?;
    let conversion = converter
        .run(&mut source)
        .with_context(|| format!("Failed to convert trace file: {}", input.display()))?;

    let written = match output {
        OutputFormat::Statemap => assemble(&conversion, meta, &mut StatemapWriter::new(out)),
        OutputFormat::Intervals => assemble(&conversion, meta, &mut IntervalsWriter::new(out)),
    };
    written.context("Failed to write output")?;

    Ok(conversion.summary)
}
