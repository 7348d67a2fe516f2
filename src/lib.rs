//! minio-statemap library - rebuild per-server activity timelines from MinIO
//! RPC traces and emit them as statemap input.
//!
//! # Modules
//!
//! - [`events`] - trace event model
//! - [`reader`] - MinIO and native event stream readers
//! - [`policy`] - reduction of concurrent requests to one state
//! - [`timeline`] - per-entity interval reconstruction
//! - [`legend`] - state label registry
//! - [`convert`] - the conversion driver
//! - [`output`] - statemap and interval writers
//!
//! # Example
//!
//! ```no_run
//! use minio_statemap::{ConvertConfig, Converter};
//! use minio_statemap::reader::MinioReader;
//! use std::fs::File;
//!
//! let trace = File::open("./minio_trace.out").expect("Failed to open trace");
//! let mut reader = MinioReader::new(trace).expect("Failed to read trace");
//! let conversion = Converter::new(&ConvertConfig::default())
//!     .and_then(|converter| converter.run(&mut reader))
//!     .expect("Failed to convert trace");
//! for timeline in &conversion.timelines {
//!     println!("{}: {} intervals", timeline.entity_id, timeline.intervals.len());
//! }
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod events;
pub mod legend;
pub mod output;
pub mod policy;
pub mod reader;
pub mod timeline;

// Re-export for convenience
pub use config::ConvertConfig;
pub use convert::{convert_file, Conversion, ConversionSummary, Converter};
pub use error::{ConvertError, ProtocolViolation};
pub use events::{OpKind, Phase, RequestId, TraceEvent};
pub use timeline::{EntityTimeline, Interval, OrphanPolicy};
