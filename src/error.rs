//! Error taxonomy for trace conversion.
//!
//! Every error here is fatal to a run: a statemap built from a partially
//! understood trace shows gaps or wrong states, so the converter aborts on the
//! first problem instead of emitting a truncated timeline.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::events::{OpKind, RequestId};

/// What was wrong with an otherwise parseable event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// An END arrived for a request that has no open BEGIN on this entity.
    OrphanEnd { request: RequestId },
    /// A BEGIN arrived for a request that is already open on this entity.
    DuplicateBegin { request: RequestId },
    /// The event is older than the previous event seen for this entity.
    TimeWentBackwards { previous: u64 },
    /// A BEGIN names an op kind that collides with the idle label.
    ReservedLabel { op: OpKind },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolViolation::OrphanEnd { request } => {
                write!(f, "END for request {request} without a matching BEGIN")
            }
            ProtocolViolation::DuplicateBegin { request } => {
                write!(f, "BEGIN for request {request} which is already open")
            }
            ProtocolViolation::TimeWentBackwards { previous } => {
                write!(f, "timestamp precedes previous event at {previous}")
            }
            ProtocolViolation::ReservedLabel { op } => {
                write!(f, "BEGIN for op {op} which is reserved for the idle state")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    /// A raw record could not be decoded into a trace event.
    #[error("record {record}: failed to parse trace record: {message}")]
    Parse { record: u64, message: String },

    /// A decoded event is inconsistent with the entity's open requests.
    #[error("record {record}: entity {entity} at {timestamp}: {violation}")]
    Protocol {
        entity: String,
        record: u64,
        timestamp: u64,
        violation: ProtocolViolation,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_names_entity_and_record() {
        let err = ConvertError::Protocol {
            entity: "minio-1:9000".to_string(),
            record: 17,
            timestamp: 4200,
            violation: ProtocolViolation::OrphanEnd {
                request: RequestId::from("r9"),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("record 17"));
        assert!(msg.contains("minio-1:9000"));
        assert!(msg.contains("4200"));
        assert!(msg.contains("r9"));
    }

    #[test]
    fn test_reserved_label_message() {
        let violation = ProtocolViolation::ReservedLabel {
            op: OpKind::from("idle"),
        };
        assert_eq!(
            violation.to_string(),
            "BEGIN for op idle which is reserved for the idle state"
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = ConvertError::Parse {
            record: 3,
            message: "missing field `host`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "record 3: failed to parse trace record: missing field `host`"
        );
    }
}
