//! State reduction policy.
//!
//! A statemap entity occupies exactly one state at a time, but a MinIO server
//! serves many requests at once. The [`PriorityTable`] collapses the set of
//! concurrently open op kinds into the single most significant one.

use std::collections::HashMap;

use crate::error::{ConvertError, Result};
use crate::events::OpKind;

/// Label used when an entity has no open requests.
pub const DEFAULT_IDLE_LABEL: &str = "idle";

/// Default priorities for the MinIO S3 API, most significant first.
///
/// Writes outrank reads, which outrank anything unlisted (admin calls, health
/// checks and other housekeeping).
pub const DEFAULT_PRIORITIES: &[&str] = &[
    // write class
    "s3.DeleteMultipleObjects",
    "s3.DeleteObject",
    "s3.CompleteMultipartUpload",
    "s3.AbortMultipartUpload",
    "s3.PutObjectPart",
    "s3.CopyObjectPart",
    "s3.NewMultipartUpload",
    "s3.PutObject",
    "s3.CopyObject",
    "s3.DeleteBucket",
    "s3.PutBucket",
    // read class
    "s3.GetObject",
    "s3.SelectObjectContent",
    "s3.HeadObject",
    "s3.ListObjectParts",
    "s3.ListMultipartUploads",
    "s3.ListObjectsV2",
    "s3.ListObjectsV1",
    "s3.ListObjectVersions",
    "s3.GetBucketLocation",
    "s3.HeadBucket",
    "s3.ListBuckets",
];

/// Rank of an op kind; lower sorts first and wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Listed(usize),
    Unlisted,
}

/// Immutable priority table mapping op kinds to ranks.
#[derive(Debug, Clone)]
pub struct PriorityTable {
    ranks: HashMap<OpKind, usize>,
    idle_label: String,
}

impl PriorityTable {
    /// Build a table from op kinds listed most significant first.
    pub fn new<S: AsRef<str>>(priorities: &[S], idle_label: &str) -> Result<Self> {
        if idle_label.is_empty() {
            return Err(ConvertError::Config("idle label must not be empty".into()));
        }

        let mut ranks = HashMap::with_capacity(priorities.len());
        for (rank, op) in priorities.iter().enumerate() {
            let op = op.as_ref();
            if op == idle_label {
                return Err(ConvertError::Config(format!(
                    "op kind {op} collides with the idle label"
                )));
            }
            if ranks.insert(OpKind::from(op), rank).is_some() {
                return Err(ConvertError::Config(format!(
                    "op kind {op} listed more than once in priorities"
                )));
            }
        }

        Ok(PriorityTable {
            ranks,
            idle_label: idle_label.to_string(),
        })
    }

    pub fn idle_label(&self) -> &str {
        &self.idle_label
    }

    fn rank(&self, op: &OpKind) -> Rank {
        self.ranks
            .get(op)
            .map_or(Rank::Unlisted, |&rank| Rank::Listed(rank))
    }

    /// The most significant op kind in `open`, or `None` if it is empty.
    ///
    /// Unlisted kinds tie on rank and are broken by name, so the result only
    /// depends on which kinds are present, never on order or multiplicity.
    pub fn top<'a, I>(&self, open: I) -> Option<&'a OpKind>
    where
        I: IntoIterator<Item = &'a OpKind>,
    {
        open.into_iter()
            .min_by(|a, b| self.rank(a).cmp(&self.rank(b)).then_with(|| a.cmp(b)))
    }

    /// Reduce a set of open op kinds to the label an entity displays.
    pub fn reduce<'a, I>(&'a self, open: I) -> &'a str
    where
        I: IntoIterator<Item = &'a OpKind>,
    {
        self.top(open)
            .map_or(self.idle_label.as_str(), OpKind::as_str)
    }
}

impl Default for PriorityTable {
    fn default() -> Self {
        let ranks = DEFAULT_PRIORITIES
            .iter()
            .enumerate()
            .map(|(rank, op)| (OpKind::from(*op), rank))
            .collect();
        PriorityTable {
            ranks,
            idle_label: DEFAULT_IDLE_LABEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(names: &[&str]) -> Vec<OpKind> {
        names.iter().map(|n| OpKind::from(*n)).collect()
    }

    #[test]
    fn test_empty_set_is_idle() {
        let table = PriorityTable::default();
        assert_eq!(table.reduce(std::iter::empty()), "idle");
    }

    #[test]
    fn test_write_outranks_read() {
        let table = PriorityTable::default();
        let open = kinds(&["s3.GetObject", "s3.PutObject", "s3.HeadObject"]);
        assert_eq!(table.reduce(&open), "s3.PutObject");
    }

    #[test]
    fn test_read_outranks_unlisted() {
        let table = PriorityTable::default();
        let open = kinds(&["admin.ServerInfo", "s3.ListObjectsV2"]);
        assert_eq!(table.reduce(&open), "s3.ListObjectsV2");
    }

    #[test]
    fn test_unlisted_ties_break_by_name() {
        let table = PriorityTable::default();
        let a = kinds(&["health.Ready", "admin.ServerInfo"]);
        let b = kinds(&["admin.ServerInfo", "health.Ready"]);
        assert_eq!(table.reduce(&a), "admin.ServerInfo");
        assert_eq!(table.reduce(&b), "admin.ServerInfo");
    }

    #[test]
    fn test_reduction_ignores_order_and_duplicates() {
        let table = PriorityTable::new(&["write", "read", "list"], "idle").unwrap();
        let a = kinds(&["read", "list", "read", "read"]);
        let b = kinds(&["list", "read"]);
        assert_eq!(table.reduce(&a), table.reduce(&b));
        assert_eq!(table.reduce(&a), "read");
    }

    #[test]
    fn test_custom_idle_label() {
        let table = PriorityTable::new(&["write"], "waiting").unwrap();
        assert_eq!(table.reduce(std::iter::empty()), "waiting");
        assert_eq!(table.idle_label(), "waiting");
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let err = PriorityTable::new(&["write", "read", "write"], "idle").unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_idle_collision_rejected() {
        assert!(PriorityTable::new(&["write", "idle"], "idle").is_err());
        assert!(PriorityTable::new(&["write"], "").is_err());
    }
}
