//! Conversion configuration.
//!
//! Defaults reproduce the classic minio-statemap output. A JSON file can
//! override any of them:
//!
//! ```json
//! {
//!   "priorities": ["s3.PutObject", "s3.GetObject"],
//!   "idle_label": "waiting",
//!   "colors": {"waiting": "white", "s3.PutObject": "red"},
//!   "orphan_policy": "warn",
//!   "entity_kind": "Server"
//! }
//! ```
//!
//! `priorities` lists op kinds most significant first. Kinds not listed rank
//! below all listed ones.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConvertError, Result};
use crate::policy::{PriorityTable, DEFAULT_IDLE_LABEL, DEFAULT_PRIORITIES};
use crate::timeline::OrphanPolicy;

/// Color given to the idle state unless configured otherwise.
pub const DEFAULT_IDLE_COLOR: &str = "white";

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Op kinds, most significant first.
    pub priorities: Vec<String>,
    /// Label shown while an entity has no open requests.
    pub idle_label: String,
    /// Explicit state colors; other states get palette colors.
    pub colors: HashMap<String, String>,
    /// Handling of END events without a matching BEGIN.
    pub orphan_policy: OrphanPolicy,
    /// Optional `entityKind` for the statemap header.
    pub entity_kind: Option<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            priorities: DEFAULT_PRIORITIES.iter().map(|s| s.to_string()).collect(),
            idle_label: DEFAULT_IDLE_LABEL.to_string(),
            colors: HashMap::new(),
            orphan_policy: OrphanPolicy::Fail,
            entity_kind: None,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    priorities: Option<Vec<String>>,
    idle_label: Option<String>,
    colors: Option<HashMap<String, String>>,
    orphan_policy: Option<OrphanPolicy>,
    entity_kind: Option<String>,
}

impl ConvertConfig {
    fn apply(&mut self, file: ConfigFile) {
        if let Some(priorities) = file.priorities {
            self.priorities = priorities;
        }
        if let Some(idle_label) = file.idle_label {
            self.idle_label = idle_label;
        }
        if let Some(colors) = file.colors {
            self.colors.extend(colors);
        }
        if let Some(policy) = file.orphan_policy {
            self.orphan_policy = policy;
        }
        if file.entity_kind.is_some() {
            self.entity_kind = file.entity_kind;
        }
    }

    /// Defaults overridden by the keys present in a JSON document.
    pub fn from_json(buf: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(buf).map_err(|e| ConvertError::Config(e.to_string()))?;
        let mut config = Self::default();
        config.apply(file);
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let buf = fs::read_to_string(path)?;
        Self::from_json(&buf)
            .map_err(|e| ConvertError::Config(format!("{}: {e}", path.display())))
    }

    /// Check that the configuration describes a usable priority table.
    pub fn validate(&self) -> Result<()> {
        self.priority_table().map(|_| ())
    }

    pub fn priority_table(&self) -> Result<PriorityTable> {
        PriorityTable::new(self.priorities.as_slice(), &self.idle_label)
    }

    /// Configured colors plus the idle default.
    pub fn state_colors(&self) -> HashMap<String, String> {
        let mut colors = self.colors.clone();
        colors
            .entry(self.idle_label.clone())
            .or_insert_with(|| DEFAULT_IDLE_COLOR.to_string());
        colors
    }
}
