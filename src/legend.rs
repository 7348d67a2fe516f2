//! Legend of state labels.
//!
//! Labels get stable numeric values in the order they are first observed
//! during a run. The legend only grows while the trace is being converted.
//! Once the whole stream has been consumed, labels no emitted interval carries
//! are pruned and the legend is frozen with colors resolved.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

/// Colors handed out, in order, to states without a configured color.
const PALETTE: &[&str] = &[
    "#DAF7A6", "#FFC300", "#FF5733", "#C70039", "#900C3F", "#581845", "#2E86C1", "#17A589",
    "#D4AC0D", "#A569BD", "#5D6D7E", "#E67E22", "#1ABC9C", "#F1948A", "#7FB3D5", "#82E0AA",
];

/// Growing legend, owned by the converter for the duration of a run.
#[derive(Debug, Default)]
pub struct Legend {
    values: IndexMap<String, u32>,
}

impl Legend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `label`, assigning the next one if it is new.
    pub fn register(&mut self, label: &str) -> u32 {
        if let Some(&value) = self.values.get(label) {
            return value;
        }
        let value = self.values.len() as u32;
        self.values.insert(label.to_string(), value);
        value
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every label `keep` rejects, renumbering the survivors so values
    /// stay dense and in first-seen order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.values.retain(|label, _| keep(label));
        for (value, slot) in self.values.values_mut().enumerate() {
            *slot = value as u32;
        }
    }

    /// Finish the legend, resolving a color for every state.
    ///
    /// Configured colors win; every other state takes the next palette entry
    /// in value order, so the same input always produces the same colors.
    pub fn freeze(self, colors: &HashMap<String, String>) -> FrozenLegend {
        let mut next_color = PALETTE.iter().cycle();
        let states = self
            .values
            .into_iter()
            .map(|(label, value)| {
                let color = match colors.get(&label) {
                    Some(color) => color.clone(),
                    None => next_color.next().map_or_else(String::new, |c| c.to_string()),
                };
                (label, LegendEntry { value, color })
            })
            .collect();
        FrozenLegend { states }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub value: u32,
    pub color: String,
}

/// Immutable legend handed to the output stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrozenLegend {
    states: IndexMap<String, LegendEntry>,
}

impl FrozenLegend {
    pub fn get(&self, label: &str) -> Option<&LegendEntry> {
        self.states.get(label)
    }

    pub fn value(&self, label: &str) -> Option<u32> {
        self.get(label).map(|entry| entry.value)
    }

    /// States in value order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LegendEntry)> {
        self.states
            .iter()
            .map(|(label, entry)| (label.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
