//! Long-tail collapse of categorical levels into a catch-all level

use crate::error::{DataError, Result};
use crate::policy::{CategoricalField, PolicyRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Catch-all label for collapsed levels
pub const OTHER: &str = "other";

/// Maps the levels of one field to themselves, or to [`OTHER`] when they
/// belong to the collapse set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseRule {
    field: CategoricalField,
    collapse: BTreeSet<&'static str>,
}

impl CollapseRule {
    /// Every member of `collapse_set` must be a level of `field`
    pub fn new<S: AsRef<str>>(field: CategoricalField, collapse_set: &[S]) -> Result<Self> {
        let levels = field.levels();
        let mut collapse = BTreeSet::new();

        for member in collapse_set {
            let member = member.as_ref();
            let level = levels
                .iter()
                .copied()
                .find(|level| *level == member)
                .ok_or_else(|| DataError::UnknownLevel {
                    field: field.name(),
                    value: member.to_string(),
                })?;
            collapse.insert(level);
        }

        Ok(Self { field, collapse })
    }

    pub fn field(&self) -> CategoricalField {
        self.field
    }

    pub fn collapses(&self, level: &str) -> bool {
        self.collapse.contains(level)
    }

    pub fn apply(&self, level: &'static str) -> &'static str {
        if self.collapses(level) {
            OTHER
        } else {
            level
        }
    }

    /// Aggregated label of the rule's field for a policy
    pub fn label_for(&self, policy: &PolicyRecord) -> &'static str {
        self.apply(self.field.level(policy))
    }

    /// Levels that remain after collapsing, in vocabulary order
    pub fn output_levels(&self) -> Vec<&'static str> {
        let mut levels: Vec<&'static str> = self
            .field
            .levels()
            .into_iter()
            .filter(|level| !self.collapses(level))
            .collect();
        if !self.collapse.is_empty() {
            levels.push(OTHER);
        }
        levels
    }
}

/// Configurable form of a collapse rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseSpec {
    pub collapse: Vec<String>,
}

impl CollapseSpec {
    pub fn new(collapse: &[&str]) -> Self {
        Self {
            collapse: collapse.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn build(&self, field: CategoricalField) -> Result<CollapseRule> {
        CollapseRule::new(field, self.collapse.as_slice())
    }
}
