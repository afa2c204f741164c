//! Summary of one fix-up run.
//! Rendered as text on stdout; optionally also written as JSON for scripted checks.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::rewrite::FixRule;

/// One name taken out of a group
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Removal {
    /// `data` of the owning group, or `unknown`
    pub data: String,
    pub name: String,
}

/// A group dropped because no names were left
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrunedGroup {
    /// Position in the input `board`
    pub index: usize,
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FixReport {
    pub target: String,
    pub removals: Vec<Removal>,
    pub pruned: Vec<PrunedGroup>,
    pub entry_name: String,
    pub payload: String,
    pub already_applied: bool,
    pub output_path: Option<PathBuf>,
    pub written: bool,
}

impl FixReport {
    pub fn new(rule: &FixRule) -> Self {
        FixReport {
            target: rule.matcher.target_label(),
            removals: Vec::new(),
            pruned: Vec::new(),
            entry_name: rule.entry_name.clone(),
            payload: rule.payload.clone(),
            already_applied: false,
            output_path: None,
            written: false,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for FixReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Removed {} from {} groups:",
            self.target,
            self.removals.len()
        )?;
        for removal in &self.removals {
            writeln!(f, "  - {}", removal.data)?;
        }
        if !self.pruned.is_empty() {
            writeln!(f, "Pruned {} empty groups", self.pruned.len())?;
        }
        if self.already_applied {
            writeln!(f, "Standalone entry was already present; moved to the top")?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Added standalone {} entry pointing to: {}",
            self.target, self.payload
        )?;

        if let Some(path) = &self.output_path {
            writeln!(f)?;
            if self.written {
                write!(f, "Output: {}", path.display())?;
            } else {
                write!(f, "Output: {} (dry run, not written)", path.display())?;
            }
        }
        Ok(())
    }
}
