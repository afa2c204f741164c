//! Record rewriter.
//! Strips a target identifier from every group name that lacks the qualifier,
//! drops groups left without names, and puts one standalone group for the
//! target at the top of `board` so first-match lookups resolve it there.
//! Pure data transformation: no I/O happens here.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::board::{BoardDocument, Group};
use crate::error::FixError;
use crate::identifier::{Attribute, Identifier};
use crate::report::{FixReport, PrunedGroup, Removal};

#[derive(Clone, Debug, PartialEq)]
pub enum Matcher {
    Substring { target: String, qualifier: String },
    Attribute { target: Attribute, qualifier: Attribute },
}

impl Matcher {
    pub fn is_target(&self, name: &str) -> bool {
        match self {
            Matcher::Substring { target, .. } => name.contains(target.as_str()),
            Matcher::Attribute { target, .. } => Identifier::parse(name).contains(target),
        }
    }

    pub fn is_qualified(&self, name: &str) -> bool {
        match self {
            Matcher::Substring { qualifier, .. } => name.contains(qualifier.as_str()),
            Matcher::Attribute { qualifier, .. } => Identifier::parse(name).contains(qualifier),
        }
    }

    /// A name is removed when it carries the target but not the qualifier.
    pub fn drops(&self, name: &str) -> bool {
        self.is_target(name) && !self.is_qualified(name)
    }

    pub fn target_label(&self) -> String {
        match self {
            Matcher::Substring { target, .. } => target.clone(),
            Matcher::Attribute { target, .. } => target.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FixRule {
    pub matcher: Matcher,
    pub entry_name: String,
    pub payload: String,
}

impl FixRule {
    pub fn standalone_group(&self) -> Group {
        Group::new(vec![self.entry_name.clone()], self.payload.clone())
    }

    /// True for a group this rule inserted on an earlier run.
    fn is_standalone(&self, group: &Group) -> bool {
        group.names.len() == 1
            && group.names[0] == self.entry_name
            && group.data.as_deref() == Some(self.payload.as_str())
            && group.extra.is_empty()
    }
}

/// Applies `rule` to `doc` and returns the fixed document with a report.
pub fn rewrite(mut doc: BoardDocument, rule: &FixRule) -> (BoardDocument, FixReport) {
    let mut report = FixReport::new(rule);
    let groups = std::mem::take(&mut doc.board);
    let total = groups.len();

    let mut board = Vec::with_capacity(total + 1);
    for (index, mut group) in groups.into_iter().enumerate() {
        if rule.is_standalone(&group) {
            // Re-inserted at the top below; not a removal
            report.already_applied = true;
            continue;
        }

        let data = group.data_label().to_string();
        let (kept, dropped): (Vec<String>, Vec<String>) = std::mem::take(&mut group.names)
            .into_iter()
            .partition(|name| !rule.matcher.drops(name));

        for name in dropped {
            debug!(group = index, data = %data, name = %name, "removing ambiguous name");
            report.removals.push(Removal {
                data: data.clone(),
                name,
            });
        }

        if kept.is_empty() {
            debug!(group = index, data = %data, "pruning empty group");
            report.pruned.push(PrunedGroup { index, data });
            continue;
        }
        group.names = kept;
        board.push(group);
    }

    if report.already_applied {
        warn!("standalone entry already present; moving it to the top without counting it");
    }

    board.insert(0, rule.standalone_group());
    info!(
        groups_in = total,
        groups_out = board.len(),
        removed = report.removals.len(),
        pruned = report.pruned.len(),
        "rewrite complete"
    );

    doc.board = board;
    (doc, report)
}

/// Validates raw JSON as a board file and rewrites a copy of it.
pub fn rewrite_value(value: &Value, rule: &FixRule) -> Result<(Value, FixReport), FixError> {
    let doc = BoardDocument::from_value(value.clone())?;
    let (fixed, report) = rewrite(doc, rule);
    Ok((fixed.into_value(), report))
}
