//! Greedy grouping of links into correspondence groups (the ZoneMap algorithm).

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::core::classifier::classify;
use crate::core::error::{Result, ScoreError};
use crate::core::model::{ErrorClass, RegionId, RegionSet};
use crate::matching::links::Link;
use crate::matching::resolve::{resolve_group, GroupDetail};

/// Reference and hypothesis ids bound together, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Group {
    pub refs: Vec<RegionId>,
    pub hyps: Vec<RegionId>,
}

/// A finalized group with its error class and geometric breakdown.
#[derive(Debug, Clone)]
pub struct ClassifiedGroup {
    pub refs: Vec<RegionId>,
    pub hyps: Vec<RegionId>,
    pub class: ErrorClass,
    pub detail: GroupDetail,
}

/// Group list with id lookups for both sides.
#[derive(Debug, Default)]
struct GroupTable {
    groups: Vec<Group>,
    by_ref: HashMap<RegionId, usize>,
    by_hyp: HashMap<RegionId, usize>,
}

impl GroupTable {
    fn push(&mut self, group: Group) {
        let idx = self.groups.len();
        for id in &group.refs {
            self.by_ref.insert(*id, idx);
        }
        for id in &group.hyps {
            self.by_hyp.insert(*id, idx);
        }
        self.groups.push(group);
    }

    fn apply(&mut self, link: &Link) {
        let ref_group = self.by_ref.get(&link.ref_id).copied();
        let hyp_group = self.by_hyp.get(&link.hyp_id).copied();

        match (ref_group, hyp_group) {
            (None, None) => self.push(Group {
                refs: vec![link.ref_id],
                hyps: vec![link.hyp_id],
            }),
            (None, Some(idx)) => {
                // Only a single-hypothesis group may grow on the reference side.
                if self.groups[idx].hyps.len() == 1 {
                    self.groups[idx].refs.push(link.ref_id);
                    self.by_ref.insert(link.ref_id, idx);
                } else {
                    debug!(
                        "reference {} dropped: hypothesis {} already split",
                        link.ref_id, link.hyp_id
                    );
                }
            }
            (Some(idx), None) => {
                if self.groups[idx].refs.len() == 1 {
                    self.groups[idx].hyps.push(link.hyp_id);
                    self.by_hyp.insert(link.hyp_id, idx);
                } else {
                    debug!(
                        "hypothesis {} dropped: reference {} already merged",
                        link.hyp_id, link.ref_id
                    );
                }
            }
            (Some(_), Some(_)) => {}
        }
    }
}

/// Builds groups from links sorted by decreasing strength, then adds every
/// id no link reached as a singleton group (references first).
pub fn make_groups(links: &[Link], refs: &RegionSet, hyps: &RegionSet) -> Vec<Group> {
    let mut table = GroupTable::default();
    for link in links {
        table.apply(link);
    }

    for id in refs.ids() {
        if !table.by_ref.contains_key(&id) {
            table.push(Group {
                refs: vec![id],
                hyps: Vec::new(),
            });
        }
    }
    for id in hyps.ids() {
        if !table.by_hyp.contains_key(&id) {
            table.push(Group {
                refs: Vec::new(),
                hyps: vec![id],
            });
        }
    }

    table.groups
}

/// Classifies every group and computes its geometric detail.
pub fn classify_groups(
    groups: Vec<Group>,
    refs: &RegionSet,
    hyps: &RegionSet,
) -> Result<Vec<ClassifiedGroup>> {
    groups
        .into_iter()
        .map(|group| {
            let class = classify(group.refs.len(), group.hyps.len())?;
            if class == ErrorClass::Multiple {
                return Err(ScoreError::InvariantViolation {
                    n_ref: group.refs.len(),
                    n_hyp: group.hyps.len(),
                });
            }
            let detail = resolve_group(&group, class, refs, hyps)?;
            Ok(ClassifiedGroup {
                refs: group.refs,
                hyps: group.hyps,
                class,
                detail,
            })
        })
        .collect()
}
