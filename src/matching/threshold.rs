//! Threshold-gated pairwise matching (the ZoneMapAlt algorithm).
//!
//! Links are visited by decreasing strength. Each one is evaluated against
//! the area its two regions still have unclaimed, and committed when the
//! overlap of those residuals covers more than `threshold` of the reference
//! residual. Committed pairs accumulate freely on both sides, so N:M shapes
//! surface as `Multiple`.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::core::classifier::classify;
use crate::core::error::{Result, ScoreError, Side};
use crate::core::geometry::{self, Shape};
use crate::core::model::{ErrorClass, Region, RegionId, RegionSet};
use crate::matching::links::Link;

/// What a match record stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correspondence {
    /// A committed link, with both cardinalities captured at commit time.
    Linked {
        ref_id: RegionId,
        hyp_id: RegionId,
        ref_card: usize,
        hyp_card: usize,
    },
    /// Reference area left uncovered after all commits.
    MissedResidual { ref_id: RegionId },
    /// Hypothesis area left uncovered after all commits.
    FalseAlarmResidual { hyp_id: RegionId },
}

#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub correspondence: Correspondence,
    pub class: ErrorClass,
    pub zone: Shape,
}

impl MatchRecord {
    pub fn area(&self) -> f64 {
        geometry::area(&self.zone)
    }
}

/// Committed partners of every region, in commit order.
#[derive(Debug, Default)]
pub struct Adjacency {
    ref_links: HashMap<RegionId, Vec<RegionId>>,
    hyp_links: HashMap<RegionId, Vec<RegionId>>,
}

impl Adjacency {
    pub fn hyps_of(&self, ref_id: RegionId) -> &[RegionId] {
        self.ref_links.get(&ref_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn refs_of(&self, hyp_id: RegionId) -> &[RegionId] {
        self.hyp_links.get(&hyp_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn connect(&mut self, ref_id: RegionId, hyp_id: RegionId) {
        self.ref_links.entry(ref_id).or_default().push(hyp_id);
        self.hyp_links.entry(hyp_id).or_default().push(ref_id);
    }
}

fn lookup(set: &RegionSet, side: Side, id: RegionId) -> Result<&Region> {
    set.get(id).ok_or(ScoreError::UnknownRegion { side, id })
}

fn shapes_of<'a>(set: &'a RegionSet, side: Side, ids: &[RegionId]) -> Result<Vec<&'a Shape>> {
    ids.iter()
        .map(|id| lookup(set, side, *id).map(|region| &region.shape))
        .collect()
}

pub fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ScoreError::InvalidThreshold(threshold))
    }
}

/// Evaluates links in order and commits those whose residual overlap ratio
/// is strictly above `threshold`.
pub fn make_matches(
    links: &[Link],
    refs: &RegionSet,
    hyps: &RegionSet,
    threshold: f64,
) -> Result<(Vec<MatchRecord>, Adjacency)> {
    validate_threshold(threshold)?;

    let mut adjacency = Adjacency::default();
    let mut matches = Vec::new();

    for link in links {
        let reference = lookup(refs, Side::Reference, link.ref_id)?;
        let hypothesis = lookup(hyps, Side::Hypothesis, link.hyp_id)?;

        let claimed_refs = shapes_of(refs, Side::Reference, adjacency.refs_of(link.hyp_id))?;
        let claimed_hyps = shapes_of(hyps, Side::Hypothesis, adjacency.hyps_of(link.ref_id))?;

        // The reference residual loses both the hypothesis' other references
        // and the reference's other hypotheses; the hypothesis residual only
        // loses its other references.
        let ref_residual = geometry::subtract_all(
            &geometry::subtract_all(&reference.shape, claimed_refs.iter().copied()),
            claimed_hyps.iter().copied(),
        );
        let hyp_residual = geometry::subtract_all(&hypothesis.shape, claimed_refs.iter().copied());

        let overlap = geometry::intersection(&ref_residual, &hyp_residual);
        let residual_area = geometry::area(&ref_residual);
        let ratio = if residual_area > 0.0 {
            geometry::area(&overlap) / residual_area
        } else {
            0.0
        };

        if ratio > threshold {
            let ref_card = 1 + claimed_refs.len();
            let hyp_card = 1 + claimed_hyps.len();
            let class = classify(ref_card, hyp_card)?;
            debug!(
                "commit {} -> {} (ratio {ratio:.3}, {ref_card}:{hyp_card}, {class})",
                link.ref_id, link.hyp_id
            );
            matches.push(MatchRecord {
                correspondence: Correspondence::Linked {
                    ref_id: link.ref_id,
                    hyp_id: link.hyp_id,
                    ref_card,
                    hyp_card,
                },
                class,
                zone: overlap,
            });
            adjacency.connect(link.ref_id, link.hyp_id);
        } else {
            debug!(
                "reject {} -> {} (ratio {ratio:.3} <= {threshold})",
                link.ref_id, link.hyp_id
            );
        }
    }

    Ok((matches, adjacency))
}

/// Appends one Miss record per reference and one False-alarm record per
/// hypothesis that keeps uncovered area once all its partners are removed.
pub fn add_residuals(
    matches: &mut Vec<MatchRecord>,
    adjacency: &Adjacency,
    refs: &RegionSet,
    hyps: &RegionSet,
) -> Result<()> {
    for reference in refs.iter() {
        let partners = shapes_of(hyps, Side::Hypothesis, adjacency.hyps_of(reference.id))?;
        let rest = geometry::subtract_all(&reference.shape, partners);
        if geometry::area(&rest) > 0.0 {
            matches.push(MatchRecord {
                correspondence: Correspondence::MissedResidual {
                    ref_id: reference.id,
                },
                class: ErrorClass::Miss,
                zone: rest,
            });
        }
    }

    for hypothesis in hyps.iter() {
        let partners = shapes_of(refs, Side::Reference, adjacency.refs_of(hypothesis.id))?;
        let rest = geometry::subtract_all(&hypothesis.shape, partners);
        if geometry::area(&rest) > 0.0 {
            matches.push(MatchRecord {
                correspondence: Correspondence::FalseAlarmResidual {
                    hyp_id: hypothesis.id,
                },
                class: ErrorClass::FalseAlarm,
                zone: rest,
            });
        }
    }

    Ok(())
}
