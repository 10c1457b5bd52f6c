//! Geometric breakdown of classified groups into matched, missed, false
//! alarm and split/merge fragments.

use crate::core::error::{Result, ScoreError, Side};
use crate::core::geometry::{self, Shape};
use crate::core::model::{ErrorClass, Region, RegionId, RegionSet};
use crate::matching::grouping::Group;
use crate::matching::links::link_strength;

/// Category geometries of one group; the variant follows the group's class.
#[derive(Debug, Clone)]
pub enum GroupDetail {
    FalseAlarm {
        false_alarm: Shape,
    },
    Miss {
        miss: Shape,
    },
    Match {
        matched: Shape,
        miss: Shape,
        false_alarm: Shape,
    },
    Split {
        best_hyp: RegionId,
        matched: Shape,
        splits: Vec<Shape>,
        miss: Shape,
        false_alarms: Vec<Shape>,
    },
    Merge {
        best_ref: RegionId,
        matched: Shape,
        merges: Vec<Shape>,
        misses: Vec<Shape>,
        false_alarm: Shape,
    },
}

/// Unweighted category areas of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetailAreas {
    pub matched: f64,
    pub miss: f64,
    pub false_alarm: f64,
    pub split: f64,
    pub merge: f64,
}

fn total_area(shapes: &[Shape]) -> f64 {
    shapes.iter().map(geometry::area).sum()
}

impl GroupDetail {
    pub fn areas(&self) -> DetailAreas {
        match self {
            GroupDetail::FalseAlarm { false_alarm } => DetailAreas {
                false_alarm: geometry::area(false_alarm),
                ..DetailAreas::default()
            },
            GroupDetail::Miss { miss } => DetailAreas {
                miss: geometry::area(miss),
                ..DetailAreas::default()
            },
            GroupDetail::Match {
                matched,
                miss,
                false_alarm,
            } => DetailAreas {
                matched: geometry::area(matched),
                miss: geometry::area(miss),
                false_alarm: geometry::area(false_alarm),
                ..DetailAreas::default()
            },
            GroupDetail::Split {
                matched,
                splits,
                miss,
                false_alarms,
                ..
            } => DetailAreas {
                matched: geometry::area(matched),
                miss: geometry::area(miss),
                false_alarm: total_area(false_alarms),
                split: total_area(splits),
                merge: 0.0,
            },
            GroupDetail::Merge {
                matched,
                merges,
                misses,
                false_alarm,
                ..
            } => DetailAreas {
                matched: geometry::area(matched),
                miss: total_area(misses),
                false_alarm: geometry::area(false_alarm),
                split: 0.0,
                merge: total_area(merges),
            },
        }
    }
}

fn lookup(set: &RegionSet, side: Side, id: RegionId) -> Result<&Region> {
    set.get(id).ok_or(ScoreError::UnknownRegion { side, id })
}

fn lookup_all<'a>(set: &'a RegionSet, side: Side, ids: &[RegionId]) -> Result<Vec<&'a Region>> {
    ids.iter().map(|id| lookup(set, side, *id)).collect()
}

fn first(ids: &[RegionId], shape_error: &ScoreError) -> Result<RegionId> {
    ids.first().copied().ok_or_else(|| shape_error.clone())
}

/// Region among `candidates` with the strongest link to `anchor`.
/// Strict comparison keeps the first of equally strong candidates.
fn strongest<'a>(anchor: &Region, candidates: &[&'a Region]) -> Option<&'a Region> {
    let mut best: Option<(&'a Region, f64)> = None;
    for &candidate in candidates {
        let strength = link_strength(anchor, candidate);
        if strength > best.map_or(0.0, |(_, value)| value) {
            best = Some((candidate, strength));
        }
    }
    best.map(|(region, _)| region)
}

pub fn resolve_group(
    group: &Group,
    class: ErrorClass,
    refs: &RegionSet,
    hyps: &RegionSet,
) -> Result<GroupDetail> {
    let shape_error = ScoreError::InvariantViolation {
        n_ref: group.refs.len(),
        n_hyp: group.hyps.len(),
    };

    match class {
        ErrorClass::FalseAlarm => {
            let hyp = lookup(hyps, Side::Hypothesis, first(&group.hyps, &shape_error)?)?;
            Ok(GroupDetail::FalseAlarm {
                false_alarm: hyp.shape.clone(),
            })
        }
        ErrorClass::Miss => {
            let reference = lookup(refs, Side::Reference, first(&group.refs, &shape_error)?)?;
            Ok(GroupDetail::Miss {
                miss: reference.shape.clone(),
            })
        }
        ErrorClass::Match => {
            let reference = lookup(refs, Side::Reference, first(&group.refs, &shape_error)?)?;
            let hyp = lookup(hyps, Side::Hypothesis, first(&group.hyps, &shape_error)?)?;
            let matched = geometry::intersection(&reference.shape, &hyp.shape);
            Ok(GroupDetail::Match {
                miss: geometry::difference(&reference.shape, &matched),
                false_alarm: geometry::difference(&hyp.shape, &matched),
                matched,
            })
        }
        ErrorClass::Split => {
            let reference = lookup(refs, Side::Reference, first(&group.refs, &shape_error)?)?;
            let parts = lookup_all(hyps, Side::Hypothesis, &group.hyps)?;
            let best = strongest(reference, &parts).ok_or(shape_error)?;

            let overlaps: Vec<Shape> = parts
                .iter()
                .map(|hyp| geometry::intersection(&reference.shape, &hyp.shape))
                .collect();
            let matched = geometry::intersection(&reference.shape, &best.shape);
            let splits = parts
                .iter()
                .zip(&overlaps)
                .filter(|(hyp, _)| hyp.id != best.id)
                .map(|(_, overlap)| overlap.clone())
                .collect();
            let false_alarms = parts
                .iter()
                .map(|hyp| geometry::difference(&hyp.shape, &reference.shape))
                .collect();
            let miss = geometry::subtract_all(&reference.shape, &overlaps);

            Ok(GroupDetail::Split {
                best_hyp: best.id,
                matched,
                splits,
                miss,
                false_alarms,
            })
        }
        ErrorClass::Merge => {
            let hyp = lookup(hyps, Side::Hypothesis, first(&group.hyps, &shape_error)?)?;
            let parts = lookup_all(refs, Side::Reference, &group.refs)?;
            let best = strongest(hyp, &parts).ok_or(shape_error)?;

            let overlaps: Vec<Shape> = parts
                .iter()
                .map(|reference| geometry::intersection(&hyp.shape, &reference.shape))
                .collect();
            let matched = geometry::intersection(&hyp.shape, &best.shape);
            let merges = parts
                .iter()
                .zip(&overlaps)
                .filter(|(reference, _)| reference.id != best.id)
                .map(|(_, overlap)| overlap.clone())
                .collect();
            let misses = parts
                .iter()
                .map(|reference| geometry::difference(&reference.shape, &hyp.shape))
                .collect();
            let false_alarm = geometry::subtract_all(&hyp.shape, &overlaps);

            Ok(GroupDetail::Merge {
                best_ref: best.id,
                matched,
                merges,
                misses,
                false_alarm,
            })
        }
        ErrorClass::Multiple => Err(shape_error),
    }
}
