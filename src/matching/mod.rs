pub mod grouping;
pub mod links;
pub mod resolve;
pub mod score;
pub mod threshold;

use log::info;
use serde::Serialize;

use crate::core::error::Result;
use crate::core::model::{CountRecord, ErrorClass, RegionId, RegionSet, ScoreRecord};
use crate::core::weights::ScoreWeights;

pub use grouping::{ClassifiedGroup, Group};
pub use links::Link;
pub use resolve::GroupDetail;
pub use threshold::{Correspondence, MatchRecord};

/// Default threshold of the threshold matcher.
pub const DEFAULT_THRESHOLD: f64 = 0.15;

/// Serializable view of one correspondence unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    pub refs: Vec<RegionId>,
    pub hyps: Vec<RegionId>,
    pub class: ErrorClass,
    /// Unweighted area booked under the unit's own class.
    pub area: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub scores: ScoreRecord,
    pub counts: CountRecord,
    pub units: Vec<UnitSummary>,
}

pub trait Matcher {
    fn name(&self) -> &'static str;
    fn evaluate(&self, refs: &RegionSet, hyps: &RegionSet) -> Result<Evaluation>;
}

#[derive(Debug)]
pub struct ZoneMapOutcome {
    pub groups: Vec<ClassifiedGroup>,
    pub scores: ScoreRecord,
    pub counts: CountRecord,
}

#[derive(Debug)]
pub struct ZoneMapAltOutcome {
    pub matches: Vec<MatchRecord>,
    pub scores: ScoreRecord,
    pub counts: CountRecord,
}

/// Grouping pipeline: links, greedy groups, classification, area breakdown, score.
///
/// `hook` sees the classified groups before they are scored.
pub fn match_zonemap(
    refs: &RegionSet,
    hyps: &RegionSet,
    weights: &ScoreWeights,
    hook: Option<&mut dyn FnMut(&[ClassifiedGroup])>,
) -> Result<ZoneMapOutcome> {
    let links = links::sorted_links(refs, hyps);
    let groups = grouping::make_groups(&links, refs, hyps);
    let groups = grouping::classify_groups(groups, refs, hyps)?;

    if let Some(hook) = hook {
        hook(&groups);
    }

    let (scores, counts) = score::score_groups(&groups, refs, weights)?;
    info!(
        "zonemap: {} links, {} groups, score {:.2}",
        links.len(),
        groups.len(),
        scores.score
    );
    Ok(ZoneMapOutcome {
        groups,
        scores,
        counts,
    })
}

/// Threshold pipeline: links, gated pairwise matches, residual records, score.
///
/// `hook` sees every match record, residuals included, before scoring.
pub fn match_zonemapalt(
    refs: &RegionSet,
    hyps: &RegionSet,
    threshold: f64,
    weights: &ScoreWeights,
    hook: Option<&mut dyn FnMut(&[MatchRecord])>,
) -> Result<ZoneMapAltOutcome> {
    let links = links::sorted_links(refs, hyps);
    let (mut matches, adjacency) = threshold::make_matches(&links, refs, hyps, threshold)?;
    threshold::add_residuals(&mut matches, &adjacency, refs, hyps)?;

    if let Some(hook) = hook {
        hook(&matches);
    }

    let (scores, counts) = score::score_matches(&matches, refs, weights)?;
    info!(
        "zonemapalt(threshold {threshold}): {} links, {} records, score {:.2}",
        links.len(),
        matches.len(),
        scores.score
    );
    Ok(ZoneMapAltOutcome {
        matches,
        scores,
        counts,
    })
}

fn group_summary(group: &ClassifiedGroup) -> UnitSummary {
    let areas = group.detail.areas();
    let area = match group.class {
        ErrorClass::FalseAlarm => areas.false_alarm,
        ErrorClass::Miss => areas.miss,
        ErrorClass::Match => areas.matched,
        ErrorClass::Split => areas.split,
        ErrorClass::Merge => areas.merge,
        ErrorClass::Multiple => 0.0,
    };
    UnitSummary {
        refs: group.refs.clone(),
        hyps: group.hyps.clone(),
        class: group.class,
        area,
    }
}

fn match_summary(record: &MatchRecord) -> UnitSummary {
    let (refs, hyps) = match record.correspondence {
        Correspondence::Linked { ref_id, hyp_id, .. } => (vec![ref_id], vec![hyp_id]),
        Correspondence::MissedResidual { ref_id } => (vec![ref_id], Vec::new()),
        Correspondence::FalseAlarmResidual { hyp_id } => (Vec::new(), vec![hyp_id]),
    };
    UnitSummary {
        refs,
        hyps,
        class: record.class,
        area: record.area(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ZoneMap {
    weights: ScoreWeights,
}

impl ZoneMap {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }
}

impl Matcher for ZoneMap {
    fn name(&self) -> &'static str {
        "zonemap"
    }

    fn evaluate(&self, refs: &RegionSet, hyps: &RegionSet) -> Result<Evaluation> {
        let outcome = match_zonemap(refs, hyps, &self.weights, None)?;
        Ok(Evaluation {
            units: outcome.groups.iter().map(group_summary).collect(),
            scores: outcome.scores,
            counts: outcome.counts,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ZoneMapAlt {
    threshold: f64,
    weights: ScoreWeights,
}

impl ZoneMapAlt {
    pub fn new(threshold: f64, weights: ScoreWeights) -> Self {
        Self { threshold, weights }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ZoneMapAlt {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, ScoreWeights::default())
    }
}

impl Matcher for ZoneMapAlt {
    fn name(&self) -> &'static str {
        "zonemapalt"
    }

    fn evaluate(&self, refs: &RegionSet, hyps: &RegionSet) -> Result<Evaluation> {
        let outcome = match_zonemapalt(refs, hyps, self.threshold, &self.weights, None)?;
        Ok(Evaluation {
            units: outcome.matches.iter().map(match_summary).collect(),
            scores: outcome.scores,
            counts: outcome.counts,
        })
    }
}
