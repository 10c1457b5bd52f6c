use std::collections::BTreeMap;

use crate::core::error::{Result, ScoreError};
use crate::core::model::{Category, CountRecord, ErrorClass, RegionSet, ScoreRecord};
use crate::core::weights::ScoreWeights;
use crate::matching::grouping::ClassifiedGroup;
use crate::matching::threshold::{Correspondence, MatchRecord};

/// Turns weighted category areas into a score record normalized by the
/// reference area. A reference set without area has no defined score.
pub fn normalize(areas: BTreeMap<Category, f64>, total_reference_area: f64) -> Result<ScoreRecord> {
    if total_reference_area <= 0.0 {
        return Err(ScoreError::ZeroReferenceArea);
    }
    let mut record = ScoreRecord {
        areas,
        score: 0.0,
        total_reference_area,
    };
    record.score = record.error_area() * 100.0 / total_reference_area;
    Ok(record)
}

fn book(
    areas: &mut BTreeMap<Category, f64>,
    counts: &mut CountRecord,
    category: Category,
    area: f64,
) {
    *areas.entry(category).or_insert(0.0) += area;
    if area > 0.0 {
        counts.bump(category);
    }
}

/// Scores grouping-algorithm output. A group counts towards a category when
/// its contribution to that category is positive.
pub fn score_groups(
    groups: &[ClassifiedGroup],
    refs: &RegionSet,
    weights: &ScoreWeights,
) -> Result<(ScoreRecord, CountRecord)> {
    let mut areas: BTreeMap<Category, f64> =
        Category::ZONEMAP.iter().map(|category| (*category, 0.0)).collect();
    let mut counts = CountRecord::with_categories(&Category::ZONEMAP);

    for group in groups {
        let detail = group.detail.areas();
        book(&mut areas, &mut counts, Category::Match, detail.matched * weights.matched);
        book(&mut areas, &mut counts, Category::Miss, detail.miss * weights.miss);
        book(
            &mut areas,
            &mut counts,
            Category::FalseAlarm,
            detail.false_alarm * weights.false_alarm,
        );
        book(
            &mut areas,
            &mut counts,
            Category::Split,
            weights.split_area(detail.split, group.hyps.len()),
        );
        book(
            &mut areas,
            &mut counts,
            Category::Merge,
            weights.merge_area(detail.merge, group.refs.len()),
        );
    }

    let scores = normalize(areas, refs.total_area())?;
    Ok((scores, counts))
}

fn weighted_match_area(record: &MatchRecord, weights: &ScoreWeights) -> f64 {
    let area = record.area();
    let (ref_card, hyp_card) = match record.correspondence {
        Correspondence::Linked {
            ref_card, hyp_card, ..
        } => (ref_card, hyp_card),
        Correspondence::MissedResidual { .. } => (1, 0),
        Correspondence::FalseAlarmResidual { .. } => (0, 1),
    };
    match record.class {
        ErrorClass::Match => area * weights.matched,
        ErrorClass::Miss => area * weights.miss,
        ErrorClass::FalseAlarm => area * weights.false_alarm,
        ErrorClass::Split => weights.split_area(area, hyp_card),
        ErrorClass::Merge => weights.merge_area(area, ref_card),
        ErrorClass::Multiple => weights.multiple_area(area, ref_card, hyp_card),
    }
}

/// Scores threshold-algorithm output. Every record counts once under its class.
pub fn score_matches(
    matches: &[MatchRecord],
    refs: &RegionSet,
    weights: &ScoreWeights,
) -> Result<(ScoreRecord, CountRecord)> {
    let mut areas: BTreeMap<Category, f64> = Category::ZONEMAP_ALT
        .iter()
        .map(|category| (*category, 0.0))
        .collect();
    let mut counts = CountRecord::with_categories(&Category::ZONEMAP_ALT);

    for record in matches {
        let category = record.class.category();
        *areas.entry(category).or_insert(0.0) += weighted_match_area(record, weights);
        counts.bump(category);
    }

    let scores = normalize(areas, refs.total_area())?;
    Ok((scores, counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;

    #[test]
    fn normalizes_error_area_by_reference_area() {
        let areas = [
            (Category::Match, 60.0),
            (Category::Miss, 40.0),
            (Category::FalseAlarm, 10.0),
        ]
        .into_iter()
        .collect();
        let record = normalize(areas, 100.0).unwrap();
        assert!((record.score - 50.0).abs() < 1e-9);
        assert_eq!(record.total_reference_area, 100.0);
    }

    #[test]
    fn zero_reference_area_is_an_error() {
        let err = normalize(BTreeMap::new(), 0.0).unwrap_err();
        assert_eq!(err, ScoreError::ZeroReferenceArea);
    }

    #[test]
    fn multiple_weight_uses_both_cardinalities() {
        let record = MatchRecord {
            correspondence: Correspondence::Linked {
                ref_id: 1,
                hyp_id: 1,
                ref_card: 2,
                hyp_card: 3,
            },
            class: ErrorClass::Multiple,
            zone: BBox::new(0.0, 0.0, 2.0, 5.0).to_shape(),
        };
        let refs: RegionSet = [(1, BBox::new(0.0, 0.0, 10.0, 10.0).to_shape())]
            .into_iter()
            .collect();
        let (scores, counts) =
            score_matches(&[record], &refs, &ScoreWeights::default()).unwrap();
        assert!((scores.area(Category::Multiple) - 25.0).abs() < 1e-6);
        assert!((scores.score - 25.0).abs() < 1e-6);
        assert_eq!(counts.count(Category::Multiple), 1);
    }
}
