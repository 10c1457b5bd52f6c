use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use pretty_assertions::assert_eq;

use zonemap::core::error::ScoreError;
use zonemap::core::geometry::BBox;
use zonemap::core::model::{Category, ErrorClass, RegionId, RegionSet};
use zonemap::core::weights::ScoreWeights;
use zonemap::corpus;
use zonemap::matching::{match_zonemap, match_zonemapalt, Matcher, ZoneMap, ZoneMapAlt};
use zonemap::parser::{GediLoader, RegionLoader};
use zonemap::pipeline::{
    evaluate_corpus, evaluate_document, export_report, threshold_sweep, Algorithm, InputFormat,
    PipelineConfig,
};

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn regions(boxes: &[(RegionId, [f64; 4])]) -> RegionSet {
    boxes
        .iter()
        .map(|(id, [x0, y0, x1, y1])| (*id, BBox::new(*x0, *y0, *x1, *y1).to_shape()))
        .collect()
}

fn temp_dir(prefix: &str) -> PathBuf {
    let mut out = std::env::temp_dir();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let pid = std::process::id();
    out.push(format!("{prefix}-{pid}-{now}"));
    out
}

fn matchers() -> Vec<Box<dyn Matcher>> {
    vec![Box::new(ZoneMap::default()), Box::new(ZoneMapAlt::default())]
}

#[test]
fn identical_square_is_a_perfect_match() -> Result<()> {
    let refs = regions(&[(1, [0.0, 0.0, 10.0, 10.0])]);
    let hyps = regions(&[(1, [0.0, 0.0, 10.0, 10.0])]);

    for matcher in matchers() {
        let evaluation = matcher.evaluate(&refs, &hyps)?;
        let scores = &evaluation.scores;
        approx(scores.area(Category::Match), 100.0);
        for category in [Category::Miss, Category::FalseAlarm, Category::Split, Category::Merge] {
            approx(scores.area(category), 0.0);
        }
        approx(scores.score, 0.0);
        assert_eq!(evaluation.counts.count(Category::Match), 1, "{}", matcher.name());
    }
    Ok(())
}

#[test]
fn empty_hypothesis_misses_everything() -> Result<()> {
    let refs = regions(&[(1, [0.0, 0.0, 10.0, 10.0])]);
    let hyps = RegionSet::new();

    for matcher in matchers() {
        let evaluation = matcher.evaluate(&refs, &hyps)?;
        approx(evaluation.scores.area(Category::Miss), 100.0);
        approx(evaluation.scores.score, 100.0);
        assert_eq!(evaluation.units.len(), 1);
        assert_eq!(evaluation.units[0].class, ErrorClass::Miss);
    }
    Ok(())
}

#[test]
fn halves_tiling_a_reference_form_a_split() -> Result<()> {
    let refs = regions(&[(1, [0.0, 0.0, 10.0, 10.0])]);
    let hyps = regions(&[(1, [0.0, 0.0, 5.0, 10.0]), (2, [5.0, 0.0, 10.0, 10.0])]);
    let weights = ScoreWeights::default();

    let grouped = match_zonemap(&refs, &hyps, &weights, None)?;
    assert_eq!(grouped.groups.len(), 1);
    assert_eq!(grouped.groups[0].class, ErrorClass::Split);
    assert_eq!(grouped.groups[0].hyps, vec![1, 2]);
    approx(grouped.scores.area(Category::Match), 50.0);
    approx(grouped.scores.area(Category::Split), 50.0);
    approx(grouped.scores.score, 50.0);
    assert_eq!(grouped.counts.count(Category::Split), 1);

    let gated = match_zonemapalt(&refs, &hyps, 0.15, &weights, None)?;
    let classes: Vec<_> = gated.matches.iter().map(|m| m.class).collect();
    assert_eq!(classes, vec![ErrorClass::Match, ErrorClass::Split]);
    approx(gated.scores.area(Category::Match), 50.0);
    approx(gated.scores.area(Category::Split), 50.0);
    approx(gated.scores.area(Category::Miss), 0.0);
    approx(gated.scores.score, 50.0);
    Ok(())
}

#[test]
fn crossing_regions_produce_multiple_only_in_threshold_matcher() -> Result<()> {
    let refs = regions(&[(1, [0.0, 0.0, 10.0, 5.0]), (2, [0.0, 5.0, 10.0, 10.0])]);
    let hyps = regions(&[(1, [0.0, 0.0, 5.0, 10.0]), (2, [5.0, 0.0, 10.0, 10.0])]);
    let weights = ScoreWeights::default();

    let grouped = match_zonemap(&refs, &hyps, &weights, None)?;
    assert!(grouped
        .groups
        .iter()
        .all(|group| group.class != ErrorClass::Multiple));

    let gated = match_zonemapalt(&refs, &hyps, 0.15, &weights, None)?;
    assert_eq!(gated.counts.count(Category::Multiple), 1);
    Ok(())
}

#[test]
fn total_reference_area_does_not_depend_on_matcher() -> Result<()> {
    let refs = regions(&[
        (1, [0.0, 0.0, 10.0, 10.0]),
        (2, [20.0, 0.0, 30.0, 5.0]),
        (3, [0.0, 20.0, 4.0, 24.0]),
    ]);
    let hyps = regions(&[(7, [2.0, 2.0, 25.0, 8.0])]);

    for matcher in matchers() {
        let evaluation = matcher.evaluate(&refs, &hyps)?;
        approx(evaluation.scores.total_reference_area, 166.0);
    }
    Ok(())
}

#[test]
fn stricter_threshold_never_reduces_miss_and_false_alarm() -> Result<()> {
    let refs = regions(&[(1, [0.0, 0.0, 10.0, 10.0]), (2, [20.0, 0.0, 30.0, 10.0])]);
    let hyps = regions(&[
        (1, [0.0, 0.0, 5.0, 10.0]),
        (2, [5.0, 0.0, 10.0, 10.0]),
        (3, [22.0, 0.0, 32.0, 10.0]),
    ]);
    let weights = ScoreWeights::default();

    let mut previous = 0.0;
    for step in 0..=10 {
        let threshold = step as f64 / 10.0;
        let outcome = match_zonemapalt(&refs, &hyps, threshold, &weights, None)?;
        let uncovered =
            outcome.scores.area(Category::Miss) + outcome.scores.area(Category::FalseAlarm);
        assert!(
            uncovered + 1e-9 >= previous,
            "threshold {threshold}: {uncovered} < {previous}"
        );
        previous = uncovered;
    }
    // Both halves and the shifted pair rejected.
    approx(previous, 400.0);
    Ok(())
}

#[test]
fn zero_reference_area_is_reported() {
    let refs = RegionSet::new();
    let hyps = regions(&[(1, [0.0, 0.0, 10.0, 10.0])]);

    for matcher in matchers() {
        let err = matcher.evaluate(&refs, &hyps).unwrap_err();
        assert_eq!(err, ScoreError::ZeroReferenceArea);
    }
}

#[test]
fn invalid_threshold_is_refused() {
    let refs = regions(&[(1, [0.0, 0.0, 10.0, 10.0])]);
    let err = ZoneMapAlt::new(f64::NAN, ScoreWeights::default())
        .evaluate(&refs, &refs)
        .unwrap_err();
    assert!(matches!(err, ScoreError::InvalidThreshold(_)));
}

const GEDI_REF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GEDI xmlns="http://lamp.cfar.umd.edu/media/projects/GEDI/" GEDI_version="2.4">
  <DL_DOCUMENT src="scan.tif" NrOfPages="1">
    <DL_PAGE gedi_type="DL_PAGE" pageID="1" width="100" height="100">
      <DL_ZONE gedi_type="Area" id="1" col="0" row="0" width="10" height="10"/>
      <DL_ZONE gedi_type="Area" id="2" col="20" row="0" width="10" height="10"/>
    </DL_PAGE>
  </DL_DOCUMENT>
</GEDI>"#;

const GEDI_HYP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GEDI xmlns="http://lamp.cfar.umd.edu/media/projects/GEDI/" GEDI_version="2.4">
  <DL_DOCUMENT src="scan.tif" NrOfPages="1">
    <DL_PAGE gedi_type="DL_PAGE" pageID="1" width="100" height="100">
      <DL_ZONE gedi_type="Area" id="10" col="0" row="0" width="10" height="10"/>
    </DL_PAGE>
  </DL_DOCUMENT>
</GEDI>"#;

#[test]
fn gedi_documents_are_scored_end_to_end() -> Result<()> {
    let root = temp_dir("zonemap-gedi");
    fs::create_dir_all(&root)?;
    let ref_path = root.join("ref.xml");
    let hyp_path = root.join("hyp.xml");
    fs::write(&ref_path, GEDI_REF)?;
    fs::write(&hyp_path, GEDI_HYP)?;

    let loaded = GediLoader::default().load_regions(&ref_path)?;
    assert_eq!(loaded.ids().collect::<Vec<_>>(), vec![1, 2]);

    let config = PipelineConfig::new(ref_path.clone(), hyp_path.clone(), root.clone(), Algorithm::ZoneMap);
    let report = evaluate_document(&config, "page", &ref_path, &hyp_path)?;
    assert_eq!(report.algorithm, "zonemap");
    approx(report.scores.area(Category::Match), 100.0);
    approx(report.scores.area(Category::Miss), 100.0);
    approx(report.scores.score, 50.0);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn corpus_run_exports_reports_and_skips_empty_references() -> Result<()> {
    let root = temp_dir("zonemap-corpus");
    let refs = root.join("ref");
    let hyps = root.join("hyp");
    let out = root.join("out");
    fs::create_dir_all(&refs)?;
    fs::create_dir_all(&hyps)?;
    fs::write(refs.join("a.txt"), "1,0,0,10,10\n")?;
    fs::write(hyps.join("a.txt"), "1,0,0,10,10\n")?;
    fs::write(refs.join("b.txt"), "1,0,0,10,10\n")?;
    fs::write(hyps.join("b.txt"), "")?;
    fs::write(refs.join("c.txt"), "\n")?;
    fs::write(hyps.join("c.txt"), "3,0,0,4,4\n")?;

    let config = PipelineConfig::new(refs, hyps, out.clone(), Algorithm::ZoneMapAlt { threshold: 0.15 })
        .with_format(InputFormat::Zones);
    let report = evaluate_corpus(&config)?;

    let names: Vec<_> = report.documents.iter().map(|doc| doc.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert_eq!(report.skipped, vec!["c.txt".to_string()]);
    approx(report.sum["score"], 100.0);
    approx(report.mean["score"], 50.0);
    approx(report.sum["miss"], 100.0);
    assert_eq!(report.counts["match"], 1);
    assert_eq!(report.counts["miss"], 1);

    export_report(&report, &out)?;
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(out.join("report.json"))?)?;
    assert_eq!(json["algorithm"], "zonemapalt");
    assert_eq!(json["documents"].as_array().map(Vec::len), Some(2));
    let summary = fs::read_to_string(out.join("summary.txt"))?;
    assert!(summary.contains("c.txt"));
    assert!(summary.contains("skipped"));

    let points = threshold_sweep(&config, &[0.0, 0.5, 1.0])?;
    assert_eq!(points.len(), 3);
    // A perfect match clears every threshold below 1 but not 1 itself.
    approx(points[0].mean["score"], 50.0);
    approx(points[1].mean["score"], 50.0);
    approx(points[2].mean["score"], 150.0);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn aggregation_sums_categories_across_documents() -> Result<()> {
    let first = regions(&[(1, [0.0, 0.0, 10.0, 10.0])]);
    let second_ref = regions(&[(1, [0.0, 0.0, 10.0, 10.0])]);
    let second_hyp = regions(&[(1, [0.0, 0.0, 10.0, 5.0])]);

    let matcher = ZoneMap::default();
    let a = matcher.evaluate(&first, &first)?.scores.to_entries();
    let b = matcher.evaluate(&second_ref, &second_hyp)?.scores.to_entries();

    let total = corpus::sum([&a, &b]);
    for (key, value) in &total {
        let expected = a.get(key).copied().unwrap_or(0.0) + b.get(key).copied().unwrap_or(0.0);
        approx(*value, expected);
    }
    approx(total["match"], 150.0);
    approx(total["miss"], 50.0);

    let records = vec![a.clone(), b.clone(), b];
    approx(corpus::mean(&records)["score"], 100.0 / 3.0);
    // (((0 / 2) + 50) / 2 + 50) / 2
    approx(corpus::halving_average(&records)["score"], 37.5);
    Ok(())
}
