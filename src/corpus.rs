//! Cross-document aggregation of score and count dictionaries.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A reference file and the hypothesis file carrying the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    pub name: String,
    pub reference: PathBuf,
    pub hypothesis: PathBuf,
}

fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Pairs every reference file with the hypothesis file of the same name,
/// in name order. Files present on one side only are ignored.
pub fn pair_documents(ref_dir: &Path, hyp_dir: &Path) -> Result<Vec<DocumentPair>> {
    let hyp_names = file_names(hyp_dir)?;
    let pairs = file_names(ref_dir)?
        .into_iter()
        .filter(|name| hyp_names.binary_search(name).is_ok())
        .map(|name| DocumentPair {
            reference: ref_dir.join(&name),
            hypothesis: hyp_dir.join(&name),
            name,
        })
        .collect();
    Ok(pairs)
}

/// Key-wise sum; a key absent from a record contributes nothing.
pub fn sum<'a, I>(records: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a BTreeMap<String, f64>>,
{
    let mut total = BTreeMap::new();
    for record in records {
        for (key, value) in record {
            *total.entry(key.clone()).or_insert(0.0) += value;
        }
    }
    total
}

pub fn sum_counts<'a, I>(records: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a BTreeMap<String, usize>>,
{
    let mut total = BTreeMap::new();
    for record in records {
        for (key, value) in record {
            *total.entry(key.clone()).or_insert(0) += value;
        }
    }
    total
}

/// Key-wise arithmetic mean over all records.
pub fn mean(records: &[BTreeMap<String, f64>]) -> BTreeMap<String, f64> {
    if records.is_empty() {
        return BTreeMap::new();
    }
    let count = records.len() as f64;
    sum(records)
        .into_iter()
        .map(|(key, value)| (key, value / count))
        .collect()
}

/// Legacy running average: each value is added to the running total of its
/// key, which is then halved. Earlier records weigh less, so this is not an
/// arithmetic mean; kept for comparing against results produced with it.
/// Use [`mean`] for reports.
pub fn halving_average(records: &[BTreeMap<String, f64>]) -> BTreeMap<String, f64> {
    let mut total: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        for (key, value) in record {
            let entry = total.entry(key.clone()).or_insert(0.0);
            *entry += value;
            *entry /= 2.0;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn sum_treats_missing_keys_as_zero() {
        let a = record(&[("miss", 10.0), ("match", 5.0)]);
        let b = record(&[("miss", 2.5), ("multiple", 4.0)]);
        assert_eq!(
            sum([&a, &b]),
            record(&[("match", 5.0), ("miss", 12.5), ("multiple", 4.0)])
        );
    }

    #[test]
    fn mean_divides_by_record_count() {
        let records = vec![
            record(&[("score", 4.0)]),
            record(&[("score", 4.0)]),
            record(&[("score", 7.0)]),
        ];
        assert_eq!(mean(&records), record(&[("score", 5.0)]));
        assert!(mean(&[]).is_empty());
    }

    #[test]
    fn halving_average_is_not_a_mean_beyond_two_records() {
        let records = vec![
            record(&[("score", 4.0)]),
            record(&[("score", 4.0)]),
            record(&[("score", 4.0)]),
        ];
        // ((4 / 2 + 4) / 2 + 4) / 2
        assert_eq!(halving_average(&records), record(&[("score", 3.5)]));
        assert_eq!(mean(&records), record(&[("score", 4.0)]));
        // Even two records are weighted 1/4 and 1/2.
        assert_eq!(
            halving_average(&records[..2]),
            record(&[("score", 3.0)])
        );
    }

    #[test]
    fn sum_is_order_independent() {
        let a = record(&[("miss", 1.5), ("split", 3.0)]);
        let b = record(&[("miss", 2.0)]);
        let c = record(&[("split", 0.5), ("merge", 1.0)]);
        assert_eq!(sum([&a, &b, &c]), sum([&c, &a, &b]));
    }

    #[test]
    fn pairs_files_by_name() -> Result<()> {
        let mut root = std::env::temp_dir();
        root.push(format!("zonemap-pairs-{}", std::process::id()));
        let refs = root.join("ref");
        let hyps = root.join("hyp");
        fs::create_dir_all(&refs)?;
        fs::create_dir_all(&hyps)?;
        for name in ["b.xml", "a.xml", "only_ref.xml"] {
            fs::write(refs.join(name), "")?;
        }
        for name in ["a.xml", "b.xml", "only_hyp.xml"] {
            fs::write(hyps.join(name), "")?;
        }

        let pairs = pair_documents(&refs, &hyps)?;
        let names: Vec<_> = pairs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
        assert_eq!(pairs[1].hypothesis, hyps.join("b.xml"));

        let _ = fs::remove_dir_all(&root);
        Ok(())
    }
}
