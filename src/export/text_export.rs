use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::export::Exporter;
use crate::pipeline::CorpusReport;

#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn render(report: &CorpusReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== {} ===\n", report.algorithm);

        for doc in &report.documents {
            let _ = writeln!(out, "{:<40} {:>10.2}", doc.name, doc.scores.score);
        }
        for name in &report.skipped {
            let _ = writeln!(out, "{:<40} {:>10}", name, "skipped");
        }

        let _ = writeln!(out, "\n{:<24} {:>14} {:>14} {:>8}", "category", "sum", "mean", "count");
        let keys: BTreeSet<&str> = report
            .sum
            .keys()
            .chain(report.mean.keys())
            .map(String::as_str)
            .collect();
        for key in keys {
            let sum = report.sum.get(key).copied().unwrap_or(0.0);
            let mean = report.mean.get(key).copied().unwrap_or(0.0);
            let count = report
                .counts
                .get(key)
                .map(|count| count.to_string())
                .unwrap_or_default();
            let _ = writeln!(out, "{key:<24} {sum:>14.2} {mean:>14.2} {count:>8}");
        }
        out
    }
}

impl Exporter for TextExporter {
    fn export(&self, report: &CorpusReport) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("summary.txt");
        fs::write(path, Self::render(report))?;
        Ok(())
    }
}
