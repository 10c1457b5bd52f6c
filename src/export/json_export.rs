use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::export::Exporter;
use crate::pipeline::{CorpusReport, SweepPoint};

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn write<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(file_name);
        let data = serde_json::to_string_pretty(value)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn export_sweep(&self, points: &[SweepPoint]) -> Result<()> {
        self.write("sweep.json", points)
    }
}

impl Exporter for JsonExporter {
    fn export(&self, report: &CorpusReport) -> Result<()> {
        self.write("report.json", report)
    }
}
