use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::geometry::BBox;
use crate::core::model::{RegionId, RegionSet};
use crate::parser::RegionLoader;

/// Plain-text zone list, one `id,left,top,width,height` line per region.
#[derive(Debug, Default, Clone)]
pub struct ZoneFileLoader;

impl ZoneFileLoader {
    pub fn new() -> Self {
        Self
    }
}

impl RegionLoader for ZoneFileLoader {
    fn load_regions(&self, path: &Path) -> Result<RegionSet> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read zone file: {}", path.display()))?;
        parse_zones_str(&content).with_context(|| format!("invalid zone file: {}", path.display()))
    }
}

pub fn parse_zones_str(content: &str) -> Result<RegionSet> {
    let mut regions = RegionSet::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 5 {
            anyhow::bail!(
                "line {}: expected 5 comma-separated fields, found {}",
                line_no + 1,
                fields.len()
            );
        }
        let number = |idx: usize| -> Result<i64> {
            fields[idx]
                .parse::<i64>()
                .with_context(|| format!("line {}: field {} is not an integer", line_no + 1, idx + 1))
        };
        let id: RegionId = number(0)?;
        let bbox = BBox::from_xywh(
            number(1)? as f64,
            number(2)? as f64,
            number(3)? as f64,
            number(4)? as f64,
        );
        regions.insert(id, bbox.to_shape());
    }
    Ok(regions)
}
