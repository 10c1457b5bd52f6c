use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::geometry::{self, Shape};

pub type RegionId = i64;

/// Classification of one correspondence unit, derived from its cardinalities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    FalseAlarm,
    Miss,
    Match,
    Split,
    Merge,
    Multiple,
}

impl ErrorClass {
    /// Score category the unit's own area is booked under.
    pub fn category(self) -> Category {
        match self {
            ErrorClass::FalseAlarm => Category::FalseAlarm,
            ErrorClass::Miss => Category::Miss,
            ErrorClass::Match => Category::Match,
            ErrorClass::Split => Category::Split,
            ErrorClass::Merge => Category::Merge,
            ErrorClass::Multiple => Category::Multiple,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorClass::FalseAlarm => "False alarm",
            ErrorClass::Miss => "Miss",
            ErrorClass::Match => "Match",
            ErrorClass::Split => "Split",
            ErrorClass::Merge => "Merge",
            ErrorClass::Multiple => "Multiple",
        };
        f.write_str(label)
    }
}

/// Area categories of a score record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Match,
    Miss,
    FalseAlarm,
    Split,
    Merge,
    Multiple,
}

impl Category {
    /// Categories reported by the grouping algorithm.
    pub const ZONEMAP: [Category; 5] = [
        Category::Match,
        Category::Miss,
        Category::FalseAlarm,
        Category::Split,
        Category::Merge,
    ];

    /// Categories reported by the threshold algorithm.
    pub const ZONEMAP_ALT: [Category; 6] = [
        Category::Match,
        Category::Miss,
        Category::FalseAlarm,
        Category::Split,
        Category::Merge,
        Category::Multiple,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Match => "match",
            Category::Miss => "miss",
            Category::FalseAlarm => "false_alarm",
            Category::Split => "split",
            Category::Merge => "merge",
            Category::Multiple => "multiple",
        }
    }

    /// Whether the category counts as error in the final score.
    pub fn is_error(self) -> bool {
        !matches!(self, Category::Match)
    }
}

#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub shape: Shape,
    pub area: f64,
}

impl Region {
    pub fn new(id: RegionId, shape: Shape) -> Self {
        let area = geometry::area(&shape);
        Self { id, shape, area }
    }
}

/// Regions of one side of a document, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    regions: Vec<Region>,
    index: HashMap<RegionId, usize>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region. An id already present keeps its position and takes the new shape.
    pub fn insert(&mut self, id: RegionId, shape: Shape) {
        let region = Region::new(id, shape);
        match self.index.get(&id) {
            Some(&pos) => {
                warn!("region id {id} appears twice, keeping the last definition");
                self.regions[pos] = region;
            }
            None => {
                self.index.insert(id, self.regions.len());
                self.regions.push(region);
            }
        }
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.index.get(&id).map(|&pos| &self.regions[pos])
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().map(|region| region.id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn total_area(&self) -> f64 {
        self.regions.iter().map(|region| region.area).sum()
    }
}

impl FromIterator<(RegionId, Shape)> for RegionSet {
    fn from_iter<I: IntoIterator<Item = (RegionId, Shape)>>(iter: I) -> Self {
        let mut set = RegionSet::new();
        for (id, shape) in iter {
            set.insert(id, shape);
        }
        set
    }
}

/// Weighted category areas of one document plus the normalized score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub areas: BTreeMap<Category, f64>,
    pub score: f64,
    pub total_reference_area: f64,
}

impl ScoreRecord {
    pub fn area(&self, category: Category) -> f64 {
        self.areas.get(&category).copied().unwrap_or(0.0)
    }

    pub fn error_area(&self) -> f64 {
        self.areas
            .iter()
            .filter(|(category, _)| category.is_error())
            .map(|(_, area)| *area)
            .sum()
    }

    /// Flat key/value view used for corpus aggregation.
    pub fn to_entries(&self) -> BTreeMap<String, f64> {
        let mut entries: BTreeMap<String, f64> = self
            .areas
            .iter()
            .map(|(category, area)| (category.as_str().to_string(), *area))
            .collect();
        entries.insert("score".to_string(), self.score);
        entries.insert("total_reference_area".to_string(), self.total_reference_area);
        entries
    }
}

/// Number of contributing units per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountRecord {
    pub counts: BTreeMap<Category, usize>,
}

impl CountRecord {
    pub fn with_categories(categories: &[Category]) -> Self {
        Self {
            counts: categories.iter().map(|category| (*category, 0)).collect(),
        }
    }

    pub fn bump(&mut self, category: Category) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn to_entries(&self) -> BTreeMap<String, usize> {
        self.counts
            .iter()
            .map(|(category, count)| (category.as_str().to_string(), *count))
            .collect()
    }
}
