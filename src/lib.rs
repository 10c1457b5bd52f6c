pub mod core;
pub mod corpus;
pub mod export;
pub mod matching;
pub mod parser;
pub mod pipeline;

pub use core::model::{Category, CountRecord, ErrorClass, Region, RegionSet, ScoreRecord};
pub use matching::{match_zonemap, match_zonemapalt, Matcher, ZoneMap, ZoneMapAlt};
