pub mod gedi;
pub mod zones_file;

pub use gedi::GediLoader;
pub use zones_file::ZoneFileLoader;

use anyhow::Result;
use std::path::Path;

use crate::core::model::RegionSet;

/// Source of the regions of one side of a document.
pub trait RegionLoader {
    /// Loads every region of the configured kind. A file without such
    /// regions yields an empty set.
    fn load_regions(&self, path: &Path) -> Result<RegionSet>;
}
