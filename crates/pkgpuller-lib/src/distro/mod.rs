mod known;
mod source;

pub use known::{KNOWN_DISTRIBUTIONS, KnownDistribution, PackageFamily, find_known_distribution};
pub use source::{RepositorySource, SourceError};

use std::path::{Path, PathBuf};

/// One target OS for a pull. Built once from configuration and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct Distribution {
    pub tag: String,
    pub family: PackageFamily,
    pub sources: Vec<RepositorySource>,
}

impl Distribution {
    pub fn output_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.tag)
    }
}
