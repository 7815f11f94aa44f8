use crate::classify::{ClassifierSettings, DumpOptions};
use crate::config::{NetworkConfig, PackageRequest};
use crate::distro::{Distribution, PackageFamily};
use crate::driver::PullSettings;
use crate::repository::RepositoryIndex;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PullParams {
    pub distributions: Vec<Distribution>,
    pub settings: PullSettings,
    pub summary_json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LocateParams {
    pub distribution: Distribution,
    pub packages: Vec<PackageRequest>,
    pub rocm_version: Option<String>,
    pub gfx_arch: Option<String>,
    pub network: NetworkConfig,
}

#[derive(Debug, Clone)]
pub struct ClassifyParams {
    pub files: Vec<PathBuf>,
    pub family: PackageFamily,
    pub index: Option<RepositoryIndex>,
    pub classifier: ClassifierSettings,
    pub dump: DumpOptions,
}
