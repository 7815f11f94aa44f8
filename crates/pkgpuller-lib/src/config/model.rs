use crate::classify::ClassifierSettings;
use crate::distro::PackageFamily;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, untagged)]
pub enum PackageRequest {
    Simple(String),
    Advanced {
        name: String,
        #[serde(default)]
        versioned: bool,
        #[serde(default)]
        gfx_specific: bool,
    },
}

impl PackageRequest {
    pub fn name(&self) -> &str {
        match self {
            PackageRequest::Simple(name) | PackageRequest::Advanced { name, .. } => name,
        }
    }

    pub fn versioned(&self) -> bool {
        matches!(
            self,
            PackageRequest::Advanced {
                versioned: true,
                ..
            }
        )
    }

    pub fn gfx_specific(&self) -> bool {
        matches!(
            self,
            PackageRequest::Advanced {
                gfx_specific: true,
                ..
            }
        )
    }
}

fn default_config_variables() -> Vec<String> {
    vec!["AMDGPU_REPO".to_string(), "ROCM_REPO".to_string()]
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DistributionConfig {
    pub tag: String,
    /// Required only for tags outside the built-in table.
    #[serde(default)]
    pub family: Option<PackageFamily>,
    #[serde(default)]
    pub repositories: Vec<String>,
    /// Shell-sourced `.config` file holding repository definitions.
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    #[serde(default = "default_config_variables")]
    pub config_variables: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub dump_amd: bool,
    #[serde(default)]
    pub dump_other: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct NetworkConfig {
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub max_concurrency_per_host: usize,
    pub distro_parallelism: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 3,
            max_concurrency_per_host: 4,
            distro_parallelism: 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub rocm_version: Option<String>,
    /// Substituted for `{version}` in repository definitions. Defaults to `rocm_version`.
    #[serde(default)]
    pub repo_version: Option<String>,
    #[serde(default)]
    pub gfx_arch: Option<String>,
    pub packages: Vec<PackageRequest>,
    pub distributions: Vec<DistributionConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub classifier: ClassifierSettings,
}
