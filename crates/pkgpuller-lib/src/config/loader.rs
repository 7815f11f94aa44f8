use super::Config;
use super::model::DistributionConfig;
use super::shell_file::parse_shell_assignments;
use crate::distro::{Distribution, RepositorySource, find_known_distribution};
use crate::error::PullError;
use config::Config as ConfigBuilder;
use std::collections::HashSet;
use std::path::Path;

pub fn load_config(config_path: &str) -> Result<Config, PullError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}

impl Config {
    /// Value substituted for `{version}` placeholders in repository definitions.
    pub fn template_version(&self) -> Option<&str> {
        self.repo_version
            .as_deref()
            .or(self.rocm_version.as_deref())
    }

    /// Instantiates the configured distributions. Relative `config_file` paths are resolved
    /// against `config_dir`.
    pub fn distributions(&self, config_dir: &Path) -> Result<Vec<Distribution>, PullError> {
        let mut seen = HashSet::new();
        let mut distributions = Vec::with_capacity(self.distributions.len());

        for def in &self.distributions {
            if !seen.insert(def.tag.as_str()) {
                return Err(PullError::ConfigValidation {
                    details: format!("Distribution {} is configured more than once", def.tag),
                });
            }
            distributions.push(self.build_distribution(def, config_dir)?);
        }

        Ok(distributions)
    }

    fn build_distribution(
        &self,
        def: &DistributionConfig,
        config_dir: &Path,
    ) -> Result<Distribution, PullError> {
        let family = match (find_known_distribution(&def.tag), def.family) {
            (Some(known), Some(family)) if known.family != family => {
                return Err(PullError::ConfigValidation {
                    details: format!(
                        "Distribution {} uses {} packages, not {}",
                        def.tag, known.family, family
                    ),
                });
            }
            (Some(known), _) => known.family,
            (None, Some(family)) => family,
            (None, None) => {
                return Err(PullError::UnknownDistribution {
                    tag: def.tag.clone(),
                });
            }
        };

        let mut raw_sources: Vec<String> = def.repositories.clone();
        if let Some(config_file) = &def.config_file {
            let path = config_dir.join(config_file);
            let content =
                std::fs::read_to_string(&path).map_err(|e| PullError::RepositoryConfigFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            let variables =
                parse_shell_assignments(&content).map_err(|e| PullError::RepositoryConfigFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;

            for name in &def.config_variables {
                match variables.get(name) {
                    Some(value) if !value.trim().is_empty() => raw_sources.push(value.clone()),
                    _ => tracing::debug!(
                        distro = %def.tag,
                        variable = %name,
                        path = %path.display(),
                        "Repository variable not set"
                    ),
                }
            }
        }

        if raw_sources.is_empty() {
            return Err(PullError::ConfigValidation {
                details: format!("Distribution {} has no repositories", def.tag),
            });
        }

        let sources = raw_sources
            .iter()
            .map(|raw| {
                let instantiated = match self.template_version() {
                    Some(version) => raw.replace("{version}", version),
                    None if raw.contains("{version}") => {
                        return Err(PullError::ConfigValidation {
                            details: format!(
                                "Repository for {} uses {{version}} but neither repo_version nor rocm_version is set",
                                def.tag
                            ),
                        });
                    }
                    None => raw.clone(),
                };
                RepositorySource::parse(family, &instantiated).map_err(|e| {
                    PullError::RepositorySource {
                        distro: def.tag.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Distribution {
            tag: def.tag.clone(),
            family,
            sources,
        })
    }
}
