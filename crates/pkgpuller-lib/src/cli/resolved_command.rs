use crate::cli::args::Command;
use crate::cli::params::{ClassifyParams, LocateParams, PullParams};
use crate::classify::{ClassifierSettings, DumpOptions};
use crate::config::{Config, OutputConfig, PackageRequest, load_config};
use crate::distro::{Distribution, PackageFamily};
use crate::driver::PullSettings;
use crate::error::PullError;
use crate::repository::read_local_index;
use itertools::Itertools;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Pull(PullParams),
    Locate(LocateParams),
    Classify(ClassifyParams),
}

fn config_dir(config_path: &str) -> &Path {
    Path::new(config_path).parent().unwrap_or(Path::new(""))
}

/// Keeps the configured naming flags of packages that are also named on the command line.
fn requested_packages(config: &Config, overrides: Vec<String>) -> Vec<PackageRequest> {
    if overrides.is_empty() {
        return config.packages.clone();
    }
    overrides
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unique()
        .map(|name| {
            config
                .packages
                .iter()
                .find(|request| request.name() == name)
                .cloned()
                .unwrap_or(PackageRequest::Simple(name))
        })
        .collect()
}

fn select_distributions(
    configured: Vec<Distribution>,
    requested: Vec<String>,
    all: bool,
) -> Result<Vec<Distribution>, PullError> {
    if all {
        return Ok(configured);
    }
    if requested.is_empty() {
        return Err(PullError::CliArgumentValidation {
            details: "No distribution selected. Pass --distro <tag> or --all.".to_string(),
        });
    }

    requested
        .into_iter()
        .unique()
        .map(|tag| {
            configured
                .iter()
                .find(|distro| distro.tag == tag)
                .cloned()
                .ok_or_else(|| PullError::CliArgumentValidation {
                    details: format!(
                        "Distribution {} is not configured. Configured distributions: {}",
                        tag,
                        configured.iter().map(|d| d.tag.as_str()).join(", ")
                    ),
                })
        })
        .collect()
}

fn parse_family(family: &str) -> Result<PackageFamily, PullError> {
    match family.to_ascii_lowercase().as_str() {
        "deb" => Ok(PackageFamily::Deb),
        "rpm" => Ok(PackageFamily::Rpm),
        other => Err(PullError::CliArgumentValidation {
            details: format!("Unknown package family {other}. Use deb or rpm."),
        }),
    }
}

fn package_files(path: &Path, family: PackageFamily) -> Result<Vec<PathBuf>, PullError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = std::fs::read_dir(path)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    files.retain(|file| {
        file.is_file() && file.extension().is_some_and(|ext| ext == family.extension())
    });
    files.sort();
    Ok(files)
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, PullError> {
    match command {
        Command::Pull {
            config_path,
            distros,
            all,
            packages,
            output_dir,
            dump_amd,
            dump_other,
            summary_json,
            distro_parallelism,
        } => {
            let app_config = load_config(&config_path)?;
            let configured = app_config.distributions(config_dir(&config_path))?;
            let distributions = select_distributions(configured, distros, all)?;

            if distributions.is_empty() {
                return Err(PullError::CliArgumentValidation {
                    details: "No distributions defined in config".to_string(),
                });
            }

            let packages = requested_packages(&app_config, packages);
            if packages.is_empty() {
                return Err(PullError::CliArgumentValidation {
                    details: "No packages requested. Configure packages or pass --pkg."
                        .to_string(),
                });
            }

            let output_dir = output_dir
                .map(PathBuf::from)
                .or_else(|| app_config.output.path.clone())
                .ok_or_else(|| PullError::CliArgumentValidation {
                    details: "No output directory provided. Configure output.path or pass --output-dir."
                        .to_string(),
                })?;

            let mut network = app_config.network.clone();
            if let Some(parallelism) = distro_parallelism {
                network.distro_parallelism = parallelism;
            }
            for (name, value) in [
                ("distro-parallelism", network.distro_parallelism),
                ("max-concurrency-per-host", network.max_concurrency_per_host),
            ] {
                if value == 0 {
                    return Err(PullError::CliArgumentValidation {
                        details: format!("{name} must be greater than 0."),
                    });
                }
            }

            Ok(ResolvedCommand::Pull(PullParams {
                distributions,
                settings: PullSettings {
                    packages,
                    rocm_version: app_config.rocm_version.clone(),
                    gfx_arch: app_config.gfx_arch.clone(),
                    output_dir,
                    dump: DumpOptions {
                        amd: dump_amd || app_config.output.dump_amd,
                        other: dump_other || app_config.output.dump_other,
                    },
                    classifier: app_config.classifier.clone(),
                    network,
                },
                summary_json: summary_json.map(PathBuf::from),
            }))
        }
        Command::Locate {
            config_path,
            distro,
            packages,
        } => {
            let app_config = load_config(&config_path)?;
            let configured = app_config.distributions(config_dir(&config_path))?;
            let distribution = select_distributions(configured, vec![distro], false)?
                .into_iter()
                .next()
                .ok_or_else(|| PullError::CliArgumentValidation {
                    details: "No distribution selected".to_string(),
                })?;

            let packages = requested_packages(&app_config, packages);
            if packages.is_empty() {
                return Err(PullError::CliArgumentValidation {
                    details: "No packages to locate. Configure packages or pass them as arguments."
                        .to_string(),
                });
            }

            Ok(ResolvedCommand::Locate(LocateParams {
                distribution,
                packages,
                rocm_version: app_config.rocm_version.clone(),
                gfx_arch: app_config.gfx_arch.clone(),
                network: app_config.network.clone(),
            }))
        }
        Command::Classify {
            config_path,
            path,
            family,
            index_path,
            dump_amd,
            dump_other,
        } => {
            let family = parse_family(&family)?;
            let (classifier, output) = match config_path {
                Some(config_path) => {
                    let app_config = load_config(&config_path)?;
                    (app_config.classifier, app_config.output)
                }
                None => (ClassifierSettings::default(), OutputConfig::default()),
            };

            let index = index_path
                .map(|index_path| read_local_index(Path::new(&index_path), family))
                .transpose()?;
            if family == PackageFamily::Rpm && index.is_none() {
                return Err(PullError::CliArgumentValidation {
                    details: "Classifying rpm packages requires --index with the repository's primary.xml."
                        .to_string(),
                });
            }

            let files = package_files(Path::new(&path), family)?;
            if files.is_empty() {
                return Err(PullError::CliArgumentValidation {
                    details: format!("No .{} files found at {}", family.extension(), path),
                });
            }

            Ok(ResolvedCommand::Classify(ClassifyParams {
                files,
                family,
                index,
                classifier,
                dump: DumpOptions {
                    amd: dump_amd || output.dump_amd,
                    other: dump_other || output.dump_other,
                },
            }))
        }
    }
}
