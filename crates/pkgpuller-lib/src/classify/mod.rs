mod metadata;
mod rules;
mod tally;

pub use metadata::{PackageMetadata, read_deb_metadata};
pub use rules::{Classification, ClassifierSettings, Ownership, RULES, Rule, classify};
pub use tally::ClassificationTally;

use crate::distro::PackageFamily;
use crate::error::PullError;
use crate::repository::IndexEntry;
use std::path::{Path, PathBuf};

/// Which classes get copied into their `packages-*` directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DumpOptions {
    pub amd: bool,
    pub other: bool,
}

impl DumpOptions {
    fn wants(self, ownership: Ownership) -> bool {
        if ownership.is_amd() {
            self.amd
        } else {
            self.other
        }
    }
}

/// Gathers the metadata of a package file on disk.
///
/// Debian archives are opened and their control member read; the repository index entry is
/// only used when the archive cannot be parsed. rpm metadata always comes from the repodata
/// entry, which is generated from the same header fields.
pub async fn resolve_metadata(
    path: &Path,
    family: PackageFamily,
    entry: Option<&IndexEntry>,
) -> Result<PackageMetadata, PullError> {
    match family {
        PackageFamily::Deb => {
            let owned_path = path.to_path_buf();
            let embedded = tokio::task::spawn_blocking(move || read_deb_metadata(&owned_path))
                .await
                .map_err(|e| PullError::Classification {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            match (embedded, entry) {
                (Ok(metadata), _) => Ok(metadata),
                (Err(e), Some(entry)) => {
                    tracing::warn!(
                        path = %path.display(),
                        "Could not read control file, using repository index metadata: {}",
                        e
                    );
                    Ok(PackageMetadata::from_index_entry(family, entry))
                }
                (Err(e), None) => Err(PullError::Classification {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }),
            }
        }
        PackageFamily::Rpm => entry
            .map(|entry| PackageMetadata::from_index_entry(family, entry))
            .ok_or_else(|| PullError::Classification {
                path: path.to_path_buf(),
                reason: "no repository metadata available for rpm package".to_string(),
            }),
    }
}

/// Copies `path` into the `packages-*` directory next to it when `dump` asks for its class.
pub fn dump_package(
    path: &Path,
    ownership: Ownership,
    dump: DumpOptions,
) -> Result<Option<PathBuf>, PullError> {
    if !dump.wants(ownership) {
        return Ok(None);
    }
    let parent = path.parent().unwrap_or(Path::new("."));
    let dump_dir = parent.join(ownership.dump_dir_name());
    std::fs::create_dir_all(&dump_dir).map_err(|e| PullError::OutputDirectoryCreation {
        path: dump_dir.clone(),
        reason: e.to_string(),
    })?;

    let file_name = path.file_name().ok_or_else(|| PullError::Classification {
        path: path.to_path_buf(),
        reason: "path has no file name".to_string(),
    })?;
    let target = dump_dir.join(file_name);
    std::fs::copy(path, &target)?;
    Ok(Some(target))
}

/// Classifies a package file, records it in `tally` and dumps it if requested.
pub async fn classify_package_file(
    path: &Path,
    family: PackageFamily,
    entry: Option<&IndexEntry>,
    settings: &ClassifierSettings,
    dump: DumpOptions,
    tally: &mut ClassificationTally,
) -> Result<Classification, PullError> {
    let metadata = resolve_metadata(path, family, entry).await?;
    let classification = classify(&metadata, settings);
    tally.record(classification.ownership);

    tracing::info!(
        package = %metadata.name,
        ownership = %classification.ownership,
        rule = classification.rule,
        "Classified package"
    );

    if let Some(target) = dump_package(path, classification.ownership, dump)? {
        tracing::debug!(target = %target.display(), "Copied package");
    }
    Ok(classification)
}
