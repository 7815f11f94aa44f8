use super::apt::parse_packages_index;
use super::rpm::{parse_primary, primary_location};
use super::types::{IndexError, RepositoryIndex};
use crate::distro::{PackageFamily, RepositorySource};
use crate::error::PullError;
use crate::http::is_not_found;
use flate2::read::GzDecoder;
use opendal::Operator;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Temporary index documents written next to the downloaded packages. Removed on drop so they
/// never end up in the package set handed to the installer assembler.
#[derive(Debug, Default)]
pub struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    fn write(&mut self, path: PathBuf, content: &str) -> Result<(), PullError> {
        std::fs::write(&path, content)?;
        self.paths.push(path);
        Ok(())
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), "Failed to remove index file: {}", e);
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct FetchedIndex {
    pub index: RepositoryIndex,
    /// Dropped once package resolution is done.
    pub scratch: ScratchFiles,
}

#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(FetchedIndex),
    /// The top-level index document could not be retrieved: the repository does not exist
    /// for this release.
    Unavailable { url: String, reason: String },
}

fn gunzip(document: &str, bytes: &[u8]) -> Result<String, IndexError> {
    let mut content = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut content)
        .map_err(|e| IndexError::Decompress {
            document: document.to_string(),
            reason: e.to_string(),
        })?;
    Ok(content)
}

fn utf8(document: &str, bytes: Vec<u8>) -> Result<String, IndexError> {
    String::from_utf8(bytes).map_err(|e| IndexError::Decompress {
        document: document.to_string(),
        reason: e.to_string(),
    })
}

/// Downloads and decodes the package index of `source`, staging the decoded documents in
/// `scratch_dir`.
pub async fn fetch_index(
    op: &Operator,
    source: &RepositorySource,
    scratch_dir: &Path,
) -> Result<FetchOutcome, PullError> {
    let top_level = source.top_level_index_path();
    let url = format!("{}/{}", source.base_url(), top_level);
    tracing::debug!(url = %url, "Fetching repository index");

    let top_level_bytes = match op.read(&top_level).await {
        Ok(buffer) => buffer.to_vec(),
        Err(e) => {
            let reason = if is_not_found(&e) {
                "not found".to_string()
            } else {
                e.to_string()
            };
            tracing::warn!(url = %url, "Repository index unavailable: {}", reason);
            return Ok(FetchOutcome::Unavailable { url, reason });
        }
    };

    std::fs::create_dir_all(scratch_dir).map_err(|e| PullError::OutputDirectoryCreation {
        path: scratch_dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut scratch = ScratchFiles::default();

    let index = match source {
        RepositorySource::Apt { .. } => {
            let packages = gunzip(&url, &top_level_bytes)?;
            scratch.write(scratch_dir.join("Packages"), &packages)?;
            parse_packages_index(&packages)?
        }
        RepositorySource::Rpm { base_url } => {
            let repomd = utf8(&url, top_level_bytes)?;
            scratch.write(scratch_dir.join("repomd.xml"), &repomd)?;

            let primary_href = primary_location(&repomd)?;
            let primary_url = format!("{base_url}/{primary_href}");
            tracing::debug!(url = %primary_url, "Fetching primary metadata");

            let primary_bytes = op
                .read(&primary_href)
                .await
                .map_err(|e| IndexError::Fetch {
                    document: primary_url.clone(),
                    reason: e.to_string(),
                })?
                .to_vec();
            let primary = if primary_href.ends_with(".gz") {
                gunzip(&primary_url, &primary_bytes)?
            } else {
                utf8(&primary_url, primary_bytes)?
            };
            scratch.write(scratch_dir.join("primary.xml"), &primary)?;
            parse_primary(&primary)?
        }
    };

    tracing::info!(
        url = %url,
        packages = index.entries.len(),
        "Loaded repository index"
    );
    Ok(FetchOutcome::Fetched(FetchedIndex { index, scratch }))
}

/// Parses an index document already on disk, `Packages` for deb and `primary.xml` for rpm.
/// Files ending in `.gz` are decompressed first.
pub fn read_local_index(path: &Path, family: PackageFamily) -> Result<RepositoryIndex, PullError> {
    let document = path.display().to_string();
    let bytes = std::fs::read(path)?;
    let content = if document.ends_with(".gz") {
        gunzip(&document, &bytes)?
    } else {
        utf8(&document, bytes)?
    };
    let index = match family {
        PackageFamily::Deb => parse_packages_index(&content)?,
        PackageFamily::Rpm => parse_primary(&content)?,
    };
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_files_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Packages");
        {
            let mut scratch = ScratchFiles::default();
            scratch.write(path.clone(), "Package: x\n").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_gunzip_rejects_plain_text() {
        assert!(matches!(
            gunzip("Packages.gz", b"Package: x\n"),
            Err(IndexError::Decompress { .. })
        ));
    }

    #[test]
    fn test_read_local_packages_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Packages");
        std::fs::write(
            &path,
            "Package: rocm-core\nVersion: 7.11.0\nArchitecture: amd64\nFilename: pool/main/r/rocm-core_7.11.0_amd64.deb\nSize: 4\n",
        )
        .unwrap();

        let index = read_local_index(&path, PackageFamily::Deb).unwrap();
        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.entries[0].name, "rocm-core");
    }
}
