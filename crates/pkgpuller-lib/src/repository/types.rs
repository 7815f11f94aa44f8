use crate::distro::PackageFamily;
use crate::verification::Checksum;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("malformed APT Packages index: {0}")]
    AptControl(#[from] debian_packaging::error::DebianError),
    #[error("malformed {document}: {reason}")]
    Xml {
        document: &'static str,
        reason: String,
    },
    #[error("repomd.xml has no primary metadata entry")]
    MissingPrimary,
    #[error("failed to decompress {document}: {reason}")]
    Decompress {
        document: String,
        reason: String,
    },
    #[error("failed to fetch {document}: {reason}")]
    Fetch { document: String, reason: String },
}

/// One package record of a repository index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    /// Path of the artifact relative to the repository base URL.
    pub location: String,
    pub size: Option<u64>,
    pub checksum: Option<Checksum>,
    /// `Maintainer` for deb, `<packager>` for rpm.
    pub maintainer: Option<String>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub epoch: Option<String>,
}

impl IndexEntry {
    /// Remote file name the artifact is stored under locally.
    pub fn file_name(&self) -> &str {
        self.location
            .rsplit('/')
            .next()
            .unwrap_or(self.location.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct RepositoryIndex {
    pub family: PackageFamily,
    pub entries: Vec<IndexEntry>,
}

impl RepositoryIndex {
    /// Resolves `requested` to an index entry.
    ///
    /// An entry matches when its name equals `requested` or starts with it, which lets callers
    /// ask for the base name of a version- or architecture-suffixed package. An exact match
    /// anywhere in the index wins; otherwise the first prefix match in document order is used.
    pub fn locate(&self, requested: &str) -> Option<&IndexEntry> {
        if requested.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.name == requested)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|entry| entry.name.starts_with(requested))
            })
    }
}
