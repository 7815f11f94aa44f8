use crate::verification::Checksum;
use std::path::PathBuf;

/// A located package ready to be fetched from its repository.
#[derive(Clone, Debug)]
pub struct DownloadItem {
    /// Name the caller asked for, which may be a prefix of the package's real name.
    pub requested: String,
    pub package: String,
    /// Path relative to the repository base URL.
    pub rel_path: String,
    pub size: Option<u64>,
    pub checksum: Option<Checksum>,
    pub output_path: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded,
    /// The file on disk already matched the advertised checksum.
    AlreadyPresent,
}
