#[allow(clippy::module_inception)]
mod download;
mod types;

pub use download::download_package;
pub use types::{DownloadItem, DownloadStatus};
