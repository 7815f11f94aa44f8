use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PullError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation failed: {details}")]
    ConfigValidation { details: String },

    #[error("Failed to read repository configuration file {path}: {reason}")]
    RepositoryConfigFile { path: PathBuf, reason: String },

    #[error("Invalid repository source for {distro}: {reason}")]
    RepositorySource { distro: String, reason: String },

    #[error("Unknown distribution tag {tag}")]
    UnknownDistribution { tag: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Package name error: {0}")]
    Naming(#[from] crate::naming::NamingError),

    #[error("Repository index error: {0}")]
    Index(#[from] crate::repository::IndexError),

    #[error("Output directory creation failed at {path}: {reason}")]
    OutputDirectoryCreation { path: PathBuf, reason: String },

    #[error("Failed to classify package {path}: {reason}")]
    Classification { path: PathBuf, reason: String },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("{count} distribution(s) failed: {tags}")]
    DistributionsFailed { count: usize, tags: String },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP operator error: {0}")]
    Http(#[from] opendal::Error),

    #[error("Debian packaging error: {0}")]
    DebianPackaging(#[from] debian_packaging::error::DebianError),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
