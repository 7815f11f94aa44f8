mod loader;
mod model;
mod shell_file;

pub use loader::load_config;
pub use model::{Config, DistributionConfig, NetworkConfig, OutputConfig, PackageRequest};
pub use shell_file::{ShellFileError, parse_shell_assignments};
