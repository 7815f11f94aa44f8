mod args;
mod classify;
mod legacy;
mod locate;
mod params;
mod pull;
mod resolved_command;

pub use args::{Args, Command, parse_args, try_parse_command};
pub use classify::run_classify;
pub use legacy::normalize_legacy_args;
pub use locate::run_locate;
pub use params::{ClassifyParams, LocateParams, PullParams};
pub use pull::run_pull;
pub use resolved_command::{ResolvedCommand, resolve_command};
