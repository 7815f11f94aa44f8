pub mod classify;
pub mod cli;
pub mod config;
pub mod distro;
pub mod download;
pub mod driver;
pub mod error;
pub mod http;
pub mod naming;
pub mod output;
pub mod repository;
pub mod verification;

pub use config::Config;
pub use error::PullError;
