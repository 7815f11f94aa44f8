use super::legacy::normalize_legacy_args;
use clap::{ArgAction, Parser, Subcommand};
use std::ffi::OsString;
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pull {
        config_path: String,
        distros: Vec<String>,
        all: bool,
        packages: Vec<String>,
        output_dir: Option<String>,
        dump_amd: bool,
        dump_other: bool,
        summary_json: Option<String>,
        distro_parallelism: Option<usize>,
    },
    Locate {
        config_path: String,
        distro: String,
        packages: Vec<String>,
    },
    Classify {
        config_path: Option<String>,
        path: String,
        family: String,
        index_path: Option<String>,
        dump_amd: bool,
        dump_other: bool,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "pkgpuller",
    version,
    author = "Nick Guletskii",
    about = "Pull GPU driver and ROCm packages for many Linux distributions and sort them by ownership"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Fetch repository indices, download the requested packages and classify them
    Pull {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "config.yaml"
        )]
        config: String,

        #[arg(
            short = 'd',
            long = "distro",
            value_name = "TAG",
            help = "Distribution tag to pull (repeat or use comma-separated values)",
            action = ArgAction::Append,
            value_delimiter = ',',
            conflicts_with = "all"
        )]
        distros: Vec<String>,

        #[arg(long = "all", help = "Pull every configured distribution")]
        all: bool,

        #[arg(
            short = 'p',
            long = "pkg",
            value_name = "NAME",
            help = "Overrides the configured package list (repeat or use comma-separated values)",
            action = ArgAction::Append,
            value_delimiter = ','
        )]
        packages: Vec<String>,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Overrides the base output directory"
        )]
        output_dir: Option<String>,

        #[arg(
            long = "dump-amd",
            help = "Copy AMD packages into packages-amd/ and packages-amdgpu/"
        )]
        dump_amd: bool,

        #[arg(long = "dump-other", help = "Copy third-party packages into packages-other/")]
        dump_other: bool,

        #[arg(
            long = "summary-json",
            value_name = "FILE",
            help = "Writes the run summary as JSON"
        )]
        summary_json: Option<String>,

        #[arg(
            long = "distro-parallelism",
            value_name = "N",
            help = "Maximum number of distributions pulled at the same time"
        )]
        distro_parallelism: Option<usize>,
    },

    /// Resolve package names against one distribution's repositories without downloading
    Locate {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "config.yaml"
        )]
        config: String,

        #[arg(short = 'd', long = "distro", value_name = "TAG", help = "Distribution tag")]
        distro: String,

        #[arg(value_name = "PACKAGE", help = "Package names (default: the configured packages)")]
        packages: Vec<String>,
    },

    /// Classify package files that are already on disk
    Classify {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Optional config file providing classifier settings"
        )]
        config: Option<String>,

        #[arg(
            long = "family",
            value_name = "FAMILY",
            help = "Package family of the files (deb or rpm)",
            default_value = "deb"
        )]
        family: String,

        #[arg(
            long = "index",
            value_name = "FILE",
            help = "Local Packages or primary.xml index (optionally gzipped) to read metadata from"
        )]
        index: Option<String>,

        #[arg(
            long = "dump-amd",
            help = "Copy AMD packages into packages-amd/ and packages-amdgpu/"
        )]
        dump_amd: bool,

        #[arg(long = "dump-other", help = "Copy third-party packages into packages-other/")]
        dump_other: bool,

        #[arg(value_name = "PATH", help = "A package file or a directory of package files")]
        path: String,
    },
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Pull {
                config,
                distros,
                all,
                packages,
                output_dir,
                dump_amd,
                dump_other,
                summary_json,
                distro_parallelism,
            } => Command::Pull {
                config_path: config,
                distros,
                all,
                packages,
                output_dir,
                dump_amd,
                dump_other,
                summary_json,
                distro_parallelism,
            },
            CliCommand::Locate {
                config,
                distro,
                packages,
            } => Command::Locate {
                config_path: config,
                distro,
                packages,
            },
            CliCommand::Classify {
                config,
                family,
                index,
                dump_amd,
                dump_other,
                path,
            } => Command::Classify {
                config_path: config,
                path,
                family,
                index_path: index,
                dump_amd,
                dump_other,
            },
        }
    }
}

/// Parses a full argument vector, program name included, after rewriting legacy bare tokens.
pub fn try_parse_command<I, T>(args: I) -> Result<(Command, u8), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let cli = Cli::try_parse_from(normalize_legacy_args(args))?;
    Ok((cli.command.into(), cli.verbose))
}

pub fn parse_args() -> Args {
    let (command, verbose) = match try_parse_command(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => e.exit(),
    };

    let log_level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let mut env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    if let Ok(directive) = "opendal=warn".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(env_filter)
        .init();

    Args { command, log_level }
}
