use pkgpuller_lib::cli::{
    ResolvedCommand, parse_args, resolve_command, run_classify, run_locate, run_pull,
};
use pkgpuller_lib::error::PullError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), PullError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Pull(params) => run_pull(params).await?,
        ResolvedCommand::Locate(params) => run_locate(params).await?,
        ResolvedCommand::Classify(params) => run_classify(params).await?,
    }

    Ok(())
}
