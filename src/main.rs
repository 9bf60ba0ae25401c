use clap::Parser;
use didson::cli::{self, Args};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .format_target(false)
        .format_timestamp_secs()
        .init();

    cli::run(args).inspect_err(|e| log::error!("{}", e))?;
    Ok(())
}
