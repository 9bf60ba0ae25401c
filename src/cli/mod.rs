//! The `didson` command-line interface
use crate::error::Result;
use crate::source::FetchConfig;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "didson", version, about = "Read DIDSON imaging sonar (DDF) files", long_about = None)]
pub struct Args {
    /// The subcommand to run
    #[command(subcommand)]
    pub cmd: Action,
    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
    /// Report per-file details
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Prefix turning file names from a CSV input into download URLs
    #[arg(long, global = true, env = "DIDSON_BASE_URL", default_value = FetchConfig::DEFAULT_BASE_URL)]
    pub base_url: String,
    /// Download timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    pub timeout: u64,
}

impl Args {
    /// The log level selected by `--quiet` and `--verbose`
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Error
        } else if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }

    /// Settings for fetching remote files
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            base_url: self.base_url.clone(),
            timeout: std::time::Duration::from_secs(self.timeout),
        }
    }
}

/// The available subcommands
#[derive(clap::Subcommand, Debug)]
pub enum Action {
    /// Summarize DDF files into a CSV ledger, resuming if it exists
    Info {
        /// A DDF file, a directory, a wildcard path or a CSV with a `filename` column
        input: String,
        #[arg(short, long, default_value = "DIDSON_info.csv")]
        output: PathBuf,
    },
    /// Print the summary of one DDF file
    Show {
        /// A DDF file path or URL
        input: String,
    },
    /// List the metadata of every frame
    Frames {
        /// A DDF file path or URL
        input: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the metadata of every frame to an Avro file
    Avro {
        /// A DDF file path or URL
        input: String,
        output: PathBuf,
    },
}

/// Run the subcommand selected by `args`
pub fn run(args: Args) -> Result<()> {
    let config = args.fetch_config();
    match args.cmd {
        Action::Info { input, output } => {
            info::info(&input, &output, &config)?;
        }
        Action::Show { input } => {
            show::show(&input, &config)?;
        }
        Action::Frames { input, output } => {
            frames::frames(&input, output, &config)?;
        }
        Action::Avro { input, output } => {
            avro::avro(&input, &output, &config)?;
        }
    };
    Ok(())
}

pub mod avro;
pub mod frames;
pub mod info;
pub mod show;
