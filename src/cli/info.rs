//! Summarize a batch of DDF files into a ledger
use crate::batch::{self, Inputs, Ledger};
use crate::error::Result;
use crate::source::{FetchConfig, HttpFetcher};
use std::path::Path;

/// Summarize every file described by `input` into the ledger at `output`
///
/// ```console
/// $ didson info "archive/*.ddf" -o DIDSON_info.csv
/// ```
pub fn info(input: &str, output: &Path, config: &FetchConfig) -> Result<()> {
    let inputs = Inputs::collect(input, &config.base_url)?;
    let (mut ledger, resume) = Ledger::open(output, inputs.grouped)?;
    let fetcher = HttpFetcher::new(config);

    let report = batch::run(&inputs, &mut ledger, resume, &fetcher)?;
    log::info!(
        "{} summarized, {} failed, {} already in {}",
        report.succeeded,
        report.failed,
        report.skipped,
        output.display()
    );
    Ok(())
}
