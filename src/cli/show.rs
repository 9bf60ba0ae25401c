//! Print the summary of a single DDF file
use crate::error::Result;
use crate::model::{format_duration, format_pc_time, format_sonar_time, format_value};
use crate::source::{FetchConfig, HttpFetcher, Location};
use std::io::{stdout, Write};

/// Print the summary of a DDF file
pub fn show(input: &str, config: &FetchConfig) -> Result<()> {
    let location = Location::parse(input);
    let summary = crate::summary(&location, &HttpFetcher::new(config))?;

    let mut out = stdout().lock();
    writeln!(out, "File: {}", location)?;
    writeln!(
        out,
        "PC time: {} to {}",
        format_pc_time(summary.pc_time_from),
        format_pc_time(summary.pc_time_to)
    )?;
    writeln!(
        out,
        "Sonar time: {} to {}",
        format_sonar_time(summary.sonar_time_from),
        format_sonar_time(summary.sonar_time_to)
    )?;
    writeln!(out, "Duration: {}", format_duration(summary.duration))?;
    writeln!(out, "Frame rate: {}", summary.frame_rate)?;
    writeln!(out, "Beams: {}", summary.beam_count)?;
    writeln!(out, "Samples per beam: {}", summary.samples_per_beam)?;
    writeln!(out, "Window starts:")?;
    for start in &summary.window_starts {
        writeln!(out, "\t{}", format_value(*start))?;
    }
    writeln!(out, "Window lengths:")?;
    for length in &summary.window_lengths {
        writeln!(out, "\t{}", format_value(*length))?;
    }

    Ok(())
}
