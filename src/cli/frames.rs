//! List the frames of a DDF file
use crate::error::Result;
use crate::model::{format_pc_time, format_sonar_time, format_value};
use crate::parser::ddf;
use crate::source::{self, FetchConfig, HttpFetcher, Location};
use std::io::{stdout, Write};

/// Write one tab-separated line per frame to `output`, or stdout
pub fn frames(
    input: &str,
    output: Option<std::path::PathBuf>,
    config: &FetchConfig,
) -> Result<()> {
    let stream = source::open(&Location::parse(input), &HttpFetcher::new(config))?;
    let file = ddf::File::new(stream)?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(stdout().lock()),
    };
    for frame in file {
        let frame = frame?;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            frame.index,
            format_pc_time(frame.pc_time),
            format_sonar_time(frame.sonar_time),
            format_value(frame.window.start),
            format_value(frame.window.length)
        )?;
    }
    writer.flush()?;

    Ok(())
}
