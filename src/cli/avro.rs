//! Exporting frame metadata to Avro files
use crate::error::Result;
use crate::model::format_sonar_time;
use crate::parser::ddf;
use crate::source::{self, FetchConfig, HttpFetcher, Location};
use apache_avro::{Schema, Writer};
use serde::Serialize;

const FRAME_SCHEMA: &str = r#"{"type": "record","namespace": "didson","name": "frame","fields": [{"name": "index", "type": "long"},{"name": "pc_time", "type": "long"},{"name": "sonar_time", "type": "string"},{"name": "window_start", "type": "double"},{"name": "window_length", "type": "double"}]}"#;

#[derive(Debug, Serialize)]
struct FrameRecord {
    index: i64,
    pc_time: i64,
    sonar_time: String,
    window_start: f64,
    window_length: f64,
}

/// Convert the frame metadata of a DDF file to the Avro format
///
/// Intensity payloads are not exported. This is meant to be used from the
/// command line interface:
/// ```console
/// $ didson avro <input> <output>
/// ```
pub fn avro(input: &str, output: &std::path::Path, config: &FetchConfig) -> Result<()> {
    let schema = Schema::parse_str(FRAME_SCHEMA)?;

    let stream = source::open(&Location::parse(input), &HttpFetcher::new(config))?;
    let file = ddf::File::new(stream)?;

    let g = std::fs::File::create(output)?;
    let mut writer = Writer::new(&schema, g);
    for frame in file {
        let frame = frame?;
        writer.append_ser(FrameRecord {
            index: i64::from(frame.index),
            pc_time: frame.pc_time.unix_timestamp(),
            sonar_time: format_sonar_time(frame.sonar_time),
            window_start: frame.window.start,
            window_length: frame.window.length,
        })?;
    }
    writer.flush()?;
    Ok(())
}
