#![warn(missing_docs)]
//! A toolkit for reading DIDSON imaging sonar archives
pub mod batch;
pub mod cli;
pub mod error;
pub mod model;
pub mod parser;
pub mod source;

use error::Result;
use model::{Summary, Volume};
use source::{Fetch, Location};

/// Open `location` and summarize it
pub fn summary<F: Fetch + ?Sized>(location: &Location, fetcher: &F) -> Result<Summary> {
    parser::ddf::decode_summary(source::open(location, fetcher)?)
}

/// Open `location` and read its full intensity volume
pub fn volume<F: Fetch + ?Sized>(location: &Location, fetcher: &F) -> Result<Volume> {
    parser::ddf::decode_volume(source::open(location, fetcher)?)
}
