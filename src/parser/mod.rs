//! Parsers for sonar file formats
pub mod ddf;
