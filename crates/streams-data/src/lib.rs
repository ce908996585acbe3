//! Data layer for the streaming-history tools.
//!
//! Reads the export archive into a [`table::StreamTable`], summarises it per
//! song and writes either table out as a snapshot, spreadsheet or JSON file.

pub mod aggregator;
pub mod export;
pub mod reader;
pub mod table;

pub use streams_core as core;
