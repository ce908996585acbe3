//! Zip archive loading for streaming-history exports.
//!
//! Reads every `endsong` member of the export, concatenates the JSON arrays
//! they hold and turns the result into a [`StreamTable`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;
use streams_core::error::{Result, StreamsError};
use streams_core::settings::{LoadOptions, EVENT_LOG_MARKER};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::table::{RawMember, StreamTable};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a streaming-history export into a [`StreamTable`].
///
/// An archive without any event-log member yields an empty table.
pub fn extract_zip_data(zip_file_path: &Path, options: &LoadOptions) -> Result<StreamTable> {
    info!("Looking for files...");
    let members = load_records(zip_file_path)?;
    info!("Found {} files", members.len());

    info!("Making table...");
    let table = StreamTable::from_members(members, options)?;
    info!("...table complete ({} streams)", table.len());

    Ok(table)
}

/// Read and parse every event-log member, in archive order.
///
/// Members whose name does not contain [`EVENT_LOG_MARKER`] are skipped
/// without being read.
pub fn load_records(zip_file_path: &Path) -> Result<Vec<RawMember>> {
    let file = File::open(zip_file_path).map_err(|source| StreamsError::FileRead {
        path: zip_file_path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let mut members: Vec<RawMember> = Vec::new();
    for index in 0..archive.len() {
        let name = match archive.name_for_index(index) {
            Some(name) if is_event_log(name) => name.to_string(),
            _ => continue,
        };

        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let mut bytes = Vec::with_capacity(initial_capacity(entry.size()));
        entry.read_to_end(&mut bytes)?;
        let records = parse_member(&name, bytes)?;

        debug!("Member {}: {} records", name, records.len());
        members.push(RawMember { name, records });
    }

    Ok(members)
}

/// Whether an archive member holds streaming-history events.
pub fn is_event_log(member_name: &str) -> bool {
    member_name.contains(EVENT_LOG_MARKER)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Upper bound on the buffer reserved up front from a member's declared size.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Buffer size to reserve for a member; the header size is not trusted.
fn initial_capacity(declared_size: u64) -> usize {
    usize::try_from(declared_size.min(MAX_PREALLOC)).unwrap_or(0)
}

/// Decode a member as UTF-8 and parse it as a JSON array.
fn parse_member(name: &str, bytes: Vec<u8>) -> Result<Vec<Value>> {
    let text = String::from_utf8(bytes).map_err(|source| StreamsError::MemberEncoding {
        member: name.to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
