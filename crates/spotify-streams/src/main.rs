mod bootstrap;

use std::path::{Path, PathBuf};

use anyhow::Result;
use streams_core::settings::{OutputOptions, Settings};
use streams_data::aggregator::summarize_songs;
use streams_data::export::{save_songs, save_streams};
use streams_data::reader::extract_zip_data;

fn main() -> Result<()> {
    let settings = Settings::load();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::debug!("spotify-streams v{} starting", env!("CARGO_PKG_VERSION"));
    run(&settings)?;
    Ok(())
}

/// Load the archive named in `settings` and write the enabled outputs.
///
/// Returns the files written, or `None` when the archive does not exist.
fn run(settings: &Settings) -> Result<Option<Vec<PathBuf>>> {
    let archive = &settings.archive;
    let output = settings.output_options();
    tracing::info!("{}", lookup_message(archive, &output));

    if !archive.is_file() {
        println!(
            "{} not found, please make sure this script runs in the same folder",
            archive.display()
        );
        return Ok(None);
    }

    let table = extract_zip_data(archive, &settings.load_options())?;
    let mut written = save_streams(&table, &output)?;

    if settings.songs {
        let songs = summarize_songs(&table, table.distinct_songs().as_slice())?;
        written.extend(save_songs(&songs, &output)?);
    }

    for path in &written {
        tracing::info!("Wrote {}", path.display());
    }
    Ok(Some(written))
}

/// What the run is about to do, naming only the formats that are enabled.
fn lookup_message(archive: &Path, output: &OutputOptions) -> String {
    let formats: Vec<&str> = [
        (output.save_excel, "an excel file"),
        (output.save_json, "a json file"),
        (output.save_pickle, "a pickle"),
    ]
    .into_iter()
    .filter_map(|(enabled, name)| enabled.then_some(name))
    .collect();

    if formats.is_empty() {
        format!("Looking for {}", archive.display())
    } else {
        format!(
            "Looking for {} to turn into {}",
            archive.display(),
            formats.join(" and ")
        )
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
