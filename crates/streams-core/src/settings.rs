use clap::Parser;
use std::path::{Path, PathBuf};

use crate::text::TitleCaseMode;

/// Archive name looked up in the working directory when none is given.
pub const DEFAULT_ARCHIVE: &str = "my_spotify_data.zip";

/// Substring that marks an archive member as a streaming-history log.
pub const EVENT_LOG_MARKER: &str = "endsong";

pub const PICKLE_FOLDER: &str = "pickle";
pub const EXCEL_FOLDER: &str = "excel";
pub const JSON_FOLDER: &str = "json";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Turn a Spotify streaming-history export into a spreadsheet
#[derive(Parser, Debug, Clone)]
#[command(
    name = "spotify-streams",
    about = "Turn a Spotify streaming-history export into a spreadsheet",
    version
)]
pub struct Settings {
    /// Export archive to read
    #[arg(long, env = "SPOTIFY_STREAMS_ARCHIVE", default_value = DEFAULT_ARCHIVE)]
    pub archive: PathBuf,

    /// Directory the pickle/, excel/ and json/ folders are created in
    #[arg(long, env = "SPOTIFY_STREAMS_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Also write the binary snapshot (pickle/streams.pkl)
    #[arg(long)]
    pub pickle: bool,

    /// Skip the spreadsheet (excel/streams.xlsx)
    #[arg(long)]
    pub no_excel: bool,

    /// Also write the JSON document (json/streams.json)
    #[arg(long)]
    pub json: bool,

    /// Title-casing strategy for track names
    #[arg(long, value_enum, default_value_t = TitleCaseMode::Smart)]
    pub titles: TitleCaseMode,

    /// Keep track names exactly as exported
    #[arg(long)]
    pub keep_track_names: bool,

    /// Also build the per-song summary for every distinct song
    #[arg(long)]
    pub songs: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            clean_track_names: !self.keep_track_names,
            titles: self.titles,
        }
    }

    /// Output flags for the command line: spreadsheet on, snapshot off.
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            output_dir: self.output_dir.clone(),
            save_pickle: self.pickle,
            save_excel: !self.no_excel,
            save_json: self.json,
        }
    }
}

// ── LoadOptions ────────────────────────────────────────────────────────────────

/// How the loader normalises what it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Title-case track names.
    pub clean_track_names: bool,
    pub titles: TitleCaseMode,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            clean_track_names: true,
            titles: TitleCaseMode::default(),
        }
    }
}

// ── OutputOptions ──────────────────────────────────────────────────────────────

/// Which output formats to write, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub output_dir: PathBuf,
    pub save_pickle: bool,
    pub save_excel: bool,
    pub save_json: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            save_pickle: true,
            save_excel: false,
            save_json: false,
        }
    }
}

impl OutputOptions {
    /// Options that write nothing, rooted at `output_dir`.
    pub fn none(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            save_pickle: false,
            save_excel: false,
            save_json: false,
        }
    }

    pub fn pickle_dir(&self) -> PathBuf {
        self.output_dir.join(PICKLE_FOLDER)
    }

    pub fn excel_dir(&self) -> PathBuf {
        self.output_dir.join(EXCEL_FOLDER)
    }

    pub fn json_dir(&self) -> PathBuf {
        self.output_dir.join(JSON_FOLDER)
    }

    pub fn root(&self) -> &Path {
        &self.output_dir
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
