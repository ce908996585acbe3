use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator placed between artist and track in a song identity (en dash).
pub const SONG_SEPARATOR: &str = " – ";

/// Streams strictly longer than this many milliseconds count as a real listen.
pub const ENGAGED_STREAM_MS: i64 = 20_000;

/// Source field names and the normalised column names they are renamed to.
pub const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("master_metadata_track_name", "track"),
    ("master_metadata_album_artist_name", "artist"),
    ("master_metadata_album_album_name", "album"),
];

pub const TS_COLUMN: &str = "ts";
pub const TRACK_COLUMN: &str = "track";
pub const ARTIST_COLUMN: &str = "artist";
pub const ALBUM_COLUMN: &str = "album";
pub const MS_PLAYED_COLUMN: &str = "ms_played";
pub const SONG_COLUMN: &str = "song";

/// Map a source field name to its column name (identity for unrenamed fields).
pub fn normalize_column_name(source: &str) -> &str {
    COLUMN_RENAMES
        .iter()
        .find(|(from, _)| *from == source)
        .map(|(_, to)| *to)
        .unwrap_or(source)
}

/// Build the `artist – track` identity, or `None` when either side is null.
pub fn song_identity(artist: Option<&str>, track: Option<&str>) -> Option<String> {
    match (artist, track) {
        (Some(a), Some(t)) => Some(format!("{a}{SONG_SEPARATOR}{t}")),
        _ => None,
    }
}

// ── StreamRecord ──────────────────────────────────────────────────────────────

/// A single playback event from the streaming-history export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// When the stream ended, with the offset written in the export.
    pub ts: DateTime<FixedOffset>,
    /// Track title; absent for podcasts and other non-music content.
    pub track: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Milliseconds actually played.
    pub ms_played: i64,
    /// Derived `artist – track` identity.
    pub song: Option<String>,
    /// Every other field of the source record, untouched.
    pub extra: Map<String, Value>,
}

impl StreamRecord {
    /// Recompute [`StreamRecord::song`] from the current artist and track.
    pub fn derive_song(&mut self) {
        self.song = song_identity(self.artist.as_deref(), self.track.as_deref());
    }

    /// Whether this stream passed the 20-second engagement threshold.
    pub fn is_engaged(&self) -> bool {
        self.ms_played > ENGAGED_STREAM_MS
    }

    /// The value of `column` for this record as a [`Cell`].
    ///
    /// Unknown columns that are not present in the passthrough fields read
    /// as [`Cell::Null`].
    pub fn cell(&self, column: &str) -> Cell {
        match column {
            TS_COLUMN => Cell::Timestamp(self.ts),
            TRACK_COLUMN => Cell::from(self.track.as_deref()),
            ARTIST_COLUMN => Cell::from(self.artist.as_deref()),
            ALBUM_COLUMN => Cell::from(self.album.as_deref()),
            MS_PLAYED_COLUMN => Cell::Int(self.ms_played),
            SONG_COLUMN => Cell::from(self.song.as_deref()),
            other => self.extra.get(other).map(Cell::from).unwrap_or(Cell::Null),
        }
    }
}

// ── SongSummary ───────────────────────────────────────────────────────────────

/// Aggregated statistics for one song identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongSummary {
    /// The identity this row is indexed by.
    pub song: String,
    pub artist: Option<String>,
    pub track: Option<String>,
    /// Distinct albums the song was streamed from, in first-seen order.
    pub album: Vec<Option<String>>,
    pub number_of_streams: usize,
    pub number_of_20s_streams: usize,
    /// Every stream of the song, ascending.
    pub timestamps: Vec<DateTime<FixedOffset>>,
}

impl SongSummary {
    pub fn first_played(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamps.first().copied()
    }

    pub fn last_played(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamps.last().copied()
    }
}

// ── Cell ──────────────────────────────────────────────────────────────────────

/// One value of a table, as handed to the spreadsheet and JSON writers.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
    List(Vec<Cell>),
    /// Nested JSON (objects and arrays from passthrough fields).
    Json(Value),
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::String(s) => Cell::Text(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
            },
            other => Cell::Json(other.clone()),
        }
    }
}

impl From<Option<&str>> for Cell {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Cell::Null, |s| Cell::Text(s.to_string()))
    }
}
