//! In-memory tables of streams and song summaries.
//!
//! [`StreamTable`] holds every playback event in timestamp order and exposes
//! it column by column; [`SongTable`] holds one [`SongSummary`] per song.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use streams_core::error::{Result, StreamsError};
use streams_core::models::{
    normalize_column_name, Cell, SongSummary, StreamRecord, ALBUM_COLUMN, ARTIST_COLUMN,
    MS_PLAYED_COLUMN, SONG_COLUMN, TRACK_COLUMN, TS_COLUMN,
};
use streams_core::settings::LoadOptions;
use streams_core::text::TitleCaser;
use streams_core::timestamps::TimestampProcessor;

/// Member name reported for records handed to [`StreamTable::from_raw`].
pub const IN_MEMORY_MEMBER: &str = "<memory>";

// ── Tabular ───────────────────────────────────────────────────────────────────

/// Row/column view shared by the spreadsheet and JSON writers.
pub trait Tabular {
    fn column_names(&self) -> Vec<String>;
    fn row_count(&self) -> usize;
    /// Cells of row `index`, one per column, in column order.
    fn row(&self, index: usize) -> Vec<Cell>;
}

// ── RawMember ─────────────────────────────────────────────────────────────────

/// The parsed JSON array of one event-log member of the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMember {
    pub name: String,
    pub records: Vec<Value>,
}

// ── StreamTable ───────────────────────────────────────────────────────────────

/// Every stream of the export, sorted ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamTable {
    columns: Vec<String>,
    rows: Vec<StreamRecord>,
}

impl StreamTable {
    /// Build the table from raw member contents.
    ///
    /// Source fields are renamed, rows are sorted by timestamp (ties keep
    /// archive order), track names are title-cased when
    /// `options.clean_track_names` is set and the `song` identity is derived.
    pub fn from_members(members: Vec<RawMember>, options: &LoadOptions) -> Result<Self> {
        if options.clean_track_names {
            let caser = options.titles.caser();
            Self::build(members, Some(caser.as_ref()))
        } else {
            Self::build(members, None)
        }
    }

    /// Build the table from records already in memory, title-casing tracks
    /// with `caser`.
    pub fn from_raw(records: Vec<Value>, caser: &dyn TitleCaser) -> Result<Self> {
        let member = RawMember {
            name: IN_MEMORY_MEMBER.to_string(),
            records,
        };
        Self::build(vec![member], Some(caser))
    }

    fn build(members: Vec<RawMember>, caser: Option<&dyn TitleCaser>) -> Result<Self> {
        let total: usize = members.iter().map(|m| m.records.len()).sum();
        let mut columns: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut rows: Vec<StreamRecord> = Vec::with_capacity(total);

        for member in members {
            for (index, value) in member.records.into_iter().enumerate() {
                let invalid = |reason: String| StreamsError::InvalidRecord {
                    member: member.name.clone(),
                    index,
                    reason,
                };
                let Value::Object(object) = value else {
                    return Err(invalid("not a JSON object".to_string()));
                };
                for key in object.keys() {
                    let column = normalize_column_name(key);
                    if seen.insert(column.to_string()) {
                        columns.push(column.to_string());
                    }
                }
                rows.push(record_from_object(object).map_err(invalid)?);
            }
        }

        rows.sort_by_key(|r| r.ts);

        if let Some(caser) = caser {
            for row in &mut rows {
                row.track = caser.title_case_opt(row.track.as_deref());
            }
        }

        for row in &mut rows {
            row.derive_song();
        }

        if !rows.is_empty() && seen.insert(SONG_COLUMN.to_string()) {
            columns.push(SONG_COLUMN.to_string());
        }

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[StreamRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamRecord> {
        self.rows.iter()
    }

    /// The full column `name`, or `None` when the table has no such column.
    pub fn column(&self, name: &str) -> Option<Vec<Cell>> {
        if !self.columns.iter().any(|c| c == name) {
            return None;
        }
        Some(self.rows.iter().map(|r| r.cell(name)).collect())
    }

    pub fn timestamps(&self) -> Vec<DateTime<FixedOffset>> {
        self.rows.iter().map(|r| r.ts).collect()
    }

    pub fn songs(&self) -> Vec<Option<&str>> {
        self.rows.iter().map(|r| r.song.as_deref()).collect()
    }

    /// Distinct song identities in order of first appearance.
    pub fn distinct_songs(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.rows
            .iter()
            .filter_map(|r| r.song.as_deref())
            .filter(|s| seen.insert(*s))
            .map(str::to_string)
            .collect()
    }

    /// Song identities with their stream counts, most streamed first.
    ///
    /// Songs with equal counts keep their first-appearance order.
    pub fn songs_by_stream_count(&self) -> Vec<(String, usize)> {
        let index = self.rows_by_song();
        let mut counts: Vec<(String, usize)> = self
            .distinct_songs()
            .into_iter()
            .map(|song| {
                let count = index.get(song.as_str()).map_or(0, Vec::len);
                (song, count)
            })
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Row indices of every song, each list ascending.
    pub fn rows_by_song(&self) -> HashMap<&str, Vec<usize>> {
        let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            if let Some(song) = row.song.as_deref() {
                index.entry(song).or_default().push(i);
            }
        }
        index
    }
}

impl Tabular for StreamTable {
    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, index: usize) -> Vec<Cell> {
        let record = &self.rows[index];
        self.columns.iter().map(|c| record.cell(c)).collect()
    }
}

/// Turn one source object into a record, renaming the metadata fields.
///
/// Returns the reason as text so the caller can attach member and index.
fn record_from_object(mut object: Map<String, Value>) -> std::result::Result<StreamRecord, String> {
    let ts_value = object
        .remove(TS_COLUMN)
        .ok_or_else(|| format!("missing \"{TS_COLUMN}\""))?;
    let ts = TimestampProcessor::parse(&ts_value).map_err(|e| e.to_string())?;

    let ms_played = match object.remove(MS_PLAYED_COLUMN) {
        Some(v) => played_millis(&v)
            .ok_or_else(|| format!("\"{MS_PLAYED_COLUMN}\" is not a whole number: {v}"))?,
        None => return Err(format!("missing \"{MS_PLAYED_COLUMN}\"")),
    };

    let track = take_text(&mut object, "master_metadata_track_name", TRACK_COLUMN);
    let artist = take_text(&mut object, "master_metadata_album_artist_name", ARTIST_COLUMN);
    let album = take_text(&mut object, "master_metadata_album_album_name", ALBUM_COLUMN);

    Ok(StreamRecord {
        ts,
        track,
        artist,
        album,
        ms_played,
        song: None,
        extra: object,
    })
}

/// Integers, and floats with no fractional part (`25000.0`).
fn played_millis(value: &Value) -> Option<i64> {
    if let Some(ms) = value.as_i64() {
        return Some(ms);
    }
    let ms = value.as_f64()?;
    if ms.fract() == 0.0 && ms >= i64::MIN as f64 && ms < i64::MAX as f64 {
        Some(ms as i64)
    } else {
        None
    }
}

/// Remove a text field under its source name (or its already-normalised
/// name). Null and missing both read as `None`.
fn take_text(object: &mut Map<String, Value>, source: &str, normalized: &str) -> Option<String> {
    let value = object
        .remove(source)
        .or_else(|| object.remove(normalized))?;
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

// ── SongTable ─────────────────────────────────────────────────────────────────

pub const SONG_TABLE_COLUMNS: &[&str] = &[
    "song",
    "artist",
    "track",
    "album",
    "number_of_streams",
    "number_of_20s_streams",
    "first_played",
    "last_played",
    "timestamps",
];

/// Song summaries indexed by song identity, in the order they were requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongTable {
    rows: Vec<SongSummary>,
}

impl SongTable {
    pub fn new(rows: Vec<SongSummary>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SongSummary] {
        &self.rows
    }

    /// The index column.
    pub fn index(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.song.as_str()).collect()
    }

    /// First summary for `song`.
    pub fn get(&self, song: &str) -> Option<&SongSummary> {
        self.rows.iter().find(|r| r.song == song)
    }
}

impl Tabular for SongTable {
    fn column_names(&self) -> Vec<String> {
        SONG_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, index: usize) -> Vec<Cell> {
        let s = &self.rows[index];
        vec![
            Cell::Text(s.song.clone()),
            Cell::from(s.artist.as_deref()),
            Cell::from(s.track.as_deref()),
            Cell::List(s.album.iter().map(|a| Cell::from(a.as_deref())).collect()),
            Cell::Int(s.number_of_streams as i64),
            Cell::Int(s.number_of_20s_streams as i64),
            s.first_played().map_or(Cell::Null, Cell::Timestamp),
            s.last_played().map_or(Cell::Null, Cell::Timestamp),
            Cell::List(s.timestamps.iter().copied().map(Cell::Timestamp).collect()),
        ]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use streams_core::text::{PlainTitleCase, TitleCaseMode};

    pub(crate) fn stream(ts: &str, artist: Option<&str>, track: Option<&str>, album: Option<&str>, ms: i64) -> Value {
        json!({
            "ts": ts,
            "username": "listener",
            "platform": "Android OS",
            "ms_played": ms,
            "master_metadata_track_name": track,
            "master_metadata_album_artist_name": artist,
            "master_metadata_album_album_name": album,
            "shuffle": false,
        })
    }

    pub(crate) fn plain() -> LoadOptions {
        LoadOptions {
            clean_track_names: true,
            titles: TitleCaseMode::Plain,
        }
    }

    pub(crate) fn member(name: &str, records: Vec<Value>) -> RawMember {
        RawMember {
            name: name.to_string(),
            records,
        }
    }

    #[test]
    fn test_from_members_renames_and_orders_columns() {
        let table = StreamTable::from_members(
            vec![member(
                "endsong_0.json",
                vec![stream("2021-01-01T00:00:00Z", Some("Artist"), Some("song a"), Some("Album"), 25_000)],
            )],
            &plain(),
        )
        .unwrap();

        assert_eq!(
            table.columns(),
            &[
                "ts", "username", "platform", "ms_played", "track", "artist", "album", "shuffle",
                "song"
            ]
        );
        assert_eq!(table.rows()[0].extra.len(), 3);
        assert!(table.rows()[0].extra.contains_key("platform"));
    }

    #[test]
    fn test_from_members_concatenates_and_sorts() {
        let table = StreamTable::from_members(
            vec![
                member(
                    "endsong_0.json",
                    vec![
                        stream("2021-03-01T00:00:00Z", Some("B"), Some("b"), None, 1),
                        stream("2021-01-01T00:00:00Z", Some("A"), Some("a"), None, 2),
                    ],
                ),
                member(
                    "endsong_1.json",
                    vec![stream("2021-02-01T00:00:00Z", Some("C"), Some("c"), None, 3)],
                ),
            ],
            &plain(),
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        let ts = table.timestamps();
        assert!(ts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(table.rows()[0].ms_played, 2);
        assert_eq!(table.rows()[1].ms_played, 3);
    }

    #[test]
    fn test_sort_compares_instants_across_offsets() {
        let table = StreamTable::from_members(
            vec![member(
                "endsong_0.json",
                vec![
                    // 10:00 UTC
                    stream("2021-01-01T12:00:00+02:00", Some("A"), Some("a"), None, 1),
                    // 09:00 UTC
                    stream("2021-01-01T09:00:00Z", Some("B"), Some("b"), None, 2),
                ],
            )],
            &plain(),
        )
        .unwrap();

        assert_eq!(table.rows()[0].ms_played, 2);
        assert_eq!(table.rows()[1].ts.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_equal_timestamps_keep_archive_order() {
        let table = StreamTable::from_members(
            vec![member(
                "endsong_0.json",
                vec![
                    stream("2021-01-01T00:00:00Z", Some("A"), Some("first"), None, 1),
                    stream("2021-01-01T00:00:00Z", Some("A"), Some("second"), None, 2),
                ],
            )],
            &plain(),
        )
        .unwrap();
        assert_eq!(table.rows()[0].ms_played, 1);
        assert_eq!(table.rows()[1].ms_played, 2);
    }

    #[test]
    fn test_song_derivation_and_null_tracks() {
        let table = StreamTable::from_members(
            vec![member(
                "endsong_0.json",
                vec![
                    stream("2021-01-01T00:00:00Z", Some("Artist"), Some("song a"), Some("Album"), 1),
                    stream("2021-01-02T00:00:00Z", None, None, None, 2),
                ],
            )],
            &plain(),
        )
        .unwrap();

        assert_eq!(table.songs(), vec![Some("Artist – Song A"), None]);
        assert_eq!(table.rows()[1].track, None);
    }

    #[test]
    fn test_keep_track_names() {
        let options = LoadOptions {
            clean_track_names: false,
            titles: TitleCaseMode::Plain,
        };
        let table = StreamTable::from_members(
            vec![member(
                "endsong_0.json",
                vec![stream("2021-01-01T00:00:00Z", Some("Artist"), Some("song a"), None, 1)],
            )],
            &options,
        )
        .unwrap();
        assert_eq!(table.rows()[0].track.as_deref(), Some("song a"));
        assert_eq!(table.rows()[0].song.as_deref(), Some("Artist – song a"));
    }

    #[test]
    fn test_empty_members_give_empty_table() {
        let table = StreamTable::from_members(vec![member("endsong_0.json", vec![])], &plain()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
        assert!(table.column("song").is_none());
    }

    #[test]
    fn test_invalid_records_fail_fast() {
        let not_object = StreamTable::from_members(
            vec![member("endsong_0.json", vec![json!([1, 2])])],
            &plain(),
        );
        assert!(matches!(
            not_object,
            Err(StreamsError::InvalidRecord { index: 0, .. })
        ));

        let bad_ts = StreamTable::from_members(
            vec![member(
                "endsong_3.json",
                vec![
                    stream("2021-01-01T00:00:00Z", None, None, None, 1),
                    json!({"ts": "never", "ms_played": 1}),
                ],
            )],
            &plain(),
        )
        .unwrap_err();
        match bad_ts {
            StreamsError::InvalidRecord { member, index, .. } => {
                assert_eq!(member, "endsong_3.json");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        let missing_ms = StreamTable::from_members(
            vec![member("endsong_0.json", vec![json!({"ts": "2021-01-01T00:00:00Z"})])],
            &plain(),
        );
        assert!(missing_ms.is_err());
    }

    #[test]
    fn test_from_raw_builds_sorted_table() {
        let table = StreamTable::from_raw(
            vec![
                stream("2021-01-02T00:00:00Z", Some("B"), Some("second song"), None, 1),
                stream("2021-01-01T00:00:00Z", Some("A"), Some("first song"), None, 2),
            ],
            &PlainTitleCase,
        )
        .unwrap();

        assert_eq!(table.songs(), vec![Some("A – First Song"), Some("B – Second Song")]);
        assert_eq!(table.columns().last().map(String::as_str), Some("song"));
    }

    #[test]
    fn test_from_raw_reports_in_memory_member() {
        let err = StreamTable::from_raw(vec![json!("not a record")], &PlainTitleCase).unwrap_err();
        match err {
            StreamsError::InvalidRecord { member, index, .. } => {
                assert_eq!(member, IN_MEMORY_MEMBER);
                assert_eq!(index, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_whole_float_ms_played_is_accepted() {
        let table = StreamTable::from_raw(
            vec![json!({"ts": "2021-01-01T00:00:00Z", "ms_played": 25000.0})],
            &PlainTitleCase,
        )
        .unwrap();
        assert_eq!(table.rows()[0].ms_played, 25_000);
        assert!(table.rows()[0].is_engaged());

        let fractional = StreamTable::from_raw(
            vec![json!({"ts": "2021-01-01T00:00:00Z", "ms_played": 1.5})],
            &PlainTitleCase,
        );
        assert!(matches!(fractional, Err(StreamsError::InvalidRecord { .. })));
    }

    #[test]
    fn test_column_access() {
        let table = StreamTable::from_members(
            vec![member(
                "endsong_0.json",
                vec![
                    stream("2021-01-01T00:00:00Z", Some("A"), Some("x"), Some("One"), 10),
                    stream("2021-01-02T00:00:00Z", Some("B"), Some("y"), None, 20),
                ],
            )],
            &plain(),
        )
        .unwrap();

        assert_eq!(
            table.column("album").unwrap(),
            vec![Cell::Text("One".to_string()), Cell::Null]
        );
        assert_eq!(
            table.column("ms_played").unwrap(),
            vec![Cell::Int(10), Cell::Int(20)]
        );
        assert_eq!(
            table.column("platform").unwrap()[0],
            Cell::Text("Android OS".to_string())
        );
        assert!(table.column("nope").is_none());
        assert_eq!(table.row(0).len(), table.column_names().len());
    }

    #[test]
    fn test_distinct_and_ranked_songs() {
        let table = StreamTable::from_members(
            vec![member(
                "endsong_0.json",
                vec![
                    stream("2021-01-01T00:00:00Z", Some("A"), Some("x"), None, 1),
                    stream("2021-01-02T00:00:00Z", Some("B"), Some("y"), None, 1),
                    stream("2021-01-03T00:00:00Z", Some("B"), Some("y"), None, 1),
                    stream("2021-01-04T00:00:00Z", None, None, None, 1),
                    stream("2021-01-05T00:00:00Z", Some("C"), Some("z"), None, 1),
                ],
            )],
            &plain(),
        )
        .unwrap();

        assert_eq!(table.distinct_songs(), vec!["A – X", "B – Y", "C – Z"]);
        assert_eq!(
            table.songs_by_stream_count(),
            vec![
                ("B – Y".to_string(), 2),
                ("A – X".to_string(), 1),
                ("C – Z".to_string(), 1)
            ]
        );
        assert_eq!(table.rows_by_song()["B – Y"], vec![1, 2]);
    }

    #[test]
    fn test_song_table_rows() {
        let ts = DateTime::parse_from_rfc3339("2021-01-01T00:00:00Z").unwrap();
        let songs = SongTable::new(vec![SongSummary {
            song: "A – X".to_string(),
            artist: Some("A".to_string()),
            track: Some("X".to_string()),
            album: vec![Some("One".to_string()), None],
            number_of_streams: 1,
            number_of_20s_streams: 0,
            timestamps: vec![ts],
        }]);

        assert_eq!(songs.index(), vec!["A – X"]);
        assert!(songs.get("A – X").is_some());
        assert!(songs.get("B – Y").is_none());
        let row = songs.row(0);
        assert_eq!(row.len(), songs.column_names().len());
        assert_eq!(row[4], Cell::Int(1));
        assert_eq!(row[6], Cell::Timestamp(ts));
    }
}
