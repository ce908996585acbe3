//! Per-song aggregation of a [`StreamTable`].
//!
//! Groups streams by song identity and builds one [`SongSummary`] per
//! requested song, reporting progress on a time-throttled schedule.

use std::collections::HashMap;
use std::time::Duration;

use streams_core::error::{Result, StreamsError};
use streams_core::models::SongSummary;
use streams_core::progress::{
    Clock, ProgressEvent, ProgressReporter, ProgressThrottle, SystemClock, TracingProgress,
    DEFAULT_PROGRESS_INTERVAL,
};

use crate::table::{SongTable, StreamTable};

// ── SongAggregator ────────────────────────────────────────────────────────────

/// Builds song summaries from a stream table.
///
/// The clock and reporter are injectable; the defaults log through
/// `tracing` at most once per minute of wall-clock time.
pub struct SongAggregator<C: Clock = SystemClock, R: ProgressReporter = TracingProgress> {
    clock: C,
    reporter: R,
    interval: Duration,
}

impl SongAggregator {
    pub fn new() -> Self {
        Self {
            clock: SystemClock,
            reporter: TracingProgress,
            interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl Default for SongAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, R: ProgressReporter> SongAggregator<C, R> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SongAggregator<C2, R> {
        SongAggregator {
            clock,
            reporter: self.reporter,
            interval: self.interval,
        }
    }

    pub fn with_reporter<R2: ProgressReporter>(self, reporter: R2) -> SongAggregator<C, R2> {
        SongAggregator {
            clock: self.clock,
            reporter,
            interval: self.interval,
        }
    }

    /// Minimum time between two progress ticks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Summarise each song in `songs`, in the given order.
    ///
    /// Every song must occur in `table`; the first one that does not aborts
    /// the pass with [`StreamsError::SongNotFound`].
    pub fn summarize<S: AsRef<str>>(&mut self, table: &StreamTable, songs: &[S]) -> Result<SongTable> {
        let total = songs.len();
        let index = table.rows_by_song();

        self.reporter.report(ProgressEvent::Started { total });
        let mut throttle = ProgressThrottle::new(&self.clock, self.interval);

        let mut rows: Vec<SongSummary> = Vec::with_capacity(total);
        for (completed, song) in songs.iter().enumerate() {
            if throttle.should_report() {
                self.reporter.report(ProgressEvent::tick(completed, total));
            }

            let song = song.as_ref();
            let indices = index
                .get(song)
                .ok_or_else(|| StreamsError::SongNotFound(song.to_string()))?;
            rows.push(summarize_song(table, song, indices));
        }

        self.reporter.report(ProgressEvent::Finished { total });
        Ok(SongTable::new(rows))
    }
}

/// Summarise `songs` with the default clock and `tracing` progress.
pub fn summarize_songs<S: AsRef<str>>(table: &StreamTable, songs: &[S]) -> Result<SongTable> {
    SongAggregator::new().summarize(table, songs)
}

// ── Private ───────────────────────────────────────────────────────────────────

/// Build the summary of one song from its (non-empty, ascending) row indices.
fn summarize_song(table: &StreamTable, song: &str, indices: &[usize]) -> SongSummary {
    let rows = table.rows();
    let first = &rows[indices[0]];

    let mut album: Vec<Option<String>> = Vec::new();
    let mut timestamps = Vec::with_capacity(indices.len());
    let mut number_of_20s_streams = 0;

    for &i in indices {
        let row = &rows[i];
        if !album.contains(&row.album) {
            album.push(row.album.clone());
        }
        if row.is_engaged() {
            number_of_20s_streams += 1;
        }
        timestamps.push(row.ts);
    }

    SongSummary {
        song: song.to_string(),
        artist: first.artist.clone(),
        track: first.track.clone(),
        album,
        number_of_streams: indices.len(),
        number_of_20s_streams,
        timestamps,
    }
}

/// Stream counts per song, for callers that only need the totals.
pub fn stream_counts(table: &StreamTable) -> HashMap<&str, usize> {
    table
        .rows_by_song()
        .into_iter()
        .map(|(song, rows)| (song, rows.len()))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
