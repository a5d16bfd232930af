//! # ADS-B Snapshot Index
//!
//! Parses the snapshot directory listing into an ascending time index and
//! answers the two queries the context endpoint needs: the snapshot nearest
//! to an instant, and all snapshots inside an inclusive window.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::NameParse;

/// One indexed snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub instant: DateTime<Utc>,
    pub path: PathBuf,
}

/// Parse a snapshot filename of the form `adsb_<YYYYMMDDThhmmss>Z.json`.
///
/// The 14 digits around the literal `T` decode as a UTC date-time. Names with
/// a different shape are `NotThisFormat`; names whose digits do not form a
/// valid date-time are `Malformed`.
pub fn parse_snapshot_filename(name: &str) -> NameParse<DateTime<Utc>> {
    let Some(rest) = name.strip_prefix("adsb_") else {
        return NameParse::NotThisFormat;
    };
    let Some(stamp) = rest.strip_suffix("Z.json") else {
        return NameParse::NotThisFormat;
    };

    // YYYYMMDDThhmmss: 15 characters, digit everywhere but the literal T
    if stamp.len() != 15 {
        return NameParse::NotThisFormat;
    }
    let bytes = stamp.as_bytes();
    if bytes[8] != b'T'
        || !bytes[..8].iter().all(u8::is_ascii_digit)
        || !bytes[9..].iter().all(u8::is_ascii_digit)
    {
        return NameParse::NotThisFormat;
    }

    match NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S") {
        Ok(naive) => NameParse::Parsed(naive.and_utc()),
        // Digits in place but not a real date, e.g. month 13
        Err(_) => NameParse::Malformed,
    }
}

/// Ascending time index over one snapshot directory listing.
///
/// Built fresh for each request; a missing directory yields an empty index.
#[derive(Debug)]
pub struct SnapshotIndex {
    entries: Vec<SnapshotEntry>,
}

impl SnapshotIndex {
    /// Scan a directory, keeping every entry whose name parses.
    pub fn scan(dir: &Path) -> Self {
        let mut entries = Vec::new();
        let read_dir = match std::fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "snapshot directory not readable");
                return Self { entries };
            }
        };

        for entry in read_dir.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            match parse_snapshot_filename(name) {
                NameParse::Parsed(instant) => entries.push(SnapshotEntry {
                    instant,
                    path: entry.path(),
                }),
                NameParse::NotThisFormat => {}
                NameParse::Malformed => {
                    debug!(name, "skipping malformed snapshot filename");
                }
            }
        }

        entries.sort_by_key(|entry| entry.instant);
        Self { entries }
    }

    #[cfg(test)]
    fn from_entries(mut entries: Vec<SnapshotEntry>) -> Self {
        entries.sort_by_key(|entry| entry.instant);
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry minimizing `|instant - ts|`; ties go to the earlier entry.
    pub fn nearest(&self, ts: DateTime<Utc>) -> Option<&SnapshotEntry> {
        let mut best: Option<(Duration, &SnapshotEntry)> = None;
        for entry in &self.entries {
            let delta = (entry.instant - ts).abs();
            match best {
                Some((best_delta, _)) if delta >= best_delta => {}
                _ => best = Some((delta, entry)),
            }
        }
        best.map(|(_, entry)| entry)
    }

    /// All entries with instant in `[ts - past_s, ts + future_s]`, inclusive,
    /// in ascending order. An empty result is not an error. Windows wide
    /// enough to overflow the datetime range clamp to its bounds instead of
    /// panicking.
    pub fn range(&self, ts: DateTime<Utc>, past_s: f64, future_s: f64) -> Vec<&SnapshotEntry> {
        let start = ts
            .checked_sub_signed(seconds(past_s))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = ts
            .checked_add_signed(seconds(future_s))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries
            .iter()
            .filter(|entry| entry.instant >= start && entry.instant <= end)
            .collect()
    }
}

/// Fractional seconds to a chrono Duration (millisecond resolution). The
/// float-to-int cast saturates, so arbitrarily large inputs stay in range.
fn seconds(s: f64) -> Duration {
    Duration::milliseconds((s * 1000.0).round() as i64)
}
