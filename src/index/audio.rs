//! # Tower Audio Index and Locator
//!
//! Resolves which recording covers a query instant. Two sources feed the
//! decision:
//!
//! 1. **Configured overrides**: manually time-anchored files listed in the
//!    configuration. An override whose file exists and whose anchor is at or
//!    before the query instant wins unconditionally, even when a name-derived
//!    file would start closer to the instant. This is a manual-correction
//!    mechanism, not a closeness heuristic. When several qualify, the latest
//!    anchor wins.
//! 2. **Name-derived index**: `.mp3` files whose hyphen-delimited names end
//!    in `<Mon>-<DD>-<YYYY>-<HHMM>Z`. The last entry starting at or before
//!    the instant is chosen ("latest-not-after"); a query preceding every
//!    file falls back to the earliest one.
//!
//! If an override entry's file has been removed from disk, resolution reverts
//! to the name-derived scan rather than failing the request.

use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::NameParse;
use crate::config::AudioOverride;

/// One indexed recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEntry {
    pub start: DateTime<Utc>,
    pub path: PathBuf,
}

/// The recording selected for a query instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAudio {
    pub path: PathBuf,
    pub start: DateTime<Utc>,
    /// True when a configured override supplied the anchor
    pub is_override: bool,
}

/// Fixed case-sensitive month abbreviation table used by the recorder.
fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    let month = match abbrev {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse a recording filename stem such as `KEWR-Twr-Oct-08-2025-1730Z`.
///
/// At least six hyphen-delimited fields are required; the last four, read from
/// the end, are month abbreviation, day, year, and a 4-digit hour-minute group
/// suffixed with `Z`. Leading fields (station, channel, ...) are ignored, so
/// labels containing extra hyphens still parse.
pub fn parse_audio_stem(stem: &str) -> NameParse<DateTime<Utc>> {
    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() < 6 {
        return NameParse::NotThisFormat;
    }

    let month_str = parts[parts.len() - 4];
    let day_str = parts[parts.len() - 3];
    let year_str = parts[parts.len() - 2];
    let hmz = parts[parts.len() - 1];

    let Some(month) = month_from_abbrev(month_str) else {
        return NameParse::Malformed;
    };
    let Some(hm) = hmz.strip_suffix('Z') else {
        return NameParse::Malformed;
    };
    if hm.len() != 4 || !hm.bytes().all(|b| b.is_ascii_digit()) {
        return NameParse::Malformed;
    }

    let (Ok(day), Ok(year)) = (day_str.parse::<u32>(), year_str.parse::<i32>()) else {
        return NameParse::Malformed;
    };
    let hour: u32 = hm[..2].parse().unwrap_or(99);
    let minute: u32 = hm[2..].parse().unwrap_or(99);

    match Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single() {
        Some(instant) => NameParse::Parsed(instant),
        None => NameParse::Malformed,
    }
}

/// Scan the audio directory into an ascending name-derived index.
///
/// Only `.mp3` files are considered, and files named by a configured override
/// are excluded here because they are evaluated separately with their manual
/// anchors.
pub fn scan_audio_dir(dir: &Path, overrides: &[AudioOverride]) -> Vec<AudioEntry> {
    let mut entries = Vec::new();
    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(err) => {
            debug!(dir = %dir.display(), error = %err, "audio directory not readable");
            return entries;
        }
    };

    for entry in read_dir.flatten() {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if overrides.iter().any(|o| o.file == name) {
            continue;
        }
        let path = entry.path();
        let is_mp3 = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"));
        if !is_mp3 {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match parse_audio_stem(stem) {
            NameParse::Parsed(start) => entries.push(AudioEntry { start, path }),
            NameParse::NotThisFormat => {}
            NameParse::Malformed => {
                debug!(name, "skipping malformed audio filename");
            }
        }
    }

    entries.sort_by_key(|entry| entry.start);
    entries
}

/// Select the recording covering `ts`.
///
/// Returns `None` only when no override qualifies and the name-derived index
/// is empty. The extraction offset is `ts - start` and may be negative when
/// the fallback-earliest branch was taken; the streamer clamps it at zero.
pub fn locate_audio(
    dir: &Path,
    overrides: &[AudioOverride],
    ts: DateTime<Utc>,
) -> Option<ResolvedAudio> {
    // Overrides first: presence dominates distance
    let mut chosen: Option<ResolvedAudio> = None;
    for entry in overrides {
        if entry.start > ts {
            continue;
        }
        let path = dir.join(&entry.file);
        if !path.is_file() {
            debug!(file = %entry.file, "configured audio override missing on disk");
            continue;
        }
        match &chosen {
            Some(current) if current.start >= entry.start => {}
            _ => {
                chosen = Some(ResolvedAudio {
                    path,
                    start: entry.start,
                    is_override: true,
                })
            }
        }
    }
    if chosen.is_some() {
        return chosen;
    }

    // Latest name-derived file not after ts; earliest file as the fallback
    let index = scan_audio_dir(dir, overrides);
    let mut best: Option<&AudioEntry> = None;
    for entry in &index {
        if entry.start <= ts {
            best = Some(entry);
        } else {
            break;
        }
    }
    let selected = best.or_else(|| index.first())?;
    Some(ResolvedAudio {
        path: selected.path.clone(),
        start: selected.start,
        is_override: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 8, h, m, s).unwrap()
    }

    #[test]
    fn test_parse_valid_audio_stem() {
        assert_eq!(
            parse_audio_stem("KEWR-Twr-Oct-08-2025-1730Z"),
            NameParse::Parsed(at(17, 30, 0))
        );
        // Extra hyphens in the label are fine; fields are read from the end
        assert_eq!(
            parse_audio_stem("KEWR-Twr-North-Feed-Oct-08-2025-1730Z"),
            NameParse::Parsed(at(17, 30, 0))
        );
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert_eq!(
            parse_audio_stem("Twr-Oct-08-2025-1730Z"),
            NameParse::NotThisFormat
        );
    }

    #[test]
    fn test_parse_flags_structural_deviations_as_malformed() {
        // Unknown month abbreviation (case-sensitive table)
        assert_eq!(
            parse_audio_stem("KEWR-Twr-OCT-08-2025-1730Z"),
            NameParse::Malformed
        );
        // Time group not Z-suffixed
        assert_eq!(
            parse_audio_stem("KEWR-Twr-Oct-08-2025-1730"),
            NameParse::Malformed
        );
        // Wrong digit length in the time group
        assert_eq!(
            parse_audio_stem("KEWR-Twr-Oct-08-2025-173Z"),
            NameParse::Malformed
        );
        // Impossible time of day
        assert_eq!(
            parse_audio_stem("KEWR-Twr-Oct-08-2025-2599Z"),
            NameParse::Malformed
        );
    }

    fn write_audio(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"mp3").unwrap();
    }

    #[test]
    fn test_scan_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1800Z.mp3");
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1730Z.mp3");
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1745Z.wav");
        write_audio(dir.path(), "notes.mp3");
        let index = scan_audio_dir(dir.path(), &[]);
        let starts: Vec<_> = index.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![at(17, 30, 0), at(18, 0, 0)]);
    }

    #[test]
    fn test_locate_latest_not_after() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1730Z.mp3");
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1800Z.mp3");
        let resolved = locate_audio(dir.path(), &[], at(18, 15, 0)).unwrap();
        assert_eq!(resolved.start, at(18, 0, 0));
        assert!(!resolved.is_override);
    }

    #[test]
    fn test_locate_falls_back_to_earliest_before_all_files() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1730Z.mp3");
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1800Z.mp3");
        let resolved = locate_audio(dir.path(), &[], at(12, 0, 0)).unwrap();
        // Query precedes all files; earliest wins even though it is distant
        assert_eq!(resolved.start, at(17, 30, 0));
    }

    #[test]
    fn test_locate_none_when_nothing_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(locate_audio(dir.path(), &[], at(17, 30, 0)).is_none());
    }

    #[test]
    fn test_override_precedence_dominates_distance() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "cut.mp3");
        // Regular file starts 5s after the override anchor
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1800Z.mp3");
        let overrides = vec![AudioOverride {
            file: "cut.mp3".to_string(),
            start: at(17, 59, 55),
        }];
        // Query 2s after the anchor: the regular file at 18:00:00 is closer in
        // absolute distance, but the override qualifies and wins
        let resolved = locate_audio(dir.path(), &overrides, at(17, 59, 57)).unwrap();
        assert!(resolved.is_override);
        assert_eq!(resolved.start, at(17, 59, 55));
        assert_eq!(resolved.path, dir.path().join("cut.mp3"));
    }

    #[test]
    fn test_override_not_yet_anchored_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "cut.mp3");
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1730Z.mp3");
        let overrides = vec![AudioOverride {
            file: "cut.mp3".to_string(),
            start: at(18, 0, 0),
        }];
        // Anchor is in the future of the query; name-derived file is used
        let resolved = locate_audio(dir.path(), &overrides, at(17, 45, 0)).unwrap();
        assert!(!resolved.is_override);
        assert_eq!(resolved.start, at(17, 30, 0));
    }

    #[test]
    fn test_latest_qualifying_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "early.mp3");
        write_audio(dir.path(), "late.mp3");
        let overrides = vec![
            AudioOverride {
                file: "early.mp3".to_string(),
                start: at(17, 0, 0),
            },
            AudioOverride {
                file: "late.mp3".to_string(),
                start: at(17, 30, 0),
            },
        ];
        let resolved = locate_audio(dir.path(), &overrides, at(18, 0, 0)).unwrap();
        assert_eq!(resolved.path, dir.path().join("late.mp3"));
    }

    #[test]
    fn test_missing_override_file_reverts_to_name_derived() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1730Z.mp3");
        let overrides = vec![AudioOverride {
            file: "gone.mp3".to_string(),
            start: at(17, 0, 0),
        }];
        let resolved = locate_audio(dir.path(), &overrides, at(17, 45, 0)).unwrap();
        assert!(!resolved.is_override);
        assert_eq!(resolved.start, at(17, 30, 0));
    }

    #[test]
    fn test_override_files_excluded_from_name_derived_index() {
        let dir = tempfile::tempdir().unwrap();
        // Override file whose name would also parse; anchored in the future so
        // it cannot qualify, and it must not leak into the name-derived index
        write_audio(dir.path(), "KEWR-Twr-Oct-08-2025-1730Z.mp3");
        let overrides = vec![AudioOverride {
            file: "KEWR-Twr-Oct-08-2025-1730Z.mp3".to_string(),
            start: at(23, 0, 0),
        }];
        assert!(locate_audio(dir.path(), &overrides, at(18, 0, 0)).is_none());
    }
}
