//! # Filename Timestamp Indexing
//!
//! Both data streams consumed by this service are plain directories of files
//! whose names encode their capture instants. This module turns those
//! directory listings into time-ordered indices and answers the temporal
//! queries the handlers need.
//!
//! ## Key Components:
//! - **Snapshot Index**: `adsb_<YYYYMMDDThhmmss>Z.json` position snapshots,
//!   with nearest-instant and inclusive range queries
//! - **Audio Index**: `<label>-<Mon>-<DD>-<YYYY>-<HHMM>Z.mp3` recordings,
//!   with latest-not-after resolution and configured override precedence
//!
//! ## Design Notes:
//! - Indices are rebuilt from the directory listing on every request. There is
//!   no cache, so recorder output is visible on the very next call.
//! - Filename parsing failures are exclusion signals, not errors: a name that
//!   does not match the convention is skipped and the request proceeds.

pub mod audio;
pub mod snapshot;

/// Outcome of parsing one directory entry name.
///
/// `NotThisFormat` means the name does not follow the convention at all
/// (wrong prefix, extension, or field count). `Malformed` means the shape
/// matched but a required field did not decode (unknown month abbreviation,
/// out-of-range date, wrong digit length). Index construction collapses both
/// to "excluded", but keeping them distinct makes the parsers testable and
/// the debug logs meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameParse<T> {
    Parsed(T),
    NotThisFormat,
    Malformed,
}
