//! Query and response types for the public endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_window_s() -> f64 {
    20.0
}

/// Query parameters of `GET /context`.
///
/// `timestamp` is kept as the raw string: it is parsed once for the lookups
/// and embedded verbatim in the generated audio links so the client follows
/// them without any re-parsing drift.
#[derive(Debug, Deserialize)]
pub struct ContextQuery {
    pub timestamp: String,

    /// ADS-B history seconds (past)
    #[serde(default = "default_window_s")]
    pub adsb_past_s: f64,

    /// ADS-B extension seconds (future)
    #[serde(default = "default_window_s")]
    pub adsb_future_s: f64,

    /// Tower audio seconds before the timestamp
    #[serde(default = "default_window_s")]
    pub audio_past_s: f64,

    /// Tower audio seconds after the timestamp
    #[serde(default = "default_window_s")]
    pub audio_future_s: f64,
}

/// Which side of the timestamp an audio segment covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    #[default]
    Prev,
    Next,
}

/// Query parameters of `GET /audio/segment`.
#[derive(Debug, Deserialize)]
pub struct SegmentQuery {
    pub timestamp: String,

    #[serde(default)]
    pub relation: Relation,

    /// Deprecated: fallback default when the relation-specific parameter
    /// is absent
    pub duration: Option<f64>,

    /// Seconds before the timestamp, for `relation=prev`
    pub past_s: Option<f64>,

    /// Seconds after the timestamp, for `relation=next`
    pub future_s: Option<f64>,
}

impl SegmentQuery {
    /// Segment length in seconds, resolving the relation-specific parameter
    /// first, then the legacy `duration`, then the configured default.
    pub fn window_s(&self, default_s: f64) -> f64 {
        let preferred = match self.relation {
            Relation::Prev => self.past_s,
            Relation::Next => self.future_s,
        };
        preferred.or(self.duration).unwrap_or(default_s)
    }
}

/// Response body of `GET /context`.
#[derive(Debug, Serialize)]
pub struct ContextResponse {
    /// Closest snapshot to the timestamp, or null when none is readable
    pub adsb_current: Option<Value>,

    /// Snapshots inside the inclusive window, ascending by capture instant
    pub adsb_window: Vec<Value>,

    pub audio: AudioLinks,
}

/// Deep links for segment extraction instead of inlined audio bytes.
#[derive(Debug, Serialize)]
pub struct AudioLinks {
    pub prev_url: String,
    pub next_url: String,
}
