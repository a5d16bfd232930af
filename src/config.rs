//! # Configuration Management
//!
//! This module handles loading and managing application configuration from
//! multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_SERVER_HOST, APP_SERVER_PORT, etc.)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! Audio overrides live here as well: an ordered list of manually time-anchored
//! audio files whose start instants cannot be derived from their names. They
//! take precedence over name-derived files during audio resolution.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub audio: AudioConfig,
    /// Manually anchored audio files, evaluated before the name-derived index.
    /// Order matters only for equal anchors (first entry wins a tie).
    #[serde(default)]
    pub overrides: Vec<AudioOverride>,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Locations of the two timestamp-named file streams.
///
/// Both directories are produced by external recorders and are only ever read
/// by this service. A missing directory is treated as an empty index, not an
/// error, so the service can start before the recorders have written anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory of `adsb_<YYYYMMDDThhmmss>Z.json` position snapshots
    pub adsb_dir: PathBuf,

    /// Directory of `<label>-<Mon>-<DD>-<YYYY>-<HHMM>Z.mp3` tower recordings
    pub audio_dir: PathBuf,
}

/// Audio extraction and streaming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Segment length in seconds when the client supplies neither the
    /// relation-specific parameter nor the legacy `duration` fallback
    pub default_window_s: f64,

    /// Smallest accepted segment length in seconds
    pub min_window_s: f64,

    /// Largest accepted segment length in seconds
    pub max_window_s: f64,

    /// Transcoder binary invoked to extract and re-encode segments
    pub transcoder: String,

    /// Size in bytes of the chunks forwarded from the transcoder's stdout
    pub chunk_size: usize,

    /// Bound of the channel between the transcoder reader task and the
    /// HTTP response stream (chunks in flight, not bytes)
    pub stream_channel_capacity: usize,

    /// Wall-clock limit on one transcoder run; the child is killed when it
    /// is exceeded
    pub transcode_timeout_s: u64,
}

/// One manually time-anchored audio file.
///
/// `file` is resolved relative to `data.audio_dir`. The anchor `start` is
/// trusted as-is; it exists precisely because the file's name carries no
/// usable timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioOverride {
    pub file: String,
    pub start: DateTime<Utc>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            data: DataConfig {
                adsb_dir: PathBuf::from("adsb_data"),
                audio_dir: PathBuf::from("toweraudio"),
            },
            audio: AudioConfig {
                default_window_s: 20.0,
                min_window_s: 0.1,
                max_window_s: 600.0,
                transcoder: "ffmpeg".to_string(),
                chunk_size: 8192,
                stream_channel_capacity: 16,
                transcode_timeout_s: 120,
            },
            overrides: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle special cases for HOST and PORT environment variables
    ///
    /// ## Environment Variable Examples:
    /// Nesting levels are separated by a double underscore so that keys which
    /// themselves contain underscores (`adsb_dir`, `chunk_size`) survive the
    /// split:
    /// - `APP_SERVER__HOST=0.0.0.0`: Override server host
    /// - `APP_DATA__ADSB_DIR=/srv/adsb`: Override the snapshot directory
    /// - `HOST=0.0.0.0` / `PORT=3000`: Special cases for deployment platforms
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        // Deployment platforms commonly inject these without the APP_ prefix
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// Catching configuration errors early prevents runtime failures and
    /// provides clear error messages about what's wrong.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.audio.transcoder.trim().is_empty() {
            return Err(anyhow::anyhow!("Transcoder binary name cannot be empty"));
        }

        if self.audio.chunk_size == 0 {
            return Err(anyhow::anyhow!("Audio chunk size must be greater than 0"));
        }

        if self.audio.stream_channel_capacity == 0 {
            return Err(anyhow::anyhow!(
                "Stream channel capacity must be greater than 0"
            ));
        }

        if self.audio.min_window_s <= 0.0 {
            return Err(anyhow::anyhow!(
                "Minimum audio window must be greater than 0"
            ));
        }

        if self.audio.max_window_s < self.audio.min_window_s {
            return Err(anyhow::anyhow!(
                "Maximum audio window cannot be smaller than the minimum"
            ));
        }

        if !(self.audio.min_window_s..=self.audio.max_window_s)
            .contains(&self.audio.default_window_s)
        {
            return Err(anyhow::anyhow!(
                "Default audio window must lie within [min_window_s, max_window_s]"
            ));
        }

        if self.audio.transcode_timeout_s == 0 {
            return Err(anyhow::anyhow!("Transcode timeout must be greater than 0"));
        }

        Ok(())
    }
}
