//! # Audio Segment Endpoint
//!
//! `GET /audio/segment` resolves the recording covering the query instant,
//! computes the extraction bounds for the requested relation, and streams the
//! re-encoded clip from the transcoder subprocess.

use actix_web::{web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::handlers::models::{Relation, SegmentQuery};
use crate::index::audio::locate_audio;
use crate::state::AppState;
use crate::timestamp::parse_timestamp;
use crate::transcode::{stream_segment, SegmentSpec};

pub async fn audio_segment(
    state: web::Data<AppState>,
    query: web::Query<SegmentQuery>,
) -> AppResult<HttpResponse> {
    let config = state.config();
    let ts = parse_timestamp(&query.timestamp)?;

    let resolved = locate_audio(&config.data.audio_dir, &config.overrides, ts)
        .ok_or_else(|| AppError::NotFound("No audio file available".to_string()))?;

    let window_s = query.window_s(config.audio.default_window_s);
    if !(config.audio.min_window_s..=config.audio.max_window_s).contains(&window_s) {
        return Err(AppError::BadRequest(format!(
            "segment length {}s is outside [{}, {}] seconds",
            window_s, config.audio.min_window_s, config.audio.max_window_s
        )));
    }

    // Seconds from the start of the selected file to the query instant; may be
    // negative when the earliest-file fallback was taken
    let offset_s = (ts - resolved.start).num_milliseconds() as f64 / 1000.0;
    let start_offset_s = match query.relation {
        Relation::Prev => (offset_s - window_s).max(0.0),
        Relation::Next => offset_s.max(0.0),
    };

    let stream = stream_segment(
        &config.audio,
        SegmentSpec {
            path: resolved.path,
            start_offset_s,
            duration_s: window_s,
        },
    )?;

    Ok(HttpResponse::Ok()
        .content_type("audio/mpeg")
        .streaming(stream))
}
