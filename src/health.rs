//! # Health Endpoint
//!
//! Reports service liveness plus the operational facts an operator actually
//! checks when the API misbehaves: are the two data directories present, and
//! can the transcoder binary be launched.

use actix_web::{web, HttpResponse};
use serde_json::json;
use std::process::Stdio;
use tokio::process::Command;

use crate::state::AppState;

/// Cheap launch probe: run `<transcoder> -version` and see if it starts.
async fn transcoder_available(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let config = state.config();

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "service": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "host": config.server.host,
            "port": config.server.port
        },
        "data": {
            "adsb_dir": config.data.adsb_dir.display().to_string(),
            "adsb_dir_present": config.data.adsb_dir.is_dir(),
            "audio_dir": config.data.audio_dir.display().to_string(),
            "audio_dir_present": config.data.audio_dir.is_dir(),
            "override_count": config.overrides.len()
        },
        "transcoder": {
            "binary": config.audio.transcoder,
            "available": transcoder_available(&config.audio.transcoder).await
        }
    }))
}
