//! # Context Endpoint
//!
//! `GET /context` correlates both file streams against one query instant:
//! the nearest ADS-B snapshot, every snapshot inside the configured window,
//! and deep links to the two audio segments bracketing the instant.

use actix_web::{web, HttpResponse};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::handlers::models::{AudioLinks, ContextQuery, ContextResponse};
use crate::index::snapshot::SnapshotIndex;
use crate::state::AppState;
use crate::timestamp::parse_timestamp;

/// Read one snapshot document, or None when the file is unreadable or not
/// valid JSON. Best-effort by design: one bad file must not fail the request.
fn read_snapshot_json(path: &Path) -> Option<Value> {
    let bytes = std::fs::read(path)
        .map_err(|err| debug!(path = %path.display(), error = %err, "snapshot unreadable"))
        .ok()?;
    serde_json::from_slice(&bytes)
        .map_err(|err| debug!(path = %path.display(), error = %err, "snapshot not valid JSON"))
        .ok()
}

pub async fn get_context(
    state: web::Data<AppState>,
    query: web::Query<ContextQuery>,
) -> AppResult<HttpResponse> {
    let config = state.config();
    let ts = parse_timestamp(&query.timestamp)?;

    // Window widths must be non-negative finite numbers; anything else is a
    // client error, not a lookup that happens to match nothing
    for (name, value) in [
        ("adsb_past_s", query.adsb_past_s),
        ("adsb_future_s", query.adsb_future_s),
        ("audio_past_s", query.audio_past_s),
        ("audio_future_s", query.audio_future_s),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::BadRequest(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    // Rebuilt from the directory listing on every call; recorder output is
    // visible on the next request without any cache invalidation
    let index = SnapshotIndex::scan(&config.data.adsb_dir);

    let adsb_current = index
        .nearest(ts)
        .and_then(|entry| read_snapshot_json(&entry.path));

    let adsb_window: Vec<Value> = index
        .range(ts, query.adsb_past_s, query.adsb_future_s)
        .into_iter()
        .filter_map(|entry| read_snapshot_json(&entry.path))
        .collect();

    // The caller's timestamp string goes into the links verbatim so following
    // them resolves the exact same instant
    let audio = AudioLinks {
        prev_url: format!(
            "/audio/segment?timestamp={}&relation=prev&past_s={}",
            query.timestamp, query.audio_past_s
        ),
        next_url: format!(
            "/audio/segment?timestamp={}&relation=next&future_s={}",
            query.timestamp, query.audio_future_s
        ),
    };

    Ok(HttpResponse::Ok().json(ContextResponse {
        adsb_current,
        adsb_window,
        audio,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{test, App};
    use serde_json::json;

    async fn call_context(config: AppConfig, uri: &str) -> (u16, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(config)))
                .route("/context", web::get().to(get_context)),
        )
        .await;
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status().as_u16();
        let body = test::read_body(resp).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn config_with_adsb_dir(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.data.adsb_dir = dir.to_path_buf();
        config
    }

    #[actix_web::test]
    async fn test_context_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("adsb_20251008T173000Z.json"),
            json!({"aircraft": [{"hex": "a1b2c3"}]}).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("adsb_20251008T173010Z.json"),
            json!({"aircraft": []}).to_string(),
        )
        .unwrap();

        let (status, body) = call_context(
            config_with_adsb_dir(dir.path()),
            "/context?timestamp=2025-10-08T17:30:04Z&adsb_past_s=20&adsb_future_s=20",
        )
        .await;

        assert_eq!(status, 200);
        // Nearest: 17:30:00 is 4s away, 17:30:10 is 6s away
        assert_eq!(body["adsb_current"]["aircraft"][0]["hex"], "a1b2c3");
        // Window holds both, ascending
        assert_eq!(body["adsb_window"].as_array().unwrap().len(), 2);
        assert_eq!(body["adsb_window"][0]["aircraft"][0]["hex"], "a1b2c3");
        // Links carry the original timestamp string verbatim
        assert_eq!(
            body["audio"]["prev_url"],
            "/audio/segment?timestamp=2025-10-08T17:30:04Z&relation=prev&past_s=20"
        );
        assert_eq!(
            body["audio"]["next_url"],
            "/audio/segment?timestamp=2025-10-08T17:30:04Z&relation=next&future_s=20"
        );
    }

    #[actix_web::test]
    async fn test_context_with_no_snapshots_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = call_context(
            config_with_adsb_dir(dir.path()),
            "/context?timestamp=1759944600",
        )
        .await;
        assert_eq!(status, 200);
        assert!(body["adsb_current"].is_null());
        assert_eq!(body["adsb_window"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_context_skips_corrupt_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("adsb_20251008T173000Z.json"),
            "{not json at all",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("adsb_20251008T173010Z.json"),
            json!({"ok": true}).to_string(),
        )
        .unwrap();

        let (status, body) = call_context(
            config_with_adsb_dir(dir.path()),
            "/context?timestamp=2025-10-08T17:30:04Z",
        )
        .await;
        assert_eq!(status, 200);
        // Corrupt nearest file degrades adsb_current to null
        assert!(body["adsb_current"].is_null());
        // ...and is omitted from the window instead of failing the request
        assert_eq!(body["adsb_window"].as_array().unwrap().len(), 1);
        assert_eq!(body["adsb_window"][0]["ok"], true);
    }

    #[actix_web::test]
    async fn test_context_rejects_bad_windows() {
        let dir = tempfile::tempdir().unwrap();
        for uri in [
            "/context?timestamp=1759944600&adsb_past_s=-5",
            "/context?timestamp=1759944600&audio_future_s=NaN",
        ] {
            let (status, body) = call_context(config_with_adsb_dir(dir.path()), uri).await;
            assert_eq!(status, 400, "{}", uri);
            assert_eq!(body["error"]["type"], "bad_request");
        }
        // An enormous but valid window is served, not a panic
        let (status, _) = call_context(
            config_with_adsb_dir(dir.path()),
            "/context?timestamp=1759944600&adsb_past_s=1e18",
        )
        .await;
        assert_eq!(status, 200);
    }

    #[actix_web::test]
    async fn test_context_rejects_bad_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = call_context(
            config_with_adsb_dir(dir.path()),
            "/context?timestamp=banana",
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"]["type"], "invalid_timestamp");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("banana"));
    }
}
