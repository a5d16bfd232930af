//! # Audio Segment Streaming
//!
//! Extracts a bounded interval from a recording by driving the configured
//! transcoder binary (ffmpeg by default) as a subprocess and forwarding its
//! stdout to the HTTP response in fixed-size chunks. The clip is never
//! buffered whole: the client starts receiving bytes while the transcoder is
//! still running.
//!
//! ## Subprocess Lifecycle:
//! The child is a scoped resource. On every exit path (normal EOF, read
//! error, wall-clock timeout, or the client disconnecting mid-stream) the
//! process is killed if still running and then reaped with `wait()`. The
//! handle is additionally `kill_on_drop` so an aborted reader task cannot
//! leak a transcoder.

use actix_web::web::Bytes;
use futures_util::{Stream, StreamExt};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::config::AudioConfig;
use crate::error::AppError;

/// One extraction request: where to cut and how much.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    pub path: PathBuf,
    /// Seconds into the file; negative values are clamped to 0
    pub start_offset_s: f64,
    /// Seconds of audio to extract; must be positive
    pub duration_s: f64,
}

/// Build the transcoder invocation for a segment.
///
/// Seeks before the input, bounds the read with `-t`, drops any video stream,
/// and re-encodes to MP3 on stdout so the output is streamable regardless of
/// where the seek landed in the source file.
fn transcoder_command(binary: &str, spec: &SegmentSpec) -> Command {
    let start = spec.start_offset_s.max(0.0);
    let mut cmd = Command::new(binary);
    cmd.arg("-ss")
        .arg(start.to_string())
        .arg("-i")
        .arg(&spec.path)
        .arg("-t")
        .arg(spec.duration_s.to_string())
        .arg("-vn")
        .arg("-acodec")
        .arg("libmp3lame")
        .arg("-f")
        .arg("mp3")
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// Launch the transcoder and return a chunked byte stream of its stdout.
///
/// A bounded channel decouples the subprocess reader from the HTTP response:
/// the reader task owns the child and pushes chunks, the returned
/// `ReceiverStream` feeds `HttpResponse::streaming`. Backpressure from a slow
/// client propagates through the channel to the pipe and from there to the
/// transcoder itself.
pub fn stream_segment(
    audio: &AudioConfig,
    spec: SegmentSpec,
) -> Result<impl Stream<Item = Result<Bytes, AppError>>, AppError> {
    let mut child = transcoder_command(&audio.transcoder, &spec)
        .spawn()
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                AppError::TranscoderUnavailable(format!(
                    "{} is not installed on the server",
                    audio.transcoder
                ))
            } else {
                AppError::Internal(format!(
                    "failed to launch {}: {}",
                    audio.transcoder, err
                ))
            }
        })?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Internal("transcoder stdout was not captured".to_string()))?;

    let (tx, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(audio.stream_channel_capacity);
    let chunk_size = audio.chunk_size;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(audio.transcode_timeout_s);

    tokio::spawn(async move {
        let mut buf = vec![0u8; chunk_size];
        loop {
            let n = match tokio::time::timeout_at(deadline, stdout.read(&mut buf)).await {
                Err(_elapsed) => {
                    warn!("transcoder exceeded its wall-clock limit, killing it");
                    kill_quietly(&mut child).await;
                    break;
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "transcoder stdout read failed");
                    let _ = tx.send(Err(err)).await;
                    kill_quietly(&mut child).await;
                    break;
                }
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => n,
            };
            if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                // Receiver dropped: the client went away mid-stream
                debug!("client disconnected, killing transcoder");
                kill_quietly(&mut child).await;
                break;
            }
        }

        // Reap on every path so no zombie outlives the request
        match child.wait().await {
            Ok(status) if !status.success() => {
                debug!(%status, "transcoder exited with non-zero status");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "failed to reap transcoder"),
        }
    });

    Ok(ReceiverStream::new(rx).map(|chunk| {
        chunk.map_err(|err| AppError::Internal(format!("transcoder stream error: {}", err)))
    }))
}

async fn kill_quietly(child: &mut Child) {
    if let Err(err) = child.kill().await {
        debug!(error = %err, "transcoder already gone");
    }
}
