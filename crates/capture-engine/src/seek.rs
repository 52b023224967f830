//! Seek controller.
//!
//! Moves a playback surface's time cursor and waits for the surface to
//! confirm arrival. Taking the surface by `&mut` means a second seek cannot
//! be issued while one is in flight.

use std::time::Duration;

use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_common::CancellationToken;
use tagreel_media_core::PlaybackSurface;

/// Seek `surface` to `target` seconds and wait until it has arrived.
///
/// Without a timeout a surface that never signals arrival stalls the caller
/// until `cancel` fires.
pub async fn seek_to(
    surface: &mut dyn PlaybackSurface,
    target: f64,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> TagreelResult<()> {
    if !target.is_finite() {
        return Err(TagreelError::seek(format!("Invalid seek target {target}")));
    }
    tagreel_common::ensure_not_cancelled(cancel)?;

    tracing::debug!(target_secs = target, "Seeking playback surface");
    surface.set_current_time(target)?;

    let arrival = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, surface.seeked()).await {
                Ok(result) => result,
                Err(_) => Err(TagreelError::seek(format!(
                    "Surface did not reach {target:.3}s within {}ms",
                    limit.as_millis()
                ))),
            },
            None => surface.seeked().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TagreelError::Cancelled),
        result = arrival => result,
    }
}
