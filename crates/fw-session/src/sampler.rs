//! Periodic frame sampling loop.
//!
//! One task per session: tick on a fixed period (first tick immediate),
//! capture a frame, encode it, and send it fire-and-forget together with
//! the parameters in effect at that tick. Capture or encode failure skips
//! the tick; it never aborts the session. On shutdown the loop exits before
//! the outbound channel half is closed, so a tick can never fire against a
//! closed channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

use fw_capture::{CaptureError, CaptureResult, FrameEncoder, FrameSource};
use fw_client::FrameSink;
use fw_models::{DetectionParameters, OutboundFrame};

/// Default sampling period.
pub const DEFAULT_SAMPLE_PERIOD: Duration = Duration::from_secs(3);

pub(crate) struct SamplerContext {
    pub session_id: Uuid,
    pub source: Arc<Mutex<Box<dyn FrameSource>>>,
    pub encoder: Arc<dyn FrameEncoder>,
    pub sink: Box<dyn FrameSink>,
    pub params_rx: watch::Receiver<DetectionParameters>,
    pub shutdown_rx: watch::Receiver<bool>,
    pub period: Duration,
}

/// Run the sampling loop until shutdown is signalled.
pub(crate) async fn run_sampler(ctx: SamplerContext) {
    let SamplerContext {
        session_id,
        source,
        encoder,
        mut sink,
        params_rx,
        mut shutdown_rx,
        period,
    } = ctx;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                match capture_and_encode(&source, encoder.as_ref()) {
                    Ok(payload) => {
                        // Current parameters, read fresh at send time.
                        let params = params_rx.borrow().clamped();
                        let frame = OutboundFrame { payload, params };
                        if let Err(e) = sink.send_frame(frame).await {
                            // Fire-and-forget: the inbound reader surfaces
                            // fatal channel faults.
                            warn!(session_id = %session_id, error = %e, "frame send failed");
                        }
                    }
                    Err(e) => {
                        // A single missed frame is not a session failure.
                        warn!(session_id = %session_id, error = %e, "skipping frame this tick");
                    }
                }
            }
        }
    }

    // Timer loop has exited; now the outbound half may close.
    if let Err(e) = sink.close().await {
        debug!(session_id = %session_id, error = %e, "channel close failed");
    }
    debug!(session_id = %session_id, "sampler stopped");
}

fn capture_and_encode(
    source: &Arc<Mutex<Box<dyn FrameSource>>>,
    encoder: &dyn FrameEncoder,
) -> CaptureResult<Vec<u8>> {
    let frame = match source.lock() {
        Ok(mut source) => source.read_frame()?,
        Err(_) => return Err(CaptureError::Frame("frame source lock poisoned".into())),
    };
    encoder.encode(&frame)
}
