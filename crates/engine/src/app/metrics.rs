use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LockResult, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static POISON_WARNED: AtomicBool = AtomicBool::new(false);

/// Takes the guard out of a poisoned lock, warning the first time it happens.
fn recover<G>(result: LockResult<G>, operation: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        if !POISON_WARNED.swap(true, Ordering::Relaxed) {
            warn!(operation, "metrics_lock_poisoned");
        }
        poisoned.into_inner()
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    /// Frames in the window that hit the tick cap.
    pub sim_clamps: u32,
    pub dropped_backlog_ms: f32,
    pub peak_primitives: usize,
}

/// Latest published loop metrics, readable from any thread.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *recover(self.latest.read(), "read")
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *recover(self.latest.write(), "write") = snapshot;
    }
}

/// Counters for the current reporting window.
#[derive(Debug, Default)]
struct WindowTotals {
    frames: u32,
    ticks: u32,
    frame_time: Duration,
    worst_frame: Duration,
    sim_clamps: u32,
    dropped_backlog: Duration,
    peak_primitives: usize,
}

#[derive(Debug)]
pub(crate) struct MetricsWindow {
    opened_at: Instant,
    length: Duration,
    totals: WindowTotals,
}

impl MetricsWindow {
    pub(crate) fn new(length: Duration, now: Instant) -> Self {
        Self {
            opened_at: now,
            length,
            totals: WindowTotals::default(),
        }
    }

    pub(crate) fn on_frame(&mut self, frame_dt: Duration, primitives: usize) {
        let totals = &mut self.totals;
        totals.frames = totals.frames.saturating_add(1);
        totals.frame_time = totals.frame_time.saturating_add(frame_dt);
        totals.worst_frame = totals.worst_frame.max(frame_dt);
        totals.peak_primitives = totals.peak_primitives.max(primitives);
    }

    pub(crate) fn on_ticks(&mut self, ticks: u32) {
        self.totals.ticks = self.totals.ticks.saturating_add(ticks);
    }

    pub(crate) fn on_sim_clamp(&mut self, dropped_backlog: Duration) {
        self.totals.sim_clamps = self.totals.sim_clamps.saturating_add(1);
        self.totals.dropped_backlog = self.totals.dropped_backlog.saturating_add(dropped_backlog);
    }

    /// Closes the window once it has run its length and starts the next one at `now`.
    pub(crate) fn close_if_due(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.opened_at);
        if elapsed < self.length {
            return None;
        }
        let totals = std::mem::take(&mut self.totals);
        self.opened_at = now;

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match totals.frames {
            0 => 0.0,
            frames => totals.frame_time.as_secs_f32() * 1000.0 / frames as f32,
        };
        Some(LoopMetricsSnapshot {
            fps: totals.frames as f32 / seconds,
            tps: totals.ticks as f32 / seconds,
            frame_time_ms,
            worst_frame_ms: totals.worst_frame.as_secs_f32() * 1000.0,
            sim_clamps: totals.sim_clamps,
            dropped_backlog_ms: totals.dropped_backlog.as_secs_f32() * 1000.0,
            peak_primitives: totals.peak_primitives,
        })
    }
}
