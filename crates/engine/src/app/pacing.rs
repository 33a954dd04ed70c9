use std::env;
use std::time::{Duration, Instant};

use tracing::warn;

use super::loop_runner::{LoopConfig, SLOW_FRAME_ENV_VAR};

const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// What one redraw should simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameStep {
    /// Unclamped wall time since the previous redraw.
    pub(crate) frame_dt: Duration,
    pub(crate) ticks: u32,
    /// Backlog thrown away because the tick cap was hit.
    pub(crate) dropped_backlog: Duration,
}

/// Fixed-timestep accumulator plus the optional render cap.
#[derive(Debug)]
pub(crate) struct FramePacer {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    render_interval: Option<Duration>,
    slow_frame_delay: Duration,
    accumulator: Duration,
    last_frame: Instant,
    last_present: Instant,
}

impl FramePacer {
    pub(crate) fn new(config: &LoopConfig, now: Instant) -> Self {
        let target_tps = config.target_tps.max(1);
        let max_frame_delta = if config.max_frame_delta.is_zero() {
            DEFAULT_MAX_FRAME_DELTA
        } else {
            config.max_frame_delta
        };
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / f64::from(target_tps)),
            max_frame_delta,
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            render_interval: config
                .max_render_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            slow_frame_delay: slow_frame_delay(
                env::var(SLOW_FRAME_ENV_VAR),
                config.simulated_slow_frame_ms,
            ),
            accumulator: Duration::ZERO,
            last_frame: now,
            last_present: now,
        }
    }

    pub(crate) fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub(crate) fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    pub(crate) fn render_cap_fps(&self) -> Option<u32> {
        self.render_interval
            .map(|interval| (1.0 / interval.as_secs_f64()).round() as u32)
    }

    /// Artificial per-frame stall for exercising the tick clamp.
    pub(crate) fn slow_frame_delay(&self) -> Duration {
        self.slow_frame_delay
    }

    /// Feeds the clamped frame time into the accumulator and takes out whole ticks.
    pub(crate) fn begin_frame(&mut self, now: Instant) -> FrameStep {
        let frame_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.accumulator = self
            .accumulator
            .saturating_add(frame_dt.min(self.max_frame_delta));

        let mut ticks = 0u32;
        while self.accumulator >= self.fixed_dt && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }
        let dropped_backlog = if self.accumulator >= self.fixed_dt {
            std::mem::take(&mut self.accumulator)
        } else {
            Duration::ZERO
        };

        FrameStep {
            frame_dt,
            ticks,
            dropped_backlog,
        }
    }

    /// Time left before the next present is allowed under the render cap.
    pub(crate) fn present_wait(&self, now: Instant) -> Duration {
        let Some(interval) = self.render_interval else {
            return Duration::ZERO;
        };
        interval.saturating_sub(now.saturating_duration_since(self.last_present))
    }

    pub(crate) fn mark_presented(&mut self, now: Instant) {
        self.last_present = now;
    }
}

fn slow_frame_delay(env_value: Result<String, env::VarError>, fallback_ms: u64) -> Duration {
    let fallback = Duration::from_millis(fallback_ms);
    match env_value {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(env_var = SLOW_FRAME_ENV_VAR, value = raw.as_str(), "slow_frame_env_invalid");
                fallback
            }
        },
        Err(env::VarError::NotPresent) => fallback,
        Err(error) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, error = %error, "slow_frame_env_unreadable");
            fallback
        }
    }
}
