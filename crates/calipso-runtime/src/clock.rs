//! Step counting, render throttling, rate measurement and frame pacing.

use calipso_core::{Error, Result};
use std::thread;
use std::time::{Duration, Instant};

/// Cyclic selection of how many steps pass between renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderThrottle {
    periods: Vec<u64>,
    index: usize,
}

impl RenderThrottle {
    pub fn new(periods: Vec<u64>) -> Result<Self> {
        if periods.is_empty() {
            return Err(Error::Config("render periods must not be empty".into()));
        }
        if periods.contains(&0) {
            return Err(Error::Config("render periods must be positive".into()));
        }
        Ok(Self { periods, index: 0 })
    }

    pub fn period(&self) -> u64 {
        self.periods[self.index]
    }

    pub fn periods(&self) -> &[u64] {
        &self.periods
    }

    pub fn forward(&mut self) -> u64 {
        self.index = (self.index + 1) % self.periods.len();
        self.period()
    }

    pub fn back(&mut self) -> u64 {
        self.index = (self.index + self.periods.len() - 1) % self.periods.len();
        self.period()
    }

    pub fn should_render(&self, step: u64) -> bool {
        step % self.period() == 0
    }
}

/// Events per second over a rolling window of at least `window`
#[derive(Debug, Clone)]
pub struct RateMeter {
    window: Duration,
    window_start: Instant,
    count: u64,
    rate: f64,
}

impl RateMeter {
    pub fn new(window: Duration, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            count: 0,
            rate: 0.0,
        }
    }

    pub fn per_second(now: Instant) -> Self {
        Self::new(Duration::from_secs(1), now)
    }

    /// Count one event; the rate is recomputed once the window has elapsed
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        self.count += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        self.rate = self.count as f64 / elapsed.as_secs_f64();
        self.count = 0;
        self.window_start = now;
        Some(self.rate)
    }

    /// Last computed rate
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

/// Caps presentation at a target frame rate
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl FramePacer {
    /// `target_fps == 0` disables pacing
    pub fn new(target_fps: u32) -> Self {
        let interval = (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / target_fps as f64));
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Time still to wait at `now` before the next frame may go out
    pub fn remaining(&self, now: Instant) -> Duration {
        match (self.interval, self.last) {
            (Some(interval), Some(last)) => interval.saturating_sub(now.saturating_duration_since(last)),
            _ => Duration::ZERO,
        }
    }

    /// Sleep off the rest of the frame interval
    pub fn pace(&mut self) {
        let wait = self.remaining(Instant::now());
        if !wait.is_zero() {
            thread::sleep(wait);
        }
        if self.interval.is_some() {
            self.last = Some(Instant::now());
        }
    }
}

/// Step counter plus the throttle, meters and pacer of the main loop
#[derive(Debug, Clone)]
pub struct SimulationClock {
    step: u64,
    frames: u64,
    throttle: RenderThrottle,
    sps: RateMeter,
    fps: RateMeter,
    pacer: FramePacer,
}

impl SimulationClock {
    pub fn new(render_periods: Vec<u64>, target_fps: u32) -> Result<Self> {
        let now = Instant::now();
        Ok(Self {
            step: 0,
            frames: 0,
            throttle: RenderThrottle::new(render_periods)?,
            sps: RateMeter::per_second(now),
            fps: RateMeter::per_second(now),
            pacer: FramePacer::new(target_fps),
        })
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn sps(&self) -> f64 {
        self.sps.rate()
    }

    pub fn fps(&self) -> f64 {
        self.fps.rate()
    }

    pub fn throttle(&self) -> &RenderThrottle {
        &self.throttle
    }

    pub fn throttle_mut(&mut self) -> &mut RenderThrottle {
        &mut self.throttle
    }

    pub fn should_render(&self) -> bool {
        self.throttle.should_render(self.step)
    }

    /// Count a presented frame and wait out the frame interval
    pub fn frame_presented(&mut self) {
        self.frames += 1;
        self.fps.record(Instant::now());
        self.pacer.pace();
    }

    /// Advance the step counter; returns the new SPS when it was recomputed
    pub fn step_done(&mut self) -> Option<f64> {
        self.step += 1;
        self.sps.record(Instant::now())
    }
}
