//! Download progress tracking.
//!
//! [`ProgressReader`] wraps any [`Read`] and redraws a single-line progress bar
//! as bytes flow through it. Redraws are throttled to one per
//! [`REPORT_INTERVAL`] and only happen when the whole-percent value changes.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

/// Number of cells in the rendered bar.
pub const BAR_WIDTH: usize = 50;

/// Minimum time between two intermediate redraws.
pub const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Source of the current time, swappable in tests.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
pub struct ProgressState {
    pub total_bytes: u64,
    pub read_bytes: u64,
    pub last_percent: u8,
    pub last_report: Instant,
}

impl ProgressState {
    fn new(total_bytes: u64, now: Instant) -> Self {
        Self {
            total_bytes,
            read_bytes: 0,
            last_percent: 0,
            last_report: now,
        }
    }

    /// Floored percentage clamped to 100, or `None` when the total is unknown.
    pub fn percent(&self) -> Option<u8> {
        if self.total_bytes == 0 {
            return None;
        }
        let percent = (self.read_bytes as u128 * 100 / self.total_bytes as u128).min(100);
        Some(percent as u8)
    }
}

pub struct ProgressReader<R, W, C = SystemClock> {
    inner: R,
    out: W,
    clock: C,
    state: ProgressState,
}

impl<R: Read, W: Write> ProgressReader<R, W, SystemClock> {
    pub fn new(inner: R, total_bytes: u64, out: W) -> Self {
        Self::with_clock(inner, total_bytes, out, SystemClock)
    }
}

impl<R: Read, W: Write, C: Clock> ProgressReader<R, W, C> {
    pub fn with_clock(inner: R, total_bytes: u64, out: W, clock: C) -> Self {
        let state = ProgressState::new(total_bytes, clock.now());
        Self {
            inner,
            out,
            clock,
            state,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Draw the bar at 100% regardless of throttling.
    pub fn finish(&mut self) {
        self.state.last_percent = 100;
        self.state.last_report = self.clock.now();
        self.draw(100);
    }

    pub fn into_inner(self) -> (R, W) {
        (self.inner, self.out)
    }

    fn maybe_report(&mut self) {
        let now = self.clock.now();
        if now.duration_since(self.state.last_report) <= REPORT_INTERVAL {
            return;
        }
        let Some(percent) = self.state.percent() else {
            return;
        };
        if percent != self.state.last_percent {
            self.state.last_percent = percent;
            self.state.last_report = now;
            self.draw(percent);
        }
    }

    fn draw(&mut self, percent: u8) {
        // Rendering is cosmetic; a closed terminal must not fail the download.
        let _ = self.out.write_all(render_progress_bar(percent).as_bytes());
        let _ = self.out.flush();
    }
}

impl<R: Read, W: Write, C: Clock> Read for ProgressReader<R, W, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.state.read_bytes += n as u64;
        self.maybe_report();
        Ok(n)
    }
}

/// Render one carriage-return-prefixed progress line.
pub fn render_progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let completed = BAR_WIDTH * percent / 100;

    format!(
        "\rDownloading: [{}{}] {:>3}%",
        "=".repeat(completed),
        " ".repeat(BAR_WIDTH - completed),
        percent
    )
}
