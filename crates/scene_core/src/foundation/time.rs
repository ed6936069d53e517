//! Time management utilities
//!
//! Wall-clock timing for the run loop plus the fixed-timestep accumulator
//! that turns elapsed time into simulation ticks.

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }
    
    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }
    
    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }
    
    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }
    
    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }
    
    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }
    
    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }
    
    /// Reset the stopwatch to zero
    pub fn reset(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }
    
    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = if let Some(start) = self.start_time {
            start.elapsed()
        } else {
            Duration::ZERO
        };
        self.elapsed + current_elapsed
    }
    
    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

/// Fixed-timestep accumulator.
///
/// Elapsed wall time is banked and paid out in whole ticks of `step`. The
/// remainder gives the render interpolation fraction between the previous
/// and current tick.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
    max_ticks_per_frame: u32,
    total_ticks: u64,
}

impl FixedStep {
    /// Create an accumulator paying out ticks of `step`. At most
    /// `max_ticks_per_frame` ticks are paid per call to [`FixedStep::accumulate`];
    /// anything beyond that is dropped so a long stall cannot spiral.
    pub fn new(step: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            total_ticks: 0,
        }
    }

    /// Bank `elapsed` time and return how many ticks are now due.
    pub fn accumulate(&mut self, elapsed: Duration) -> u32 {
        if self.step.is_zero() {
            return 0;
        }
        self.accumulator += elapsed;
        let mut due = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            due += 1;
            if due == self.max_ticks_per_frame {
                if self.accumulator >= self.step {
                    log::warn!("Update loop fell behind, dropping {:?} of simulation time", self.accumulator);
                    self.accumulator = Duration::ZERO;
                }
                break;
            }
        }
        self.total_ticks += u64::from(due);
        due
    }

    /// Fraction of a tick banked but not yet simulated, in `[0, 1)`.
    pub fn interpolation(&self) -> f32 {
        if self.step.is_zero() {
            return 0.0;
        }
        self.accumulator.as_secs_f32() / self.step.as_secs_f32()
    }

    /// Length of one tick
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Total number of ticks paid out
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}
