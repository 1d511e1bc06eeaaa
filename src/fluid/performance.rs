use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Stage timings of one `update` call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub advect_us: u64,
    pub diffuse_us: u64,
    pub vorticity_us: u64,
    pub buoyancy_us: u64,
    pub pressure_us: u64,
    pub project_us: u64,
    pub density_us: u64,
    pub total_us: u64,
}

/// Times consecutive stages of a frame
pub(crate) struct StageTimer {
    frame_start: Instant,
    stage_start: Instant,
}

impl StageTimer {
    pub(crate) fn start() -> Self {
        let now = Instant::now();
        Self {
            frame_start: now,
            stage_start: now,
        }
    }

    /// Microseconds since the previous lap
    pub(crate) fn lap(&mut self) -> u64 {
        let now = Instant::now();
        let elapsed = now - self.stage_start;
        self.stage_start = now;
        elapsed.as_micros() as u64
    }

    pub(crate) fn total(&self) -> u64 {
        self.frame_start.elapsed().as_micros() as u64
    }
}

/// Averaged timings over the recent history
#[derive(Debug, Clone, Default)]
pub struct FluidPerformanceMetrics {
    /// Average solver update time
    pub update_ms: f32,

    /// Average pressure solve time
    pub pressure_solve_ms: f32,

    /// Slowest update in the history
    pub worst_update_ms: f32,

    /// Frames in the history
    pub samples: usize,
}

/// Rolling performance monitor for the fluid solver
pub struct FluidPerformanceMonitor {
    history: VecDeque<FrameStats>,
    history_size: usize,
    frame_budget: Duration,
    current_metrics: FluidPerformanceMetrics,
}

impl Default for FluidPerformanceMonitor {
    fn default() -> Self {
        Self::new(120, Duration::from_micros(16_667))
    }
}

impl FluidPerformanceMonitor {
    pub fn new(history_size: usize, frame_budget: Duration) -> Self {
        Self {
            history: VecDeque::with_capacity(history_size),
            history_size: history_size.max(1),
            frame_budget,
            current_metrics: FluidPerformanceMetrics::default(),
        }
    }

    pub fn get_metrics(&self) -> &FluidPerformanceMetrics {
        &self.current_metrics
    }

    /// Compare the average update time against the frame budget
    pub fn check_performance(&self) -> PerformanceStatus {
        let budget_ms = self.frame_budget.as_secs_f32() * 1000.0;
        if self.current_metrics.update_ms <= budget_ms * 0.5 {
            PerformanceStatus::Good
        } else if self.current_metrics.update_ms <= budget_ms {
            PerformanceStatus::Acceptable
        } else {
            PerformanceStatus::Poor
        }
    }
}

/// Record one frame's stage timings
pub fn record_frame(monitor: &mut FluidPerformanceMonitor, stats: &FrameStats) {
    monitor.history.push_back(*stats);
    if monitor.history.len() > monitor.history_size {
        monitor.history.pop_front();
    }

    update_metrics(monitor);
}

fn update_metrics(monitor: &mut FluidPerformanceMonitor) {
    let samples = monitor.history.len();
    if samples == 0 {
        return;
    }

    let to_ms = |us: u64| us as f32 / 1000.0;
    let total: u64 = monitor.history.iter().map(|s| s.total_us).sum();
    let pressure: u64 = monitor.history.iter().map(|s| s.pressure_us).sum();
    let worst = monitor.history.iter().map(|s| s.total_us).max().unwrap_or(0);

    monitor.current_metrics = FluidPerformanceMetrics {
        update_ms: to_ms(total) / samples as f32,
        pressure_solve_ms: to_ms(pressure) / samples as f32,
        worst_update_ms: to_ms(worst),
        samples,
    };
}

/// Performance status
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerformanceStatus {
    Good,       // under half the frame budget
    Acceptable, // within the frame budget
    Poor,
}
