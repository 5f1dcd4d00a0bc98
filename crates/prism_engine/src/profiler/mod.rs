//! CPU zone profiling
//!
//! Named zones are timed with scoped guards and collected per frame; the
//! [`ui::ProfilerUi`] aggregates them into running statistics and renders a
//! terminal summary. Collection and rendering each take a coarse lock over
//! the shared state, so a render thread and a reporting thread may run
//! concurrently. The rest of the engine never depends on this module; the
//! `profiler` cargo feature only controls whether the application driver
//! hooks it into the main loop.

use std::sync::Mutex;
use std::time::Instant;

pub mod ui;

pub use ui::ProfilerUi;

/// One timed zone occurrence within a frame
#[derive(Debug, Clone)]
pub struct ZoneEvent {
    /// Zone name
    pub name: String,
    /// Measured duration in milliseconds
    pub duration_ms: f64,
    /// Name of the thread the zone ran on
    pub thread: String,
}

/// Running statistics for one zone across frames
#[derive(Debug, Clone, Default)]
pub struct ZoneStats {
    /// Number of recorded occurrences
    pub count: u64,
    /// Largest recorded duration in milliseconds
    pub max_ms: f64,
    total_ms: f64,
}

impl ZoneStats {
    /// Fold one occurrence into the running statistics.
    pub fn add(&mut self, duration_ms: f64) {
        self.count += 1;
        self.total_ms += duration_ms;
        if duration_ms > self.max_ms {
            self.max_ms = duration_ms;
        }
    }

    /// Average duration in milliseconds.
    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Per-frame zone event collector
#[derive(Debug, Default)]
pub struct Profiler {
    current_frame: Mutex<Vec<ZoneEvent>>,
}

impl Profiler {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a zone; the measurement is recorded when the returned
    /// guard drops.
    pub fn zone(&self, name: &str) -> ZoneGuard<'_> {
        ZoneGuard {
            profiler: self,
            name: name.to_string(),
            started: Instant::now(),
        }
    }

    /// Drain the events collected since the previous frame boundary.
    pub fn end_frame(&self) -> Vec<ZoneEvent> {
        let mut frame = self.current_frame.lock().expect("profiler lock poisoned");
        std::mem::take(&mut *frame)
    }

    fn record(&self, event: ZoneEvent) {
        let mut frame = self.current_frame.lock().expect("profiler lock poisoned");
        frame.push(event);
    }
}

/// Scoped zone timer; records its measurement into the profiler on drop
pub struct ZoneGuard<'a> {
    profiler: &'a Profiler,
    name: String,
    started: Instant,
}

impl Drop for ZoneGuard<'_> {
    fn drop(&mut self) {
        let duration_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let thread = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();
        self.profiler.record(ZoneEvent {
            name: std::mem::take(&mut self.name),
            duration_ms,
            thread,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_guard_records_on_drop() {
        let profiler = Profiler::new();
        {
            let _zone = profiler.zone("update");
        }

        let events = profiler.end_frame();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "update");
        assert!(events[0].duration_ms >= 0.0);
    }

    #[test]
    fn test_end_frame_drains_events() {
        let profiler = Profiler::new();
        drop(profiler.zone("a"));
        drop(profiler.zone("b"));

        assert_eq!(profiler.end_frame().len(), 2);
        assert!(profiler.end_frame().is_empty());
    }

    #[test]
    fn test_stats_track_count_avg_max() {
        let mut stats = ZoneStats::default();
        stats.add(1.0);
        stats.add(3.0);

        assert_eq!(stats.count, 2);
        assert!((stats.avg_ms() - 2.0).abs() < f64::EPSILON);
        assert!((stats.max_ms - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats_average_is_zero() {
        let stats = ZoneStats::default();
        assert_eq!(stats.avg_ms(), 0.0);
    }

    #[test]
    fn test_recording_from_another_thread() {
        let profiler = Profiler::new();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                drop(profiler.zone("worker"));
            });
        });
        drop(profiler.zone("main"));

        let events = profiler.end_frame();
        assert_eq!(events.len(), 2);
    }
}
