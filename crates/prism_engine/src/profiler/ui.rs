//! Terminal rendering of aggregated zone statistics
//!
//! Fixed textual layout: a frame header, one line per timed zone with a
//! proportional bar plus duration and originating thread, then a table of
//! running per-zone statistics. Output goes to stdout; this is a diagnostic
//! display, not part of the logging stream.

use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Write};
use std::sync::Mutex;

use super::{ZoneEvent, ZoneStats};

/// Rolling frame history and aggregated statistics with a terminal renderer
///
/// `update` and `render` each hold one coarse lock over the whole table for
/// the full pass, and may be called from different threads.
pub struct ProfilerUi {
    inner: Mutex<UiState>,
}

struct UiState {
    history: VecDeque<Vec<ZoneEvent>>,
    aggregated: BTreeMap<String, ZoneStats>,
    max_history: usize,
    total_frames: u64,
}

impl ProfilerUi {
    /// Create a UI keeping at most `max_history` frames of zone events.
    pub fn new(max_history: usize) -> Self {
        Self {
            inner: Mutex::new(UiState {
                history: VecDeque::with_capacity(max_history),
                aggregated: BTreeMap::new(),
                max_history,
                total_frames: 0,
            }),
        }
    }

    /// Fold one frame's events into the history and running statistics.
    ///
    /// Call once per frame. Frames beyond the history bound evict the
    /// oldest entry; aggregated statistics are never evicted.
    pub fn update(&self, events: Vec<ZoneEvent>) {
        let mut state = self.inner.lock().expect("profiler UI lock poisoned");

        for event in &events {
            state
                .aggregated
                .entry(event.name.clone())
                .or_default()
                .add(event.duration_ms);
        }

        state.history.push_back(events);
        while state.history.len() > state.max_history {
            state.history.pop_front();
        }

        state.total_frames += 1;
    }

    /// Render the latest frame and the aggregated table to stdout.
    pub fn render(&self) {
        let _ = self.render_to(&mut io::stdout().lock());
    }

    /// Render into an arbitrary writer.
    pub fn render_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let state = self.inner.lock().expect("profiler UI lock poisoned");

        writeln!(out, "\r=== Frame {} ===", state.total_frames)?;

        if let Some(events) = state.history.back() {
            for event in events {
                let bar_length = (event.duration_ms * 10.0) as usize;
                let bar = "\u{2588}".repeat(bar_length);
                writeln!(
                    out,
                    "{:<20} {} {:.2} ms [{}]",
                    event.name, bar, event.duration_ms, event.thread
                )?;
            }
        }

        writeln!(out, "\n-- Aggregated Stats --")?;
        writeln!(out, "{:>20}{:>10}{:>10}{:>10}", "Zone", "Avg(ms)", "Max(ms)", "Count")?;
        for (name, stats) in &state.aggregated {
            writeln!(
                out,
                "{:>20}{:>10.2}{:>10.2}{:>10}",
                name,
                stats.avg_ms(),
                stats.max_ms,
                stats.count
            )?;
        }

        Ok(())
    }

    /// Total frames folded in so far.
    pub fn frame_count(&self) -> u64 {
        self.inner.lock().expect("profiler UI lock poisoned").total_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, duration_ms: f64) -> ZoneEvent {
        ZoneEvent {
            name: name.to_string(),
            duration_ms,
            thread: "main".to_string(),
        }
    }

    fn rendered(ui: &ProfilerUi) -> String {
        let mut buffer = Vec::new();
        ui.render_to(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_history_is_bounded() {
        let ui = ProfilerUi::new(3);
        for _ in 0..10 {
            ui.update(vec![event("frame", 1.0)]);
        }

        let state = ui.inner.lock().unwrap();
        assert_eq!(state.history.len(), 3);
        assert_eq!(state.total_frames, 10);
    }

    #[test]
    fn test_aggregation_survives_eviction() {
        let ui = ProfilerUi::new(1);
        ui.update(vec![event("update", 1.0)]);
        ui.update(vec![event("update", 3.0)]);

        let state = ui.inner.lock().unwrap();
        let stats = &state.aggregated["update"];
        assert_eq!(stats.count, 2);
        assert!((stats.avg_ms() - 2.0).abs() < f64::EPSILON);
        assert!((stats.max_ms - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_layout() {
        let ui = ProfilerUi::new(8);
        ui.update(vec![event("drawFrame", 1.5)]);

        let text = rendered(&ui);
        assert!(text.contains("=== Frame 1 ==="));
        assert!(text.contains("-- Aggregated Stats --"));
        assert!(text.contains("Zone"));
        assert!(text.contains("drawFrame"));
        assert!(text.contains("1.50 ms [main]"));
        // Proportional bar: 1.5 ms at 10 chars/ms.
        assert!(text.contains(&"\u{2588}".repeat(15)));
    }

    #[test]
    fn test_render_table_is_sorted_by_zone_name() {
        let ui = ProfilerUi::new(8);
        ui.update(vec![event("zebra", 1.0), event("alpha", 1.0)]);

        let text = rendered(&ui);
        let table = &text[text.find("-- Aggregated Stats --").unwrap()..];
        let alpha = table.find("alpha").unwrap();
        let zebra = table.find("zebra").unwrap();
        assert!(alpha < zebra);
    }

    #[test]
    fn test_update_and_render_from_different_threads() {
        let ui = ProfilerUi::new(8);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..50 {
                    ui.update(vec![event("worker", 0.1)]);
                }
            });
            for _ in 0..10 {
                let mut sink = Vec::new();
                ui.render_to(&mut sink).unwrap();
            }
        });

        assert_eq!(ui.frame_count(), 50);
    }
}
