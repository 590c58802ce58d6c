//! Per-interval statistics of what happened to the posted frames.
//!
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use tokio::{task::JoinHandle, time::interval};

pub static STATS: FrameStats = FrameStats::new();

/// Result of running the pipeline on one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    NoHand,
    EmptyCrop,
    Classified,
}

#[derive(Default)]
pub struct FrameStats {
    received: AtomicU64,
    no_hand: AtomicU64,
    empty_crop: AtomicU64,
    classified: AtomicU64,
    typed: AtomicU64,
}

/// Counts taken out of [`FrameStats`] for one interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSummary {
    pub received: u64,
    pub no_hand: u64,
    pub empty_crop: u64,
    pub classified: u64,
    pub typed: u64,
}

impl FrameStats {
    pub const fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            no_hand: AtomicU64::new(0),
            empty_crop: AtomicU64::new(0),
            classified: AtomicU64::new(0),
            typed: AtomicU64::new(0),
        }
    }

    pub fn tick_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tick_typed(&self) {
        self.typed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record(&self, outcome: FrameOutcome) {
        let counter = match outcome {
            FrameOutcome::NoHand => &self.no_hand,
            FrameOutcome::EmptyCrop => &self.empty_crop,
            FrameOutcome::Classified => &self.classified,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read and reset all counters.
    pub fn take(&self) -> FrameSummary {
        FrameSummary {
            received: self.received.swap(0, Ordering::Relaxed),
            no_hand: self.no_hand.swap(0, Ordering::Relaxed),
            empty_crop: self.empty_crop.swap(0, Ordering::Relaxed),
            classified: self.classified.swap(0, Ordering::Relaxed),
            typed: self.typed.swap(0, Ordering::Relaxed),
        }
    }
}

impl FrameSummary {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} received, {} without hand, {} empty crops, {} classified, {} typed",
            self.received, self.no_hand, self.empty_crop, self.classified, self.typed
        )
    }
}

/// Log a summary of [`STATS`] every 2 seconds, skipping idle intervals.
pub fn spawn_stats_logger() -> JoinHandle<()> {
    tokio::spawn(async {
        let mut log_interval = interval(Duration::from_secs(2));
        log_interval.tick().await;

        loop {
            let start = Instant::now();
            log_interval.tick().await;

            let summary = STATS.take();
            if summary.is_idle() {
                continue;
            }

            let fps = summary.received as f32 / start.elapsed().as_secs_f32();
            log::info!("Frames: {summary} ({fps:.2} fps)");
        }
    })
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_take_resets() {
        let stats = FrameStats::new();
        for _ in 0..3 {
            stats.tick_received();
        }
        stats.record(FrameOutcome::NoHand);
        stats.record(FrameOutcome::EmptyCrop);
        stats.record(FrameOutcome::Classified);
        stats.tick_typed();

        let summary = stats.take();
        assert_eq!(
            summary,
            FrameSummary {
                received: 3,
                no_hand: 1,
                empty_crop: 1,
                classified: 1,
                typed: 1,
            }
        );
        assert_eq!(
            summary.to_string(),
            "3 received, 1 without hand, 1 empty crops, 1 classified, 1 typed"
        );

        assert!(stats.take().is_idle());
    }
}
