//! Progress reporting for dubbing runs.

use crate::pipeline::types::{Interval, SegmentReport};
use std::sync::Mutex;

/// Milestones of a run, in the order they occur.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Segmentation finished.
    Segmented { count: usize, total_ms: u64 },
    /// A worker picked up a segment.
    SegmentStarted { index: usize, interval: Interval },
    /// A segment was transformed and aligned (or replaced by silence).
    SegmentFinished { report: SegmentReport },
    CompositingStarted,
    CompositingFinished { duration_ms: u64 },
}

/// Receives progress events. Called from worker tasks, so it must be cheap.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Observer that logs each event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Segmented { count, total_ms } => {
                log::info!("Found {} speech segment(s) in {} ms of audio", count, total_ms);
            }
            ProgressEvent::SegmentStarted { index, interval } => {
                log::debug!("Segment {} started ({})", index, interval);
            }
            ProgressEvent::SegmentFinished { report } => {
                if report.is_degraded() {
                    let reasons: Vec<String> =
                        report.degradations.iter().map(|d| d.to_string()).collect();
                    log::info!(
                        "Segment {} finished ({}) with fallbacks: {}",
                        report.index,
                        report.interval,
                        reasons.join("; ")
                    );
                } else {
                    log::info!(
                        "Segment {} finished ({}): {:?}",
                        report.index,
                        report.interval,
                        report.translated_text
                    );
                }
            }
            ProgressEvent::CompositingStarted => log::info!("Compositing timeline"),
            ProgressEvent::CompositingFinished { duration_ms } => {
                log::info!("Timeline complete ({} ms)", duration_ms);
            }
        }
    }
}

/// Observer that records every event (for tests).
#[derive(Debug, Default)]
pub struct CollectorObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectorObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressObserver for CollectorObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
