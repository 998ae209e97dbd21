//! Bounded progress reporting
//!
//! Progress events are emitted at 0%, every time cumulative progress crosses
//! a 5-percentage-point boundary, and at 100%, never per file, so a scan of
//! a huge library produces at most 21 progress events.

use core_runtime::{CoreEvent, EventBus, ScanEvent};

/// Emits `ScanEvent::Progress` on the bus in bounded increments.
#[derive(Debug)]
pub struct ProgressReporter {
    events: EventBus,
    last_bucket: Option<u8>,
}

/// Reporting granularity in percentage points.
const BUCKET_SIZE: u8 = 5;

impl ProgressReporter {
    pub fn new(events: EventBus) -> Self {
        Self {
            events,
            last_bucket: None,
        }
    }

    /// Emit the mandatory 0% event.
    pub fn start(&mut self) {
        self.last_bucket = Some(0);
        self.emit(0);
    }

    /// Report `processed` out of `total` items; emits only when a boundary
    /// is crossed.
    pub fn update(&mut self, processed: usize, total: usize) {
        if total == 0 {
            return;
        }

        let percent = ((processed * 100) / total).min(100) as u8;
        let bucket = percent / BUCKET_SIZE;

        if self.last_bucket.map_or(true, |last| bucket > last) {
            self.last_bucket = Some(bucket);
            self.emit(percent);
        }
    }

    /// Emit the mandatory 100% event (skipped if an update already reported
    /// exactly 100).
    pub fn finish(&mut self) {
        if self.last_bucket != Some(100 / BUCKET_SIZE) {
            self.last_bucket = Some(100 / BUCKET_SIZE);
            self.emit(100);
        }
    }

    fn emit(&self, percent: u8) {
        self.events
            .emit(CoreEvent::Scan(ScanEvent::Progress { percent }))
            .ok();
    }
}
