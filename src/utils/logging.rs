use log::{log_enabled, warn, Level};
use std::time::Instant;

/// Scoped timer that traces the start and end of a labelled section.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            let elapsed = self.start.elapsed();
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Warns when a pair is numerically touching but no manifold backs it.
///
/// Such pairs are reported as `free`; the warning makes the boundary case
/// visible to callers who run detection with a different margin.
pub fn warn_if_touching_without_manifold(pair: (usize, usize), distance: f32, tolerance: f32) {
    if distance.abs() <= tolerance {
        warn!(
            "pair ({}, {}) is within {:.2e} of contact but has no manifold; reporting as free",
            pair.0, pair.1, tolerance
        );
    }
}
