use std::time::Instant;

/// Authoritative anchor for local extrapolation: what the hub last said
/// the elapsed value was, and when we heard it.
///
/// A sync point is superseded wholesale by the next one, never merged.
#[derive(Debug, Clone, Copy)]
pub struct SyncPoint {
    pub captured_at: Instant,
    /// Elapsed seconds at the moment of capture.
    pub elapsed: f64,
    /// `false` freezes extrapolation (paused/stopped).
    pub running: bool,
}

/// Drift-corrected estimate of a quantity that advances monotonically
/// between sparse authoritative updates.
///
/// Only linear extrapolation from the most recent sync point is allowed:
/// every `resync` discards all prior history, so the estimate can never
/// accumulate error across seeks or status updates, and never runs faster
/// or slower than true time.
#[derive(Debug, Default)]
pub struct ElapsedEstimator {
    point: Option<SyncPoint>,
    duration: Option<f64>,
}

impl ElapsedEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current sync point. Always authoritative.
    pub fn resync(&mut self, point: SyncPoint) {
        self.point = Some(point);
    }

    /// Upper clamp bound for extrapolated values, when known.
    pub fn set_duration(&mut self, duration: Option<f64>) {
        self.duration = duration;
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn running(&self) -> bool {
        self.point.is_some_and(|point| point.running)
    }

    /// Current estimate, or `None` before the first sync point.
    ///
    /// While paused the anchored value is returned unchanged; while
    /// running it advances linearly with `now`, clamped to
    /// `[0, duration]` when a duration is known.
    pub fn current_value(&self, now: Instant) -> Option<f64> {
        let point = self.point?;

        if !point.running {
            return Some(point.elapsed);
        }

        let value = point.elapsed + now.saturating_duration_since(point.captured_at).as_secs_f64();
        Some(match self.duration {
            Some(duration) => value.clamp(0.0, duration),
            None => value.max(0.0),
        })
    }
}
