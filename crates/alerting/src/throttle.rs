//! Emission throttle

use tracing::debug;

use crate::AlertError;

/// Allows at most one emission per `interval` seconds.
///
/// Time is supplied by the caller (detection worker clock), which keeps the
/// throttle deterministic under test.
#[derive(Debug, Clone)]
pub struct EmitThrottle {
    interval: f64,
    last_emit: Option<f64>,
}

impl EmitThrottle {
    /// Create a throttle; `interval` is in seconds and must be finite and ≥ 0
    pub fn new(interval: f64) -> Result<Self, AlertError> {
        if !interval.is_finite() || interval < 0.0 {
            return Err(AlertError::Interval(interval));
        }
        Ok(Self {
            interval,
            last_emit: None,
        })
    }

    /// Whether an emission is allowed at `now`
    pub fn ready(&self, now: f64) -> bool {
        match self.last_emit {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    /// Record an emission at `now`
    pub fn mark(&mut self, now: f64) {
        self.last_emit = Some(now);
    }

    /// `ready` + `mark` in one step
    pub fn try_acquire(&mut self, now: f64) -> bool {
        if !self.ready(now) {
            debug!("Emission suppressed: {:.3}s since last", now - self.last_emit.unwrap_or(now));
            return false;
        }
        self.mark(now);
        true
    }
}
