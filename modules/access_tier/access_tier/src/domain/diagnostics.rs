//! Default diagnostics sink: structured warnings, throttled per signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use access_tier_sdk::{DiagnosticsSink, Signal, SignalFailure};

/// Reports degraded signals through `tracing`.
///
/// A backend that keeps failing would otherwise emit one warning per
/// resolution; each signal gets its own throttle window and suppressed
/// reports drop to `debug`.
pub struct TracingDiagnostics {
    roles: SignalThrottle,
    entitlement: SignalThrottle,
    eligibility: SignalThrottle,
    display_number: SignalThrottle,
}

impl TracingDiagnostics {
    #[must_use]
    pub fn new(throttle: Duration) -> Self {
        let epoch = Instant::now();
        Self {
            roles: SignalThrottle::new(epoch, throttle),
            entitlement: SignalThrottle::new(epoch, throttle),
            eligibility: SignalThrottle::new(epoch, throttle),
            display_number: SignalThrottle::new(epoch, throttle),
        }
    }

    fn throttle(&self, signal: Signal) -> &SignalThrottle {
        match signal {
            Signal::Roles => &self.roles,
            Signal::Entitlement => &self.entitlement,
            Signal::Eligibility => &self.eligibility,
            Signal::DisplayNumber => &self.display_number,
        }
    }
}

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&self, failure: &SignalFailure) {
        let throttle = self.throttle(failure.signal);
        if throttle.admit() {
            tracing::warn!(
                signal = %failure.signal,
                generation = %failure.generation,
                user_id = %failure.user,
                error = %failure.error,
                suppressed = throttle.take_suppressed(),
                "Signal lookup failed, degrading to most restrictive value"
            );
        } else {
            tracing::debug!(
                signal = %failure.signal,
                generation = %failure.generation,
                error = %failure.error,
                "Signal lookup failed (warning throttled)"
            );
        }
    }
}

/// Lock-free "at most once per window" gate.
struct SignalThrottle {
    epoch: Instant,
    window_ms: u64,
    /// Earliest time of the next admitted report, in ms since `epoch`.
    next_ms: AtomicU64,
    suppressed: AtomicU64,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl SignalThrottle {
    fn new(epoch: Instant, window: Duration) -> Self {
        Self {
            epoch,
            window_ms: millis(window),
            next_ms: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
        }
    }

    /// Only one concurrent caller per window wins the compare-exchange.
    fn admit(&self) -> bool {
        let now = millis(self.epoch.elapsed());
        let next = self.next_ms.load(Ordering::Relaxed);
        let admitted = now >= next
            && self
                .next_ms
                .compare_exchange(
                    next,
                    now.saturating_add(self.window_ms),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                )
                .is_ok();
        if !admitted {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
        }
        admitted
    }

    fn take_suppressed(&self) -> u64 {
        self.suppressed.swap(0, Ordering::Relaxed)
    }
}
