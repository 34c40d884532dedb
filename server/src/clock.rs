//! Monotonic time source and precise sleep.
//!
//! Grounded on the teacher's own use of `std::time::Instant`/`Duration`
//! throughout `client_manager.rs` and `network.rs`, and on
//! `examples/original_source/src/cptime.h`'s sleep contract ("if the
//! underlying syscall is interrupted, sleep the remainder"). On Unix,
//! `std::thread::sleep` is built on `nanosleep` and already retries across
//! `EINTR` internally, so this implementation does not need its own retry
//! loop for correctness — but it still re-measures and re-sleeps the
//! shortfall if `sleep` ever returns early on some platform, so the
//! documented contract holds everywhere.

use std::time::{Duration, Instant};

/// A monotonic clock. Stateless; every method is a thin wrapper over
/// `std::time::Instant`/`std::thread::sleep`, kept behind a named type so
/// call sites read as "the clock" rather than scattering `Instant::now()`
/// throughout the main loop.
pub struct Clock;

impl Clock {
    /// Opaque monotonic timestamp.
    pub fn now() -> Instant {
        Instant::now()
    }

    /// Seconds elapsed from `earlier` to `later`.
    pub fn elapsed(earlier: Instant, later: Instant) -> f64 {
        later.saturating_duration_since(earlier).as_secs_f64()
    }

    /// Sleeps for `seconds`, re-sleeping any shortfall if the OS primitive
    /// returns early. A non-positive duration is a no-op.
    pub fn sleep(seconds: f64) {
        if seconds <= 0.0 {
            return;
        }
        let target = Duration::from_secs_f64(seconds);
        let start = Instant::now();
        let mut remaining = target;
        loop {
            std::thread::sleep(remaining);
            let slept = start.elapsed();
            if slept >= target {
                return;
            }
            remaining = target - slept;
        }
    }
}
