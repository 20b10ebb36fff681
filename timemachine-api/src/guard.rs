use std::sync::atomic::{AtomicBool, Ordering};

/// Boolean in-flight flag: a second fetch is refused, never queued.
#[derive(Debug, Default)]
pub struct FetchGuard {
    in_flight: AtomicBool,
}

impl FetchGuard {
    /// Claim the flag. `None` when a fetch is already running.
    pub fn try_begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight {
                flag: &self.in_flight,
            })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases the flag on drop, whether the fetch succeeded or not.
#[derive(Debug)]
pub struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
