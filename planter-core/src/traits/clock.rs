//! Time source trait

/// Monotonic millisecond clock
///
/// The controller never compares timestamps from different clocks, so any
/// epoch works as long as it does not go backwards.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed epoch
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
