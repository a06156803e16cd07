//! Monotonic millisecond time source used for redraw debouncing.

/// A monotonic millisecond clock.
///
/// On the device this wraps the RTOS tick counter; the simulator uses
/// `std::time::Instant`. Values must never go backwards.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary fixed origin (usually boot).
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
