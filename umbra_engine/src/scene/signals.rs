use bitflags::bitflags;
use std::sync::{Mutex, PoisonError};

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SignalFlags: u32 {
        const ABORT = 1 << 0;
    }
}

/// Cross-thread signal flags. Set by whoever wants to cancel, polled by the render loop and integrators
#[derive(Debug, Default)]
pub struct Signals {
    flags: Mutex<SignalFlags>,
}

impl Signals {
    pub fn new() -> Self { Self::default() }

    /// Current flags
    pub fn get(&self) -> SignalFlags { *self.lock() }

    pub fn abort(&self) { self.lock().insert(SignalFlags::ABORT); }

    pub fn is_aborted(&self) -> bool { self.get().contains(SignalFlags::ABORT) }

    pub fn reset(&self) { *self.lock() = SignalFlags::empty(); }

    // The flags stay valid even if a holder panicked
    fn lock(&self) -> std::sync::MutexGuard<'_, SignalFlags> { self.flags.lock().unwrap_or_else(PoisonError::into_inner) }
}
