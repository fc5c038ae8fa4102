use crate::core::targets::RENDERER;
use crate::shared::ComponentRequirements;
use nonzero::nonzero;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// Requested thread count meaning "one per logical CPU"
pub const AUTO_THREADS: i32 = -1;

/// Host information the engine can't work out by itself
pub trait SystemInfo: ComponentRequirements {
    fn logical_threads(&self) -> usize;
}

/// [SystemInfo] for the machine we're running on
#[derive(Copy, Clone, Debug, Default)]
pub struct HostSystem;

impl SystemInfo for HostSystem {
    fn logical_threads(&self) -> usize { std::thread::available_parallelism().map_or(1, NonZeroUsize::get) }
}

/// Resolved worker counts for the two thread pools
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadCounts {
    pub render: NonZeroUsize,
    pub photons: NonZeroUsize,
}

impl Default for ThreadCounts {
    fn default() -> Self {
        Self {
            render: nonzero!(1_usize),
            photons: nonzero!(1_usize),
        }
    }
}

/// Turns a requested thread count into a real one. [AUTO_THREADS] asks `system`; other values are used as-is
pub fn resolve_threads(requested: i32, system: &dyn SystemInfo) -> NonZeroUsize {
    let resolved = match requested {
        AUTO_THREADS => {
            let detected = system.logical_threads();
            debug!(target: RENDERER, detected, "detected logical threads");
            detected
        }
        n if n > 0 => n as usize,
        n => {
            warn!(target: RENDERER, requested = n, "invalid thread count, using a single thread");
            1
        }
    };
    NonZeroUsize::new(resolved).unwrap_or(nonzero!(1_usize))
}
