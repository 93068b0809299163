//! Global configuration for kernel runtime behavior.
//!
//! This module provides thread-safe global configuration that affects how
//! invariant corruption is handled, without adding overhead to the hot
//! collision-resolution path.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag controlling how [`crate::error::Error::Corruption`] is
/// surfaced.
///
/// In the default strict mode, a walker/mask overlap of more than one
/// position aborts the step with `Err(Error::Corruption)`. In permissive
/// mode the overlap is still logged via `tracing::error!` but the step
/// proceeds, for callers that want to keep a long-running simulation alive
/// in the face of an out-of-band state mutation rather than treat it as
/// fatal. Production code should run in the default, strict mode.
static PERMISSIVE_CORRUPTION: AtomicBool = AtomicBool::new(false);

/// Enable or disable permissive corruption mode.
///
/// The atomic load on the collision path has negligible overhead compared
/// to the interval arithmetic already being done there.
#[inline]
pub fn set_permissive_corruption(enabled: bool) {
    PERMISSIVE_CORRUPTION.store(enabled, Ordering::Release);
}

/// Check whether permissive corruption mode is enabled.
#[inline]
pub fn is_permissive_corruption() -> bool {
    PERMISSIVE_CORRUPTION.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_strict_mode() {
        set_permissive_corruption(false);
        assert!(!is_permissive_corruption());
    }

    #[test]
    #[serial]
    fn test_permissive_mode_round_trips() {
        set_permissive_corruption(true);
        assert!(is_permissive_corruption());
        set_permissive_corruption(false);
        assert!(!is_permissive_corruption());
    }
}
