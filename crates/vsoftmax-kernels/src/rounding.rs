//! Scoped floating-point rounding mode.
//!
//! The AVX2 range reduction converts `x / ln2` to an integer with
//! `cvtps2dq`, which rounds according to MXCSR. Round-to-nearest-even must be
//! active for the reduced argument to land in `[-ln2/2, ln2/2]`, so every
//! kernel call installs it for its own duration and restores the caller's
//! mode afterwards.
//!
//! The control register is per thread, hence the guard is `!Send`.

use std::marker::PhantomData;

/// IEEE-754 rounding direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// Round to nearest, ties to even
    Nearest,
    /// Round toward negative infinity
    Down,
    /// Round toward positive infinity
    Up,
    /// Round toward zero
    TowardZero,
}

#[cfg(target_arch = "x86_64")]
mod mxcsr {
    use super::RoundingMode;

    /// MXCSR rounding-control field (bits 13..14).
    pub const ROUNDING_MASK: u32 = 0x6000;

    #[allow(deprecated)]
    pub fn read() -> u32 {
        // SAFETY: reading MXCSR has no side effects; SSE is baseline on x86_64.
        unsafe {
            std::arch::x86_64::_mm_getcsr()
        }
    }

    #[allow(deprecated)]
    pub fn write(value: u32) {
        // SAFETY: only the rounding-control and previously saved bits are written.
        unsafe {
            std::arch::x86_64::_mm_setcsr(value)
        }
    }

    pub fn bits(mode: RoundingMode) -> u32 {
        match mode {
            RoundingMode::Nearest => 0x0000,
            RoundingMode::Down => 0x2000,
            RoundingMode::Up => 0x4000,
            RoundingMode::TowardZero => 0x6000,
        }
    }

    pub fn mode(csr: u32) -> RoundingMode {
        match csr & ROUNDING_MASK {
            0x0000 => RoundingMode::Nearest,
            0x2000 => RoundingMode::Down,
            0x4000 => RoundingMode::Up,
            _ => RoundingMode::TowardZero,
        }
    }
}

impl RoundingMode {
    /// Rounding mode of the calling thread's vector control register.
    ///
    /// `None` on targets whose kernels use explicitly-rounding conversions
    /// and therefore keep no tracked control state.
    pub fn current() -> Option<RoundingMode> {
        #[cfg(target_arch = "x86_64")]
        {
            Some(mxcsr::mode(mxcsr::read()))
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            None
        }
    }
}

/// Installs a rounding mode for its lifetime and restores the previous
/// control state on drop.
#[derive(Debug)]
#[must_use = "the previous rounding mode is restored when the guard is dropped"]
pub struct RoundingModeGuard {
    #[cfg(target_arch = "x86_64")]
    saved: u32,
    changed: bool,
    _not_send: PhantomData<*const ()>,
}

impl RoundingModeGuard {
    /// Select round-to-nearest-even for the current scope.
    pub fn nearest() -> Self {
        Self::with_mode(RoundingMode::Nearest)
    }

    /// Select `mode` for the current scope.
    ///
    /// No-op on targets without a tracked control register.
    pub fn with_mode(mode: RoundingMode) -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            let saved = mxcsr::read();
            let wanted = (saved & !mxcsr::ROUNDING_MASK) | mxcsr::bits(mode);
            let changed = wanted != saved;
            if changed {
                tracing::trace!(from = ?mxcsr::mode(saved), to = ?mode, "switching rounding mode");
                mxcsr::write(wanted);
            }
            Self {
                saved,
                changed,
                _not_send: PhantomData,
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let _ = mode;
            Self {
                changed: false,
                _not_send: PhantomData,
            }
        }
    }

    /// Whether constructing the guard modified the control register.
    pub fn changed(&self) -> bool {
        self.changed
    }
}

impl Drop for RoundingModeGuard {
    fn drop(&mut self) {
        if self.changed {
            #[cfg(target_arch = "x86_64")]
            {
                tracing::trace!(to = ?mxcsr::mode(self.saved), "restoring rounding mode");
                mxcsr::write(self.saved);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_is_default() {
        let guard = RoundingModeGuard::nearest();
        assert!(!guard.changed());
        #[cfg(target_arch = "x86_64")]
        assert_eq!(RoundingMode::current(), Some(RoundingMode::Nearest));
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_guards_nest_and_restore() {
        {
            let outer = RoundingModeGuard::with_mode(RoundingMode::TowardZero);
            assert!(outer.changed());
            assert_eq!(RoundingMode::current(), Some(RoundingMode::TowardZero));
            {
                let inner = RoundingModeGuard::nearest();
                assert!(inner.changed());
                assert_eq!(RoundingMode::current(), Some(RoundingMode::Nearest));
            }
            assert_eq!(RoundingMode::current(), Some(RoundingMode::TowardZero));
        }
        assert_eq!(RoundingMode::current(), Some(RoundingMode::Nearest));
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_mode_bits_roundtrip() {
        for mode in [
            RoundingMode::Nearest,
            RoundingMode::Down,
            RoundingMode::Up,
            RoundingMode::TowardZero,
        ] {
            assert_eq!(mxcsr::mode(mxcsr::bits(mode)), mode);
        }
    }
}
