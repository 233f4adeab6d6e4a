//! # Vector Dispatch: Runtime Width Resolution
//!
//! Resolves the vector unit ONCE and routes every kernel call through it.
//! Feature detection never runs inside the kernels themselves.
//!
//! ## Architecture
//!
//! - `VectorCapabilities::detect()` picks the widest unit the CPU supports
//! - `VectorCapabilities::with_backend()` pins a specific unit (config, tests)
//! - A process-global `OnceLock` backs the free functions in this crate
//! - Each exponential call installs round-to-nearest for its own duration

use std::sync::OnceLock;

use tracing::{info, trace};

use crate::backend::{Backend, VectorUnit};
use crate::error::{KernelError, Result};
use crate::exp::{assert_degree, POLY_DEGREE};
use crate::portable::{PortableUnit, DEFAULT_PORTABLE_LANES};
use crate::rounding::RoundingModeGuard;

#[cfg(target_arch = "aarch64")]
use crate::arm::NeonUnit;
#[cfg(target_arch = "x86_64")]
use crate::x86::Avx2Unit;

/// Global capabilities, resolved once.
static CAPABILITIES: OnceLock<VectorCapabilities> = OnceLock::new();

/// Concrete unit selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Portable(PortableUnit),
    #[cfg(target_arch = "x86_64")]
    Avx2(Avx2Unit),
    #[cfg(target_arch = "aarch64")]
    Neon(NeonUnit),
}

macro_rules! with_unit {
    ($unit:expr, $u:ident => $body:expr) => {
        match $unit {
            Unit::Portable($u) => $body,
            #[cfg(target_arch = "x86_64")]
            Unit::Avx2($u) => $body,
            #[cfg(target_arch = "aarch64")]
            Unit::Neon($u) => $body,
        }
    };
}

/// Vector capabilities resolved for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorCapabilities {
    unit: Unit,
}

impl VectorCapabilities {
    /// Detect the best available unit: AVX2+FMA, then NEON, then portable.
    pub fn detect() -> Self {
        let caps = Self::best_available();
        info!(
            backend = %caps.backend(),
            native_width = caps.native_width(),
            poly_degree = POLY_DEGREE,
            "vector dispatch initialized"
        );
        caps
    }

    fn best_available() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if let Some(unit) = Avx2Unit::detect() {
                return Self {
                    unit: Unit::Avx2(unit),
                };
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            if let Some(unit) = NeonUnit::detect() {
                return Self {
                    unit: Unit::Neon(unit),
                };
            }
        }
        Self {
            unit: Unit::Portable(PortableUnit::default()),
        }
    }

    /// Pin a specific backend. `portable_lanes` is only used by
    /// [`Backend::Portable`].
    pub fn with_backend(backend: Backend, portable_lanes: usize) -> Result<Self> {
        let unit = match backend {
            Backend::Portable => Unit::Portable(PortableUnit::new(portable_lanes)?),
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2Fma => {
                Unit::Avx2(Avx2Unit::detect().ok_or(KernelError::UnsupportedBackend(backend))?)
            }
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => {
                Unit::Neon(NeonUnit::detect().ok_or(KernelError::UnsupportedBackend(backend))?)
            }
            #[allow(unreachable_patterns)]
            other => return Err(KernelError::UnsupportedBackend(other)),
        };
        Ok(Self { unit })
    }

    /// Portable unit emulating `lanes` lanes.
    pub fn portable(lanes: usize) -> Result<Self> {
        Self::with_backend(Backend::Portable, lanes)
    }

    /// Every configuration usable on this CPU: each hardware backend plus the
    /// portable unit at its default width.
    pub fn available() -> Vec<Self> {
        Backend::ALL
            .iter()
            .filter_map(|&b| Self::with_backend(b, DEFAULT_PORTABLE_LANES).ok())
            .collect()
    }

    /// Selected backend.
    pub fn backend(&self) -> Backend {
        with_unit!(&self.unit, u => u.backend())
    }

    /// Maximum binary32 lanes per chunk.
    pub fn native_width(&self) -> usize {
        with_unit!(&self.unit, u => u.native_width())
    }

    /// `dst[i] = exp(src[i] - offset)`; returns `Σ dst[i]` accumulated in the
    /// same pass.
    ///
    /// # Panics
    ///
    /// Panics if `dst` and `src` differ in length.
    pub fn vector_exp_with_reduction(&self, dst: &mut [f32], src: &[f32], offset: f32) -> f32 {
        self.vector_exp_with_reduction_degree::<POLY_DEGREE>(dst, src, offset)
    }

    /// [`Self::vector_exp_with_reduction`] with an explicit polynomial degree
    /// (0..=6, checked at compile time).
    pub fn vector_exp_with_reduction_degree<const DEGREE: usize>(
        &self,
        dst: &mut [f32],
        src: &[f32],
        offset: f32,
    ) -> f32 {
        assert_degree::<DEGREE>();
        assert_eq!(
            dst.len(),
            src.len(),
            "destination and source slices have different lengths"
        );
        // SAFETY: both slices hold src.len() elements and cannot overlap.
        unsafe { self.exp_raw::<DEGREE>(dst.as_mut_ptr(), src.as_ptr(), offset, src.len()) }
    }

    /// Checked [`Self::vector_exp_with_reduction`].
    pub fn try_vector_exp_with_reduction(
        &self,
        dst: &mut [f32],
        src: &[f32],
        offset: f32,
    ) -> Result<f32> {
        if dst.len() != src.len() {
            return Err(KernelError::length_mismatch(dst.len(), src.len()));
        }
        Ok(self.vector_exp_with_reduction(dst, src, offset))
    }

    /// `data[i] = exp(data[i] - offset)`; returns the sum.
    pub fn vector_exp_with_reduction_inplace(&self, data: &mut [f32], offset: f32) -> f32 {
        let ptr = data.as_mut_ptr();
        // SAFETY: dst == src is permitted, chunks are consumed before stored.
        unsafe { self.exp_raw::<POLY_DEGREE>(ptr, ptr, offset, data.len()) }
    }

    unsafe fn exp_raw<const DEGREE: usize>(
        &self,
        dst: *mut f32,
        src: *const f32,
        offset: f32,
        n: usize,
    ) -> f32 {
        if n == 0 {
            return 0.0;
        }
        trace!(n, offset, backend = %self.backend(), "exp with reduction");
        let _rounding = RoundingModeGuard::nearest();
        with_unit!(&self.unit, u => u.exp_with_reduction_raw::<DEGREE>(dst, src, offset, n))
    }

    /// Largest element; `NEG_INFINITY` for an empty slice.
    pub fn vector_max(&self, src: &[f32]) -> f32 {
        // SAFETY: src is valid for src.len() reads.
        with_unit!(&self.unit, u => unsafe { u.max_raw(src.as_ptr(), src.len()) })
    }

    /// `data[i] *= factor`.
    pub fn vector_scale(&self, data: &mut [f32], factor: f32) {
        // SAFETY: data is valid for data.len() reads and writes.
        with_unit!(&self.unit, u => unsafe { u.scale_raw(data.as_mut_ptr(), factor, data.len()) })
    }
}

impl Default for VectorCapabilities {
    fn default() -> Self {
        Self::best_available()
    }
}

/// Global vector capabilities (detected on first call).
#[inline(always)]
pub fn capabilities() -> &'static VectorCapabilities {
    CAPABILITIES.get_or_init(VectorCapabilities::detect)
}

/// Detect eagerly. Call this at startup.
pub fn init() {
    let _ = capabilities();
}

/// Install specific capabilities as the global ones.
///
/// Fails if the global was already resolved, either by an earlier
/// `init_with` or by any kernel call.
pub fn init_with(caps: VectorCapabilities) -> Result<&'static VectorCapabilities> {
    CAPABILITIES
        .set(caps)
        .map_err(|_| KernelError::AlreadyInitialized)?;
    info!(
        backend = %caps.backend(),
        native_width = caps.native_width(),
        "vector dispatch pinned"
    );
    Ok(capabilities())
}

/// `dst[i] = exp(src[i] - offset)` on the global unit; returns the sum.
///
/// # Panics
///
/// Panics if `dst` and `src` differ in length.
#[inline(always)]
pub fn vector_exp_with_reduction(dst: &mut [f32], src: &[f32], offset: f32) -> f32 {
    capabilities().vector_exp_with_reduction(dst, src, offset)
}

/// [`vector_exp_with_reduction`] with a compile-time polynomial degree.
///
/// Degrees above [`MAX_POLY_DEGREE`](crate::MAX_POLY_DEGREE) do not build:
///
/// ```compile_fail
/// let src = [0.5f32; 4];
/// let mut dst = [0.0f32; 4];
/// vsoftmax_kernels::vector_exp_with_reduction_degree::<7>(&mut dst, &src, 0.0);
/// ```
///
/// ```
/// let src = [0.5f32; 4];
/// let mut dst = [0.0f32; 4];
/// let sum = vsoftmax_kernels::vector_exp_with_reduction_degree::<6>(&mut dst, &src, 0.0);
/// assert!((sum - 4.0 * 0.5f32.exp()).abs() < 1e-5);
/// ```
#[inline(always)]
pub fn vector_exp_with_reduction_degree<const DEGREE: usize>(
    dst: &mut [f32],
    src: &[f32],
    offset: f32,
) -> f32 {
    capabilities().vector_exp_with_reduction_degree::<DEGREE>(dst, src, offset)
}

/// Checked [`vector_exp_with_reduction`].
#[inline(always)]
pub fn try_vector_exp_with_reduction(dst: &mut [f32], src: &[f32], offset: f32) -> Result<f32> {
    capabilities().try_vector_exp_with_reduction(dst, src, offset)
}

/// In-place [`vector_exp_with_reduction`].
#[inline(always)]
pub fn vector_exp_with_reduction_inplace(data: &mut [f32], offset: f32) -> f32 {
    capabilities().vector_exp_with_reduction_inplace(data, offset)
}

/// Largest element on the global unit.
#[inline(always)]
pub fn vector_max(src: &[f32]) -> f32 {
    capabilities().vector_max(src)
}

/// Scale in place on the global unit.
#[inline(always)]
pub fn vector_scale(data: &mut [f32], factor: f32) {
    capabilities().vector_scale(data, factor)
}
