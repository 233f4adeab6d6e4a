//! Vector-unit strategy: the native lane width and the chunked kernels every
//! backend provides.

use std::fmt;
use std::str::FromStr;

use crate::error::KernelError;

/// Hardware vector backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Backend {
    /// Emulated vector register of configurable width, available everywhere
    Portable,
    /// ARMv8 Advanced SIMD (128-bit, 4 f32 lanes)
    Neon,
    /// AVX2 + FMA (256-bit, 8 f32 lanes)
    Avx2Fma,
}

impl Backend {
    /// Every backend, lowest preference first.
    pub const ALL: [Backend; 3] = [Backend::Portable, Backend::Neon, Backend::Avx2Fma];

    /// Canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Backend::Portable => "portable",
            Backend::Neon => "neon",
            Backend::Avx2Fma => "avx2",
        }
    }

    /// Whether the running CPU can execute this backend.
    pub fn is_available(self) -> bool {
        match self {
            Backend::Portable => true,
            Backend::Neon => {
                #[cfg(target_arch = "aarch64")]
                {
                    std::arch::is_aarch64_feature_detected!("neon")
                }
                #[cfg(not(target_arch = "aarch64"))]
                {
                    false
                }
            }
            Backend::Avx2Fma => {
                #[cfg(target_arch = "x86_64")]
                {
                    is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
                }
                #[cfg(not(target_arch = "x86_64"))]
                {
                    false
                }
            }
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portable" | "scalar" => Ok(Backend::Portable),
            "neon" => Ok(Backend::Neon),
            "avx2" | "avx2fma" | "avx2+fma" => Ok(Backend::Avx2Fma),
            other => Err(KernelError::UnknownBackend(other.to_string())),
        }
    }
}

/// A hardware (or emulated) vector unit.
///
/// The raw kernels take pointers rather than slices so that `dst` and `src`
/// may name the same buffer. Each chunk's input is fully loaded before that
/// chunk's output is stored, which makes same-buffer calls well defined.
pub trait VectorUnit {
    /// Which backend this is.
    fn backend(&self) -> Backend;

    /// Maximum number of binary32 lanes processed per chunk.
    fn native_width(&self) -> usize;

    /// `dst[i] = exp(src[i] - offset)` for `i < n`; returns the sum of the
    /// written values, accumulated lane-wise in the same pass.
    ///
    /// # Safety
    ///
    /// `src` must be valid for `n` reads and `dst` for `n` writes. The two may
    /// be equal but must not otherwise overlap. The caller is responsible for
    /// round-to-nearest being the active rounding mode.
    unsafe fn exp_with_reduction_raw<const DEGREE: usize>(
        &self,
        dst: *mut f32,
        src: *const f32,
        offset: f32,
        n: usize,
    ) -> f32;

    /// `data[i] *= factor` for `i < n`.
    ///
    /// # Safety
    ///
    /// `data` must be valid for `n` reads and writes.
    unsafe fn scale_raw(&self, data: *mut f32, factor: f32, n: usize);

    /// Largest of the first `n` values; `NEG_INFINITY` when `n == 0`.
    ///
    /// # Safety
    ///
    /// `src` must be valid for `n` reads.
    unsafe fn max_raw(&self, src: *const f32, n: usize) -> f32;
}

/// Splits `n` elements into chunks of at most `vlmax`, yielding
/// `(start, vl)` with `vl = min(remaining, vlmax)`.
#[derive(Debug, Clone)]
pub struct Chunks {
    start: usize,
    remaining: usize,
    vlmax: usize,
}

impl Chunks {
    /// Chunk `n` elements by a native width of `vlmax` (treated as at least 1).
    pub fn new(n: usize, vlmax: usize) -> Self {
        Self {
            start: 0,
            remaining: n,
            vlmax: vlmax.max(1),
        }
    }
}

impl Iterator for Chunks {
    type Item = (usize, usize);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let vl = self.remaining.min(self.vlmax);
        let chunk = (self.start, vl);
        self.start += vl;
        self.remaining -= vl;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.remaining.div_ceil(self.vlmax);
        (len, Some(len))
    }
}

impl ExactSizeIterator for Chunks {}
