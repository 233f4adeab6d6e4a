//! # vsoftmax Kernels
//!
//! Vectorized binary32 softmax built on a range-reduced exponential whose
//! lane width is discovered at runtime.
//!
//! ## Architecture
//!
//! - **RangeReducedExp**: `exp(x - offset)` per element via argument
//!   reduction, a minimax polynomial and exponent-field reconstruction, with
//!   the running sum accumulated lane-wise in the same pass
//! - **SoftmaxNormalizer**: one reciprocal of that sum, then a scaling pass
//! - **VectorUnit**: AVX2+FMA, NEON, or a portable emulated register,
//!   selected once per process
//!
//! ## Example
//!
//! ```rust
//! let mut logits = vec![1.0f32, 2.0, 3.0, 4.0];
//! vsoftmax_kernels::softmax(&mut logits);
//! let total: f32 = logits.iter().sum();
//! assert!((total - 1.0).abs() < 1e-5);
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod dispatch;
pub mod error;
pub mod exp;
pub mod portable;
pub mod rounding;
pub mod softmax;

#[cfg(target_arch = "aarch64")]
pub mod arm;
#[cfg(target_arch = "x86_64")]
pub mod x86;

pub use backend::{Backend, Chunks, VectorUnit};
pub use dispatch::{
    capabilities, init, init_with, try_vector_exp_with_reduction, vector_exp_with_reduction,
    vector_exp_with_reduction_degree, vector_exp_with_reduction_inplace, vector_max,
    vector_scale, VectorCapabilities,
};
pub use error::{KernelError, Result};
pub use exp::{exp_approx, ulp_distance, EXP_MAX_ULPS, MAX_POLY_DEGREE, POLY_DEGREE};
pub use portable::{PortableUnit, DEFAULT_PORTABLE_LANES, MAX_PORTABLE_LANES};
pub use rounding::{RoundingMode, RoundingModeGuard};
pub use softmax::{softmax, softmax_to, stable_softmax};
