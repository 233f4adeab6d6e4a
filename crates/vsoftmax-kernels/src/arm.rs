//! NEON vector unit (4 f32 lanes).
//!
//! `vcvtnq_s32_f32` rounds to nearest-even by itself, so this unit does not
//! depend on the FPCR rounding mode. NEON has no masked loads: the final
//! partial chunk goes through a zero-padded staging register and the running
//! sum is merged with a bit-select so inactive lanes keep their partial sums.

use std::arch::aarch64::*;
use std::ptr;

use crate::backend::{Backend, Chunks, VectorUnit};
use crate::exp::{coefficients, EXP_ARG_MAX, EXP_ARG_MIN, EXP_BIAS, INV_LN2, LN2};

/// Lanes per 128-bit register.
pub const NEON_LANES: usize = 4;

/// NEON vector unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeonUnit {
    _private: (),
}

impl NeonUnit {
    /// Returns the unit if NEON is available.
    pub fn detect() -> Option<Self> {
        if Backend::Neon.is_available() {
            Some(Self { _private: () })
        } else {
            None
        }
    }
}

impl VectorUnit for NeonUnit {
    fn backend(&self) -> Backend {
        Backend::Neon
    }

    fn native_width(&self) -> usize {
        NEON_LANES
    }

    unsafe fn exp_with_reduction_raw<const DEGREE: usize>(
        &self,
        dst: *mut f32,
        src: *const f32,
        offset: f32,
        n: usize,
    ) -> f32 {
        neon_exp_with_reduction::<DEGREE>(dst, src, offset, n)
    }

    unsafe fn scale_raw(&self, data: *mut f32, factor: f32, n: usize) {
        neon_scale(data, factor, n)
    }

    unsafe fn max_raw(&self, src: *const f32, n: usize) -> f32 {
        neon_max(src, n)
    }
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn active_lanes(vl: usize) -> uint32x4_t {
    let ids: [u32; NEON_LANES] = [0, 1, 2, 3];
    vcltq_u32(vld1q_u32(ids.as_ptr()), vdupq_n_u32(vl as u32))
}

#[target_feature(enable = "neon")]
#[inline]
unsafe fn exp_vector<const DEGREE: usize>(x: float32x4_t) -> float32x4_t {
    let coeffs = coefficients::<DEGREE>();

    let x = vminq_f32(vdupq_n_f32(EXP_ARG_MAX), x);
    let x = vmaxq_f32(vdupq_n_f32(EXP_ARG_MIN), x);

    // argument reduction
    let k = vcvtnq_s32_f32(vmulq_n_f32(x, INV_LN2));
    let fk = vcvtq_f32_s32(k);
    let r = vfmsq_f32(x, fk, vdupq_n_f32(LN2));

    // polynomial approximation of exp(r)
    let mut poly = vdupq_n_f32(coeffs[DEGREE + 1]);
    for &c in coeffs[..=DEGREE].iter().rev() {
        poly = vfmaq_f32(vdupq_n_f32(c), poly, r);
    }

    // reconstruction
    let biased = vaddq_s32(k, vdupq_n_s32(EXP_BIAS));
    let pow2k = vreinterpretq_f32_s32(vshlq_n_s32(biased, 23));
    vmulq_f32(poly, pow2k)
}

#[target_feature(enable = "neon")]
unsafe fn neon_exp_with_reduction<const DEGREE: usize>(
    dst: *mut f32,
    src: *const f32,
    offset: f32,
    n: usize,
) -> f32 {
    let voffset = vdupq_n_f32(offset);
    let mut vsum = vdupq_n_f32(0.0);

    for (start, vl) in Chunks::new(n, NEON_LANES) {
        if vl == NEON_LANES {
            let vexp = exp_vector::<DEGREE>(vsubq_f32(vld1q_f32(src.add(start)), voffset));
            vsum = vaddq_f32(vsum, vexp);
            vst1q_f32(dst.add(start), vexp);
        } else {
            let mut stage = [0.0f32; NEON_LANES];
            ptr::copy_nonoverlapping(src.add(start), stage.as_mut_ptr(), vl);
            let vexp = exp_vector::<DEGREE>(vsubq_f32(vld1q_f32(stage.as_ptr()), voffset));
            vsum = vbslq_f32(active_lanes(vl), vaddq_f32(vsum, vexp), vsum);
            vst1q_f32(stage.as_mut_ptr(), vexp);
            ptr::copy_nonoverlapping(stage.as_ptr(), dst.add(start), vl);
        }
    }

    vaddvq_f32(vsum)
}

#[target_feature(enable = "neon")]
unsafe fn neon_scale(data: *mut f32, factor: f32, n: usize) {
    for (start, vl) in Chunks::new(n, NEON_LANES) {
        let p = data.add(start);
        if vl == NEON_LANES {
            vst1q_f32(p, vmulq_n_f32(vld1q_f32(p), factor));
        } else {
            for lane in 0..vl {
                *p.add(lane) *= factor;
            }
        }
    }
}

#[target_feature(enable = "neon")]
unsafe fn neon_max(src: *const f32, n: usize) -> f32 {
    let mut vmax = vdupq_n_f32(f32::NEG_INFINITY);

    for (start, vl) in Chunks::new(n, NEON_LANES) {
        let mut stage = [f32::NEG_INFINITY; NEON_LANES];
        ptr::copy_nonoverlapping(src.add(start), stage.as_mut_ptr(), vl);
        vmax = vmaxq_f32(vmax, vld1q_f32(stage.as_ptr()));
    }

    vmaxvq_f32(vmax)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exp::{exp_approx, POLY_DEGREE};

    #[test]
    fn test_neon_matches_scalar_pipeline() {
        let Some(unit) = NeonUnit::detect() else {
            return;
        };
        for n in [0usize, 1, 3, 4, 5, 8, 11] {
            let src: Vec<f32> = (0..n).map(|i| (i as f32) * 0.37 - 3.0).collect();
            let mut dst = vec![0.0f32; n];
            let sum = unsafe {
                unit.exp_with_reduction_raw::<POLY_DEGREE>(dst.as_mut_ptr(), src.as_ptr(), 0.0, n)
            };
            for (got, &x) in dst.iter().zip(&src) {
                assert_eq!(*got, exp_approx::<POLY_DEGREE>(x), "n={} x={}", n, x);
            }
            let seq: f32 = dst.iter().sum();
            assert!((sum - seq).abs() <= seq.abs() * 1e-6);
        }
    }

    #[test]
    fn test_neon_scale_and_max_with_tail() {
        let Some(unit) = NeonUnit::detect() else {
            return;
        };
        let mut data: Vec<f32> = (0..7).map(|i| i as f32 - 10.0).collect();
        assert_eq!(unsafe { unit.max_raw(data.as_ptr(), 7) }, -4.0);
        unsafe { unit.scale_raw(data.as_mut_ptr(), 0.5, 7) };
        assert_eq!(data[6], -2.0);
    }
}
