//! AVX2 + FMA vector unit (8 f32 lanes).
//!
//! Full chunks use unaligned loads and stores. The final partial chunk uses
//! `maskload`/`maskstore` so inactive lanes are neither read nor written, and
//! the running sum is merged with `blendv` so inactive lanes keep their
//! partial sums.

use std::arch::x86_64::*;

use crate::backend::{Backend, Chunks, VectorUnit};
use crate::exp::{coefficients, EXP_ARG_MAX, EXP_ARG_MIN, EXP_BIAS, INV_LN2, LN2};

/// Lanes per 256-bit register.
pub const AVX2_LANES: usize = 8;

/// AVX2 + FMA vector unit. Only constructible when the CPU supports both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avx2Unit {
    _private: (),
}

impl Avx2Unit {
    /// Returns the unit if AVX2 and FMA are available.
    pub fn detect() -> Option<Self> {
        if Backend::Avx2Fma.is_available() {
            Some(Self { _private: () })
        } else {
            None
        }
    }
}

impl VectorUnit for Avx2Unit {
    fn backend(&self) -> Backend {
        Backend::Avx2Fma
    }

    fn native_width(&self) -> usize {
        AVX2_LANES
    }

    unsafe fn exp_with_reduction_raw<const DEGREE: usize>(
        &self,
        dst: *mut f32,
        src: *const f32,
        offset: f32,
        n: usize,
    ) -> f32 {
        // SAFETY: Avx2Unit only exists after AVX2+FMA were detected.
        avx2_exp_with_reduction::<DEGREE>(dst, src, offset, n)
    }

    unsafe fn scale_raw(&self, data: *mut f32, factor: f32, n: usize) {
        avx2_scale(data, factor, n)
    }

    unsafe fn max_raw(&self, src: *const f32, n: usize) -> f32 {
        avx2_max(src, n)
    }
}

/// All-ones in lanes `0..vl`, zero elsewhere.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn tail_mask(vl: usize) -> __m256i {
    let lane_ids = _mm256_setr_epi32(0, 1, 2, 3, 4, 5, 6, 7);
    _mm256_cmpgt_epi32(_mm256_set1_epi32(vl as i32), lane_ids)
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum(v: __m256) -> f32 {
    let hi = _mm256_extractf128_ps(v, 1);
    let lo = _mm256_castps256_ps128(v);
    let s128 = _mm_add_ps(lo, hi);
    let shuf = _mm_movehdup_ps(s128);
    let sums = _mm_add_ps(s128, shuf);
    let shuf2 = _mm_movehl_ps(sums, sums);
    _mm_cvtss_f32(_mm_add_ss(sums, shuf2))
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hmax(v: __m256) -> f32 {
    let hi = _mm256_extractf128_ps(v, 1);
    let lo = _mm256_castps256_ps128(v);
    let m128 = _mm_max_ps(lo, hi);
    let shuf = _mm_movehdup_ps(m128);
    let m2 = _mm_max_ps(m128, shuf);
    let shuf2 = _mm_movehl_ps(m2, m2);
    _mm_cvtss_f32(_mm_max_ss(m2, shuf2))
}

/// Lane-wise `exp(x)`. Requires round-to-nearest in MXCSR.
#[target_feature(enable = "avx2,fma")]
#[inline]
unsafe fn exp_vector<const DEGREE: usize>(x: __m256) -> __m256 {
    let coeffs = coefficients::<DEGREE>();

    // min/max return their second operand on NaN, so NaN lanes survive.
    let x = _mm256_min_ps(_mm256_set1_ps(EXP_ARG_MAX), x);
    let x = _mm256_max_ps(_mm256_set1_ps(EXP_ARG_MIN), x);

    // argument reduction
    let k = _mm256_cvtps_epi32(_mm256_mul_ps(x, _mm256_set1_ps(INV_LN2)));
    let fk = _mm256_cvtepi32_ps(k);
    let r = _mm256_fnmadd_ps(fk, _mm256_set1_ps(LN2), x);

    // polynomial approximation of exp(r)
    let mut poly = _mm256_set1_ps(coeffs[DEGREE + 1]);
    for &c in coeffs[..=DEGREE].iter().rev() {
        poly = _mm256_fmadd_ps(poly, r, _mm256_set1_ps(c));
    }

    // reconstruction
    let biased = _mm256_add_epi32(k, _mm256_set1_epi32(EXP_BIAS));
    let pow2k = _mm256_castsi256_ps(_mm256_slli_epi32(biased, 23));
    _mm256_mul_ps(poly, pow2k)
}

#[target_feature(enable = "avx2,fma")]
unsafe fn avx2_exp_with_reduction<const DEGREE: usize>(
    dst: *mut f32,
    src: *const f32,
    offset: f32,
    n: usize,
) -> f32 {
    let voffset = _mm256_set1_ps(offset);
    let mut vsum = _mm256_setzero_ps();

    for (start, vl) in Chunks::new(n, AVX2_LANES) {
        if vl == AVX2_LANES {
            let vx = _mm256_sub_ps(_mm256_loadu_ps(src.add(start)), voffset);
            let vexp = exp_vector::<DEGREE>(vx);
            vsum = _mm256_add_ps(vsum, vexp);
            _mm256_storeu_ps(dst.add(start), vexp);
        } else {
            let mask = tail_mask(vl);
            let vx = _mm256_sub_ps(_mm256_maskload_ps(src.add(start), mask), voffset);
            let vexp = exp_vector::<DEGREE>(vx);
            // Tail-undisturbed: lanes vl..8 keep their previous sums.
            vsum = _mm256_blendv_ps(vsum, _mm256_add_ps(vsum, vexp), _mm256_castsi256_ps(mask));
            _mm256_maskstore_ps(dst.add(start), mask, vexp);
        }
    }

    hsum(vsum)
}

#[target_feature(enable = "avx2,fma")]
unsafe fn avx2_scale(data: *mut f32, factor: f32, n: usize) {
    let vfactor = _mm256_set1_ps(factor);

    for (start, vl) in Chunks::new(n, AVX2_LANES) {
        let ptr = data.add(start);
        if vl == AVX2_LANES {
            _mm256_storeu_ps(ptr, _mm256_mul_ps(_mm256_loadu_ps(ptr), vfactor));
        } else {
            let mask = tail_mask(vl);
            let row = _mm256_mul_ps(_mm256_maskload_ps(ptr, mask), vfactor);
            _mm256_maskstore_ps(ptr, mask, row);
        }
    }
}

#[target_feature(enable = "avx2,fma")]
unsafe fn avx2_max(src: *const f32, n: usize) -> f32 {
    let neg_inf = _mm256_set1_ps(f32::NEG_INFINITY);
    let mut vmax = neg_inf;

    for (start, vl) in Chunks::new(n, AVX2_LANES) {
        let v = if vl == AVX2_LANES {
            _mm256_loadu_ps(src.add(start))
        } else {
            let mask = tail_mask(vl);
            let loaded = _mm256_maskload_ps(src.add(start), mask);
            _mm256_blendv_ps(neg_inf, loaded, _mm256_castsi256_ps(mask))
        };
        vmax = _mm256_max_ps(vmax, v);
    }

    hmax(vmax)
}
