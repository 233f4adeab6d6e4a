//! # Range-Reduced Exponential: Constants and Scalar Pipeline
//!
//! `exp(x) = 2^k * exp(r)` with `k = round_ties_even(x / ln2)` and
//! `r = x - k * ln2`, so that `r ∈ [-ln2/2, ln2/2]`. `exp(r)` is a minimax
//! polynomial evaluated with Horner's method; `2^k` is synthesized directly in
//! the binary32 exponent field.
//!
//! Every vector backend runs exactly this pipeline lane-wise. [`exp_approx`] is
//! the one-lane version and the reference the backends are tested against.

/// ln(2) rounded to binary32 (`0x1.62e43p-1`).
pub const LN2: f32 = f32::from_bits(0x3f31_7218);

/// 1/ln(2) rounded to binary32 (`0x1.715476p0`).
pub const INV_LN2: f32 = f32::from_bits(0x3fb8_aa3b);

/// Minimax coefficients `c0..=c7` of `exp(r)` over `[-ln2/2, ln2/2]`.
pub const EXP_COEFFS: [f32; 8] = [
    f32::from_bits(0x3f80_0000), // 0x1.p0
    f32::from_bits(0x3f80_0001), // 0x1.000002p0
    f32::from_bits(0x3f00_0008), // 0x1.00001p-1
    f32::from_bits(0x3e2a_aa37), // 0x1.55546ep-3
    f32::from_bits(0x3d2a_a42a), // 0x1.554854p-5
    f32::from_bits(0x3c08_a331), // 0x1.114662p-7
    f32::from_bits(0x3ab9_04ea), // 0x1.7209d4p-10
    f32::from_bits(0x394a_2405), // 0x1.94480ap-13
];

/// Highest selectable polynomial degree.
///
/// Degree `d` evaluates `c0 + c1*r + ... + c(d+1)*r^(d+1)`, so degree 6 uses
/// all eight coefficients.
pub const MAX_POLY_DEGREE: usize = EXP_COEFFS.len() - 2;

/// Default polynomial degree for all non-generic entry points.
pub const POLY_DEGREE: usize = 6;

/// binary32 exponent bias.
pub const EXP_BIAS: i32 = 127;

/// Position of the exponent field in a binary32 bit pattern.
pub const MANTISSA_BITS: i32 = 23;

/// Lower saturation bound of the reduced argument. Below it `k` would leave
/// the exponent field; the result is `0.0`.
pub const EXP_ARG_MIN: f32 = -88.0;

/// Upper saturation bound of the reduced argument.
///
/// The result is `+Inf` above it, and also from about 88.376 upward: there
/// `k` rounds to 128, the all-ones exponent, even though libm `expf` stays
/// finite up to about 88.72.
pub const EXP_ARG_MAX: f32 = 89.0;

/// Largest ULP distance from libm `expf` at [`POLY_DEGREE`] over `[-20, 20]`.
pub const EXP_MAX_ULPS: u32 = 2;

/// Rejects degrees without coefficients at monomorphization time.
#[inline(always)]
pub(crate) const fn assert_degree<const DEGREE: usize>() {
    const {
        assert!(
            DEGREE <= MAX_POLY_DEGREE,
            "polynomial degree must not exceed MAX_POLY_DEGREE (6)"
        )
    }
}

/// Coefficients used by a given degree, lowest order first.
#[inline(always)]
pub fn coefficients<const DEGREE: usize>() -> &'static [f32] {
    assert_degree::<DEGREE>();
    let all: &'static [f32; 8] = &EXP_COEFFS;
    &all[..DEGREE + 2]
}

/// `2^k` built by placing `k + 127` in the exponent field.
///
/// `k` must lie in `[-127, 128]`: `-127` produces `0.0`, `128` produces `+Inf`.
#[inline(always)]
pub fn pow2i(k: i32) -> f32 {
    f32::from_bits(((k + EXP_BIAS) << MANTISSA_BITS) as u32)
}

/// Horner evaluation of the exp(r) polynomial.
#[inline(always)]
pub fn horner<const DEGREE: usize>(r: f32) -> f32 {
    let coeffs = coefficients::<DEGREE>();
    let mut p = coeffs[DEGREE + 1];
    for &c in coeffs[..=DEGREE].iter().rev() {
        p = p.mul_add(r, c);
    }
    p
}

/// Scalar `exp(x)` through the range-reduced pipeline.
///
/// NaN propagates; arguments above [`EXP_ARG_MAX`] saturate to `+Inf`, below
/// [`EXP_ARG_MIN`] to `0.0`.
#[inline(always)]
pub fn exp_approx<const DEGREE: usize>(x: f32) -> f32 {
    let x = x.clamp(EXP_ARG_MIN, EXP_ARG_MAX);
    let k = (x * INV_LN2).round_ties_even();
    let r = (-k).mul_add(LN2, x);
    horner::<DEGREE>(r) * pow2i(k as i32)
}

/// Distance in units-in-the-last-place between two finite binary32 values.
pub fn ulp_distance(a: f32, b: f32) -> u32 {
    if a == b {
        return 0;
    }
    // Map the sign-magnitude encoding onto a monotonic integer line.
    let ordered = |v: f32| {
        let bits = v.to_bits() as i32;
        if bits < 0 {
            i32::MIN - bits
        } else {
            bits
        }
    };
    ordered(a).abs_diff(ordered(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_match_hex_floats() {
        assert!((LN2 - std::f32::consts::LN_2).abs() <= f32::EPSILON);
        assert!((INV_LN2 - std::f32::consts::LOG2_E).abs() <= f32::EPSILON);
        assert_eq!(EXP_COEFFS[0], 1.0);
        assert!((EXP_COEFFS[2] - 0.5).abs() < 1e-5);
        assert!((EXP_COEFFS[3] - 1.0 / 6.0).abs() < 1e-5);
        assert!((EXP_COEFFS[7] - 1.0 / 5040.0).abs() < 1e-5);
        assert_eq!(MAX_POLY_DEGREE, 6);
    }

    #[test]
    fn test_coefficient_count_per_degree() {
        assert_eq!(coefficients::<0>().len(), 2);
        assert_eq!(coefficients::<3>().len(), 5);
        assert_eq!(coefficients::<6>().len(), 8);
    }

    #[test]
    fn test_pow2i_bit_reconstruction() {
        assert_eq!(pow2i(0), 1.0);
        assert_eq!(pow2i(1), 2.0);
        assert_eq!(pow2i(-1), 0.5);
        assert_eq!(pow2i(127), 2.0f32.powi(127));
        assert_eq!(pow2i(-126), f32::MIN_POSITIVE);
        assert_eq!(pow2i(-127), 0.0);
        assert_eq!(pow2i(128), f32::INFINITY);
    }

    #[test]
    fn test_exp_approx_accuracy() {
        for i in -2000..=2000 {
            let x = i as f32 * 0.01;
            let got = exp_approx::<POLY_DEGREE>(x);
            let want = x.exp();
            let ulps = ulp_distance(got, want);
            assert!(ulps <= EXP_MAX_ULPS, "exp({}) = {} vs {} ({} ulp)", x, got, want, ulps);
        }
    }

    #[test]
    fn test_exp_approx_special_values() {
        assert_eq!(exp_approx::<POLY_DEGREE>(0.0), 1.0);
        assert_eq!(exp_approx::<POLY_DEGREE>(100.0), f32::INFINITY);
        assert_eq!(exp_approx::<POLY_DEGREE>(f32::INFINITY), f32::INFINITY);
        assert_eq!(exp_approx::<POLY_DEGREE>(-100.0), 0.0);
        assert_eq!(exp_approx::<POLY_DEGREE>(f32::NEG_INFINITY), 0.0);
        assert!(exp_approx::<POLY_DEGREE>(f32::NAN).is_nan());
    }

    #[test]
    fn test_overflow_window_below_arg_max() {
        // k = round(x / ln2) reaches 128 at x ~ 88.376
        let below = exp_approx::<POLY_DEGREE>(88.3);
        assert!(below.is_finite());
        assert!((below / 88.3f32.exp() - 1.0).abs() < 1e-6);
        assert!(88.5f32.exp().is_finite());
        assert_eq!(exp_approx::<POLY_DEGREE>(88.5), f32::INFINITY);
        assert_eq!(exp_approx::<POLY_DEGREE>(88.7), f32::INFINITY);
    }

    #[test]
    fn test_lower_degree_is_coarser() {
        let x = 0.3f32;
        let err = |v: f32| (v - x.exp()).abs();
        let e1 = err(exp_approx::<1>(x));
        let e6 = err(exp_approx::<6>(x));
        assert!(e6 < e1, "degree 6 err {} vs degree 1 err {}", e6, e1);
        // Degree 0 is the linear term only.
        assert!((exp_approx::<0>(0.25) - (1.0 + EXP_COEFFS[1] * 0.25)).abs() < 1e-6);
    }

    #[test]
    fn test_ulp_distance() {
        assert_eq!(ulp_distance(1.0, 1.0), 0);
        assert_eq!(ulp_distance(1.0, f32::from_bits(1.0f32.to_bits() + 3)), 3);
        assert_eq!(ulp_distance(0.0, -0.0), 0);
        assert_eq!(ulp_distance(f32::from_bits(1), -f32::from_bits(1)), 2);
    }
}
