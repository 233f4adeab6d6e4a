//! End-to-end behaviour of the exponential kernel and the softmax built on it,
//! run against every vector unit available on the host.

use vsoftmax_kernels::{
    exp_approx, softmax, stable_softmax, ulp_distance, Backend, RoundingMode, RoundingModeGuard,
    VectorCapabilities, EXP_MAX_ULPS, MAX_PORTABLE_LANES, POLY_DEGREE,
};

/// Every hardware unit plus the portable unit at each emulated width.
fn all_units() -> Vec<VectorCapabilities> {
    let mut units: Vec<VectorCapabilities> = VectorCapabilities::available()
        .into_iter()
        .filter(|c| c.backend() != Backend::Portable)
        .collect();
    units.extend((1..=MAX_PORTABLE_LANES).map(|l| VectorCapabilities::portable(l).unwrap()));
    units
}

fn ramp(n: usize) -> Vec<f32> {
    (0..n).map(|i| ((i * 7919) % 97) as f32 * 0.2 - 9.0).collect()
}

#[test]
fn test_one_to_ten_scenario() {
    let src: Vec<f32> = (1..=10).map(|i| i as f32).collect();
    for caps in all_units() {
        let mut data = src.clone();
        caps.softmax(&mut data);

        let sum: f32 = data.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "{}: sum {}", caps.backend(), sum);
        for w in data.windows(2) {
            assert!(w[0] < w[1], "{}: not increasing", caps.backend());
        }

        // last = 1 / Σ_{j=0}^{9} e^{-j} = (1 - e^-1) / (1 - e^-10)
        let e = std::f64::consts::E;
        let expected_last = ((1.0 - 1.0 / e) / (1.0 - e.powi(-10))) as f32;
        assert!(
            (data[9] - expected_last).abs() < 1e-5,
            "{}: last {} vs {}",
            caps.backend(),
            data[9],
            expected_last
        );
        assert!((data[8] / data[9] - (-1.0f32).exp()).abs() < 1e-5);
    }
}

#[test]
fn test_empty_input_untouched() {
    for caps in all_units() {
        let mut dst: Vec<f32> = Vec::new();
        assert_eq!(caps.vector_exp_with_reduction(&mut dst, &[], 0.0), 0.0);
        assert_eq!(caps.vector_exp_with_reduction_inplace(&mut dst, 5.0), 0.0);
    }
}

#[test]
fn test_chunk_boundaries_around_native_width() {
    for caps in all_units() {
        let w = caps.native_width();
        for n in [w.saturating_sub(1), w, w + 1, 2 * w - 1, 2 * w, 2 * w + 1] {
            let src = ramp(n);
            let mut dst = vec![f32::NAN; n];
            let sum = caps.vector_exp_with_reduction(&mut dst, &src, 0.0);

            for (i, (&got, &x)) in dst.iter().zip(&src).enumerate() {
                assert_eq!(
                    got,
                    exp_approx::<POLY_DEGREE>(x),
                    "{} width {} n {} index {}",
                    caps.backend(),
                    w,
                    n,
                    i
                );
            }
            let seq: f32 = dst.iter().sum();
            assert!(
                (sum - seq).abs() <= seq * 1e-5,
                "{} width {} n {}: {} vs {}",
                caps.backend(),
                w,
                n,
                sum,
                seq
            );
        }
    }
}

#[test]
fn test_outputs_identical_across_units() {
    let src = ramp(203);
    let reference: Vec<f32> = src.iter().map(|&x| exp_approx::<POLY_DEGREE>(x - 1.25)).collect();
    for caps in all_units() {
        let mut dst = vec![0.0f32; src.len()];
        caps.vector_exp_with_reduction(&mut dst, &src, 1.25);
        assert_eq!(dst, reference, "{} width {}", caps.backend(), caps.native_width());
    }
}

#[test]
fn test_accuracy_against_libm() {
    let src: Vec<f32> = (0..=4000).map(|i| i as f32 * 0.01 - 20.0).collect();
    for caps in all_units() {
        let mut dst = vec![0.0f32; src.len()];
        caps.vector_exp_with_reduction(&mut dst, &src, 0.0);
        for (&got, &x) in dst.iter().zip(&src) {
            let ulps = ulp_distance(got, x.exp());
            assert!(ulps <= EXP_MAX_ULPS, "{}: exp({}) off by {} ulp", caps.backend(), x, ulps);
        }
    }
}

#[test]
fn test_overflow_and_underflow_saturate() {
    for caps in all_units() {
        let src = [100.0f32, -100.0, 88.0, -87.0, 88.5];
        let mut dst = [0.0f32; 5];
        let sum = caps.vector_exp_with_reduction(&mut dst, &src, 0.0);
        assert_eq!(dst[0], f32::INFINITY);
        assert_eq!(dst[1], 0.0);
        assert!(dst[2].is_finite() && dst[2] > 1e38);
        assert!(dst[3] > 0.0 && dst[3] < 1e-37);
        // finite in libm, but k already rounds to the all-ones exponent
        assert_eq!(dst[4], f32::INFINITY);
        assert_eq!(sum, f32::INFINITY);
    }
}

#[test]
fn test_kernel_restores_callers_rounding_mode() {
    let src = ramp(29);
    let expected: Vec<f32> = src.iter().map(|&x| exp_approx::<POLY_DEGREE>(x)).collect();
    let before = RoundingMode::current();

    let mut dst = vec![0.0f32; src.len()];
    {
        let _caller = RoundingModeGuard::with_mode(RoundingMode::Up);
        VectorCapabilities::default().vector_exp_with_reduction(&mut dst, &src, 0.0);
        if before.is_some() {
            assert_eq!(RoundingMode::current(), Some(RoundingMode::Up));
        }
    }
    assert_eq!(RoundingMode::current(), before);
    assert_eq!(dst, expected);
}

#[test]
fn test_shift_invariance_small_shift() {
    let src = ramp(40);
    let mut a = src.clone();
    let mut b: Vec<f32> = src.iter().map(|x| x + 3.0).collect();
    softmax(&mut a);
    softmax(&mut b);
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).abs() < 1e-6, "{} vs {}", x, y);
    }
}

#[test]
fn test_shift_invariance_breaks_for_large_shift() {
    // softmax does not subtract the maximum: exp overflows once inputs pass ~88.
    let src: Vec<f32> = (1..=10).map(|i| i as f32).collect();
    let mut shifted: Vec<f32> = src.iter().map(|x| x + 100.0).collect();
    softmax(&mut shifted);
    assert!(shifted.iter().all(|v| !v.is_finite()));

    // The max-subtracted variant keeps the property.
    let mut reference = src.clone();
    softmax(&mut reference);
    let mut stable: Vec<f32> = src.iter().map(|x| x + 100.0).collect();
    stable_softmax(&mut stable);
    for (a, b) in reference.iter().zip(&stable) {
        assert!((a - b).abs() < 1e-6, "{} vs {}", a, b);
    }
}

#[test]
fn test_lower_degree_through_vector_path() {
    let src = ramp(64);
    for caps in all_units() {
        let mut coarse = vec![0.0f32; src.len()];
        let mut fine = vec![0.0f32; src.len()];
        caps.vector_exp_with_reduction_degree::<1>(&mut coarse, &src, 0.0);
        caps.vector_exp_with_reduction_degree::<6>(&mut fine, &src, 0.0);
        let err = |v: &[f32]| -> f64 {
            v.iter()
                .zip(&src)
                .map(|(&g, &x)| ((g as f64) / (x as f64).exp() - 1.0).abs())
                .fold(0.0, f64::max)
        };
        assert!(err(&fine) < err(&coarse));
        assert!(err(&fine) < 1e-6);
    }
}
