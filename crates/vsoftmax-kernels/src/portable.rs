//! Portable vector unit.
//!
//! Emulates a vector register of `lanes` binary32 elements in plain arrays.
//! Chunking, the tail-undisturbed accumulator and the final horizontal
//! reduction follow the hardware backends step for step, so the portable unit
//! doubles as an executable model of them at any width.

use crate::backend::{Backend, Chunks, VectorUnit};
use crate::error::{KernelError, Result};
use crate::exp::exp_approx;

/// Widest emulated register.
pub const MAX_PORTABLE_LANES: usize = 16;

/// Emulated width used when none is configured.
pub const DEFAULT_PORTABLE_LANES: usize = 8;

/// Portable vector unit with a fixed emulated lane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortableUnit {
    lanes: usize,
}

impl PortableUnit {
    /// Create a unit emulating `lanes` lanes (1..=16).
    pub fn new(lanes: usize) -> Result<Self> {
        if lanes == 0 || lanes > MAX_PORTABLE_LANES {
            return Err(KernelError::InvalidLaneCount(lanes));
        }
        Ok(Self { lanes })
    }
}

impl Default for PortableUnit {
    fn default() -> Self {
        Self {
            lanes: DEFAULT_PORTABLE_LANES,
        }
    }
}

impl VectorUnit for PortableUnit {
    fn backend(&self) -> Backend {
        Backend::Portable
    }

    fn native_width(&self) -> usize {
        self.lanes
    }

    unsafe fn exp_with_reduction_raw<const DEGREE: usize>(
        &self,
        dst: *mut f32,
        src: *const f32,
        offset: f32,
        n: usize,
    ) -> f32 {
        let vlmax = self.lanes;
        let mut vsum = [0.0f32; MAX_PORTABLE_LANES];
        let mut vexp = [0.0f32; MAX_PORTABLE_LANES];

        for (start, vl) in Chunks::new(n, vlmax) {
            for (lane, out) in vexp[..vl].iter_mut().enumerate() {
                *out = exp_approx::<DEGREE>(*src.add(start + lane) - offset);
            }
            // Lanes vl..vlmax keep their partial sums.
            for (acc, e) in vsum[..vl].iter_mut().zip(&vexp[..vl]) {
                *acc += *e;
            }
            for (lane, e) in vexp[..vl].iter().enumerate() {
                *dst.add(start + lane) = *e;
            }
        }

        vsum[..vlmax].iter().sum()
    }

    unsafe fn scale_raw(&self, data: *mut f32, factor: f32, n: usize) {
        for (start, vl) in Chunks::new(n, self.lanes) {
            for lane in 0..vl {
                *data.add(start + lane) *= factor;
            }
        }
    }

    unsafe fn max_raw(&self, src: *const f32, n: usize) -> f32 {
        let vlmax = self.lanes;
        let mut vmax = [f32::NEG_INFINITY; MAX_PORTABLE_LANES];
        for (start, vl) in Chunks::new(n, vlmax) {
            for (lane, acc) in vmax[..vl].iter_mut().enumerate() {
                *acc = acc.max(*src.add(start + lane));
            }
        }
        vmax[..vlmax].iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exp::POLY_DEGREE;

    fn exp_sum(unit: &PortableUnit, src: &[f32], offset: f32) -> (Vec<f32>, f32) {
        let mut dst = vec![0.0f32; src.len()];
        let sum = unsafe {
            unit.exp_with_reduction_raw::<POLY_DEGREE>(
                dst.as_mut_ptr(),
                src.as_ptr(),
                offset,
                src.len(),
            )
        };
        (dst, sum)
    }

    #[test]
    fn test_lane_count_bounds() {
        assert!(PortableUnit::new(0).is_err());
        assert!(PortableUnit::new(17).is_err());
        assert_eq!(PortableUnit::new(16).unwrap().native_width(), 16);
        assert_eq!(PortableUnit::default().native_width(), DEFAULT_PORTABLE_LANES);
    }

    #[test]
    fn test_empty_input_returns_zero() {
        let unit = PortableUnit::default();
        let (dst, sum) = exp_sum(&unit, &[], 0.0);
        assert!(dst.is_empty());
        assert_eq!(sum, 0.0);
    }

    #[test]
    fn test_tail_lanes_keep_partial_sums() {
        // 4 lanes, 6 elements: the second chunk only touches lanes 0 and 1.
        let unit = PortableUnit::new(4).unwrap();
        let src = [0.0f32; 6];
        let (dst, sum) = exp_sum(&unit, &src, 0.0);
        assert!(dst.iter().all(|&v| v == 1.0));
        assert_eq!(sum, 6.0);
    }

    #[test]
    fn test_offset_is_subtracted() {
        let unit = PortableUnit::new(3).unwrap();
        let src = [1.0f32, 2.0, 3.0, 4.0];
        let (dst, _) = exp_sum(&unit, &src, 4.0);
        assert_eq!(dst[3], 1.0);
        assert!((dst[0] - (-3.0f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_in_place_same_pointer() {
        let unit = PortableUnit::new(4).unwrap();
        let mut data: Vec<f32> = (0..11).map(|i| i as f32 * 0.5).collect();
        let expected: Vec<f32> = data.iter().map(|&x| exp_approx::<POLY_DEGREE>(x)).collect();
        let ptr = data.as_mut_ptr();
        let sum = unsafe { unit.exp_with_reduction_raw::<POLY_DEGREE>(ptr, ptr, 0.0, 11) };
        assert_eq!(data, expected);
        let seq: f32 = expected.iter().sum();
        assert!((sum - seq).abs() / seq < 1e-6);
    }

    #[test]
    fn test_scale_and_max() {
        let unit = PortableUnit::new(3).unwrap();
        let mut data = vec![1.0f32, -2.0, 7.5, 3.0, 0.25];
        assert_eq!(unsafe { unit.max_raw(data.as_ptr(), data.len()) }, 7.5);
        unsafe { unit.scale_raw(data.as_mut_ptr(), 2.0, data.len()) };
        assert_eq!(data, vec![2.0, -4.0, 15.0, 6.0, 0.5]);
        assert_eq!(unsafe { unit.max_raw(data.as_ptr(), 0) }, f32::NEG_INFINITY);
    }
}
