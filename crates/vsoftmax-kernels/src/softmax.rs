//! Softmax normalization on top of the fused exp-and-sum kernel.
//!
//! `softmax` passes an offset of 0: inputs whose exponentials overflow
//! binary32 produce non-finite output. `stable_softmax` subtracts the maximum
//! first and is the variant to use for unbounded logits.

use tracing::trace;

use crate::dispatch::{capabilities, VectorCapabilities};

impl VectorCapabilities {
    /// In-place softmax with offset 0.
    ///
    /// An all-underflowing input sums to 0; the reciprocal is then `+Inf` and
    /// the output follows IEEE propagation.
    pub fn softmax(&self, data: &mut [f32]) {
        let sum = self.vector_exp_with_reduction_inplace(data, 0.0);
        self.normalize(data, sum);
    }

    /// Out-of-place softmax with offset 0.
    ///
    /// # Panics
    ///
    /// Panics if `dst` and `src` differ in length.
    pub fn softmax_to(&self, dst: &mut [f32], src: &[f32]) {
        let sum = self.vector_exp_with_reduction(dst, src, 0.0);
        self.normalize(dst, sum);
    }

    /// In-place softmax that subtracts the maximum before exponentiating.
    pub fn stable_softmax(&self, data: &mut [f32]) {
        if data.is_empty() {
            return;
        }
        let max = self.vector_max(data);
        let sum = self.vector_exp_with_reduction_inplace(data, max);
        self.normalize(data, sum);
    }

    fn normalize(&self, data: &mut [f32], sum: f32) {
        if data.is_empty() {
            return;
        }
        // reciprocal once, then a multiply per element
        let inv_sum = 1.0 / sum;
        trace!(n = data.len(), sum, inv_sum, "normalizing");
        self.vector_scale(data, inv_sum);
    }
}

/// In-place softmax on the global unit (offset 0).
#[inline(always)]
pub fn softmax(data: &mut [f32]) {
    capabilities().softmax(data)
}

/// Out-of-place softmax on the global unit (offset 0).
///
/// # Panics
///
/// Panics if `dst` and `src` differ in length.
#[inline(always)]
pub fn softmax_to(dst: &mut [f32], src: &[f32]) {
    capabilities().softmax_to(dst, src)
}

/// In-place max-subtracted softmax on the global unit.
#[inline(always)]
pub fn stable_softmax(data: &mut [f32]) {
    capabilities().stable_softmax(data)
}
