//! Bench command - time vector softmax against a scalar reference.

use std::hint::black_box;
use std::time::Instant;

use anyhow::{ensure, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use vsoftmax_kernels::VectorCapabilities;

use crate::output::{format_kv_list, format_nanos, print_section};

/// Bench command arguments.
#[derive(Args, Debug)]
pub struct BenchArgs {
    /// Elements per softmax call.
    #[arg(short, long, default_value = "4096")]
    pub size: usize,

    /// Timed iterations.
    #[arg(short, long, default_value = "1000")]
    pub iterations: usize,

    /// Warm-up iterations (default: from the configuration).
    #[arg(long)]
    pub warmup: Option<usize>,
}

/// Benchmark results.
#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub backend: String,
    pub native_width: usize,
    pub size: usize,
    pub iterations: usize,
    pub warmup: usize,
    pub scalar_ns_per_call: f64,
    pub vector_ns_per_call: f64,
    pub speedup: f64,
    pub max_abs_diff: f32,
}

/// Straightforward libm softmax used as the baseline.
pub fn scalar_softmax(data: &mut [f32]) {
    let mut sum = 0.0f32;
    for v in data.iter_mut() {
        *v = v.exp();
        sum += *v;
    }
    let inv = 1.0 / sum;
    for v in data.iter_mut() {
        *v *= inv;
    }
}

fn logits(size: usize) -> Vec<f32> {
    (0..size).map(|i| ((i * 37) % 101) as f32 * 0.1 - 5.0).collect()
}

fn time_per_call(iterations: usize, mut f: impl FnMut()) -> f64 {
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    start.elapsed().as_nanos() as f64 / iterations as f64
}

/// Run the measurement.
pub fn measure(
    caps: &VectorCapabilities,
    size: usize,
    iterations: usize,
    warmup: usize,
) -> Result<BenchReport> {
    ensure!(size > 0, "size must be greater than 0");
    ensure!(iterations > 0, "iterations must be greater than 0");

    let src = logits(size);
    let mut scalar = src.clone();
    let mut vector = src.clone();

    for _ in 0..warmup {
        scalar.copy_from_slice(&src);
        scalar_softmax(black_box(&mut scalar));
        vector.copy_from_slice(&src);
        caps.softmax(black_box(&mut vector));
    }

    let scalar_ns = time_per_call(iterations, || {
        scalar.copy_from_slice(&src);
        scalar_softmax(black_box(&mut scalar));
    });
    let vector_ns = time_per_call(iterations, || {
        vector.copy_from_slice(&src);
        caps.softmax(black_box(&mut vector));
    });

    let max_abs_diff = scalar
        .iter()
        .zip(&vector)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);

    let report = BenchReport {
        backend: caps.backend().to_string(),
        native_width: caps.native_width(),
        size,
        iterations,
        warmup,
        scalar_ns_per_call: scalar_ns,
        vector_ns_per_call: vector_ns,
        speedup: scalar_ns / vector_ns.max(f64::MIN_POSITIVE),
        max_abs_diff,
    };
    info!(
        backend = %report.backend,
        size,
        iterations,
        scalar_ns = report.scalar_ns_per_call,
        vector_ns = report.vector_ns_per_call,
        "benchmark finished"
    );
    Ok(report)
}

/// Execute the bench command.
pub fn execute(
    args: BenchArgs,
    caps: &VectorCapabilities,
    default_warmup: usize,
    json: bool,
) -> Result<()> {
    let warmup = args.warmup.unwrap_or(default_warmup);
    if !json {
        println!(
            "\n{} softmax of {} elements, {} iterations ({} warm-up)",
            "Benchmarking".bright_green().bold(),
            args.size,
            args.iterations,
            warmup
        );
    }

    let report = measure(caps, args.size, args.iterations, warmup)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section("Results");
    println!(
        "{}",
        format_kv_list(&[
            (
                "Backend",
                format!("{} ({} lanes)", report.backend, report.native_width)
            ),
            ("Scalar", format_nanos(report.scalar_ns_per_call)),
            ("Vector", format_nanos(report.vector_ns_per_call)),
            ("Speedup", format!("{:.2}x", report.speedup).bright_yellow().to_string()),
            ("Max |diff|", format!("{:e}", report.max_abs_diff)),
        ])
    );
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_small() {
        let caps = VectorCapabilities::default();
        let report = measure(&caps, 100, 3, 1).unwrap();
        assert_eq!(report.size, 100);
        assert!(report.vector_ns_per_call > 0.0);
        assert!(report.max_abs_diff < 1e-6);
    }

    #[test]
    fn test_measure_rejects_empty() {
        let caps = VectorCapabilities::default();
        assert!(measure(&caps, 0, 10, 0).is_err());
        assert!(measure(&caps, 10, 0, 0).is_err());
    }

    #[test]
    fn test_scalar_reference() {
        let mut data = vec![0.0f32, 0.0];
        scalar_softmax(&mut data);
        assert_eq!(data, vec![0.5, 0.5]);
    }
}
