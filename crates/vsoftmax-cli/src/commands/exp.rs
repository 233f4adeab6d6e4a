//! Exp command - vector exponential compared with libm.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use vsoftmax_kernels::{ulp_distance, VectorCapabilities};

use crate::output::{format_table, Align};

/// Exp command arguments.
#[derive(Args, Debug)]
pub struct ExpArgs {
    /// Input values (default: 1 2 ... 10).
    #[arg(allow_negative_numbers = true)]
    pub values: Vec<f32>,

    /// Subtracted from every input before exponentiating.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub offset: f32,
}

/// One element of the comparison.
#[derive(Debug, Serialize)]
pub struct ExpRow {
    pub x: f32,
    pub vector: f32,
    pub libm: f32,
    pub ulps: u32,
}

/// Exponential result.
#[derive(Debug, Serialize)]
pub struct ExpReport {
    pub backend: String,
    pub offset: f32,
    pub rows: Vec<ExpRow>,
    pub sum: f32,
    pub max_ulps: u32,
}

/// Compute `exp(x - offset)` for every value on `caps`.
pub fn compute(caps: &VectorCapabilities, values: &[f32], offset: f32) -> ExpReport {
    let mut out = vec![0.0f32; values.len()];
    let sum = caps.vector_exp_with_reduction(&mut out, values, offset);
    let rows: Vec<ExpRow> = values
        .iter()
        .zip(&out)
        .map(|(&x, &vector)| {
            let libm = (x - offset).exp();
            ExpRow {
                x,
                vector,
                libm,
                ulps: ulp_distance(vector, libm),
            }
        })
        .collect();
    let max_ulps = rows.iter().map(|r| r.ulps).max().unwrap_or(0);
    ExpReport {
        backend: caps.backend().to_string(),
        offset,
        rows,
        sum,
        max_ulps,
    }
}

/// Execute the exp command.
pub fn execute(args: ExpArgs, caps: &VectorCapabilities, json: bool) -> Result<()> {
    let values = if args.values.is_empty() {
        super::default_values()
    } else {
        args.values
    };
    let report = compute(caps, &values, args.offset);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "\n{} exp(x - {}) on {}\n",
        "Exponential".bright_green().bold(),
        report.offset,
        report.backend.bright_cyan()
    );
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|r| {
            vec![
                r.x.to_string(),
                format!("{:e}", r.vector),
                format!("{:e}", r.libm),
                r.ulps.to_string(),
            ]
        })
        .collect();
    print!(
        "{}",
        format_table(
            &["x", "vector", "libm", "ulp"],
            &rows,
            &[Align::Right, Align::Right, Align::Right, Align::Right]
        )
    );
    println!("\n  returned sum = {}", format!("{:e}", report.sum).bright_yellow());
    println!("  max ulp      = {}", report.max_ulps);

    Ok(())
}
