//! Run command - softmax of a list of values.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use vsoftmax_kernels::VectorCapabilities;

use crate::output::{format_table, Align};

/// Run command arguments.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input values (default: 1 2 ... 10).
    #[arg(allow_negative_numbers = true)]
    pub values: Vec<f32>,

    /// Subtract the maximum before exponentiating.
    #[arg(long)]
    pub stable: bool,
}

/// Softmax result.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub backend: String,
    pub stable: bool,
    pub inputs: Vec<f32>,
    pub probabilities: Vec<f32>,
    pub sum: f32,
}

/// Compute the softmax of `values` on `caps`.
pub fn compute(caps: &VectorCapabilities, values: Vec<f32>, stable: bool) -> RunReport {
    let mut probabilities = values.clone();
    if stable {
        caps.stable_softmax(&mut probabilities);
    } else {
        caps.softmax(&mut probabilities);
    }
    let sum = probabilities.iter().sum();
    RunReport {
        backend: caps.backend().to_string(),
        stable,
        inputs: values,
        probabilities,
        sum,
    }
}

/// Execute the run command.
pub fn execute(args: RunArgs, caps: &VectorCapabilities, json: bool) -> Result<()> {
    let values = if args.values.is_empty() {
        super::default_values()
    } else {
        args.values
    };
    let report = compute(caps, values, args.stable);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "\n{} {} values on {}{}\n",
        "Softmax".bright_green().bold(),
        report.inputs.len(),
        report.backend.bright_cyan(),
        if report.stable { " (max-subtracted)" } else { "" }
    );
    let rows: Vec<Vec<String>> = report
        .inputs
        .iter()
        .zip(&report.probabilities)
        .enumerate()
        .map(|(i, (x, p))| vec![i.to_string(), x.to_string(), format!("{:.9}", p)])
        .collect();
    print!(
        "{}",
        format_table(&["#", "x", "softmax(x)"], &rows, &[Align::Right, Align::Right, Align::Right])
    );
    println!("\n  sum = {}", format!("{:.9}", report.sum).bright_yellow());
    if !report.probabilities.iter().all(|p| p.is_finite()) {
        println!(
            "  {} non-finite output; try {}",
            "⚠".bright_yellow(),
            "--stable".bright_cyan()
        );
    }

    Ok(())
}
