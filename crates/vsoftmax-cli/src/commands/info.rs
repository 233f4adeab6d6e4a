//! Info command - show the selected vector unit.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use vsoftmax_kernels::{
    exp::coefficients, Backend, RoundingMode, VectorCapabilities, MAX_PORTABLE_LANES, POLY_DEGREE,
};

use crate::output::{format_kv_list, print_section};

/// Info command arguments.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Also list the polynomial coefficients.
    #[arg(long)]
    pub coefficients: bool,
}

/// Backend availability entry.
#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub name: &'static str,
    pub available: bool,
}

/// Vector unit description.
#[derive(Debug, Serialize)]
pub struct InfoReport {
    pub backend: String,
    pub native_width: usize,
    pub poly_degree: usize,
    pub rounding_mode: Option<String>,
    pub max_portable_lanes: usize,
    pub backends: Vec<BackendStatus>,
    pub coefficients: Vec<f32>,
}

/// Describe `caps` and the host.
pub fn collect(caps: &VectorCapabilities) -> InfoReport {
    InfoReport {
        backend: caps.backend().to_string(),
        native_width: caps.native_width(),
        poly_degree: POLY_DEGREE,
        rounding_mode: RoundingMode::current().map(|m| format!("{:?}", m)),
        max_portable_lanes: MAX_PORTABLE_LANES,
        backends: Backend::ALL
            .iter()
            .map(|b| BackendStatus {
                name: b.name(),
                available: b.is_available(),
            })
            .collect(),
        coefficients: coefficients::<POLY_DEGREE>().to_vec(),
    }
}

/// Execute the info command.
pub fn execute(args: InfoArgs, caps: &VectorCapabilities, json: bool) -> Result<()> {
    let report = collect(caps);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section("Vector unit");
    println!(
        "{}",
        format_kv_list(&[
            ("Backend", report.backend.bright_cyan().to_string()),
            ("Native width", format!("{} lanes", report.native_width)),
            ("Polynomial degree", report.poly_degree.to_string()),
            (
                "Rounding mode",
                report
                    .rounding_mode
                    .clone()
                    .unwrap_or_else(|| "not inspectable on this target".to_string()),
            ),
        ])
    );

    print_section("Backends");
    for status in &report.backends {
        let mark = if status.available {
            "✓".bright_green()
        } else {
            "✗".bright_red()
        };
        println!("  {} {}", mark, status.name);
    }
    println!("  (portable emulates 1 to {} lanes)", report.max_portable_lanes);

    if args.coefficients {
        print_section("Coefficients");
        for (i, c) in report.coefficients.iter().enumerate() {
            println!("  c{} = {:<14e} 0x{:08x}", i, c, c.to_bits());
        }
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_portable() {
        let caps = VectorCapabilities::portable(3).unwrap();
        let report = collect(&caps);
        assert_eq!(report.backend, "portable");
        assert_eq!(report.native_width, 3);
        assert_eq!(report.coefficients.len(), POLY_DEGREE + 2);
        assert_eq!(report.coefficients[0], 1.0);
        assert!(report.backends.iter().any(|b| b.name == "portable" && b.available));
    }
}
