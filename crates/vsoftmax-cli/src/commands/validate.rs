//! Validate command - check a configuration file.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use vsoftmax_config::Config;

use crate::capabilities_for;
use crate::output::{print_error, print_success, print_warning};

/// Validate command arguments.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration file to validate.
    pub config_file: String,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Findings for one file.
#[derive(Debug, Default)]
pub struct Findings {
    pub config: Option<Config>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Load `path` and check that its kernel selection works on this CPU.
pub fn check(path: &str) -> Findings {
    let mut findings = Findings::default();
    match Config::from_file(path) {
        Ok(config) => {
            // a valid name can still name hardware this host lacks
            if let Err(e) = capabilities_for(&config.kernel) {
                findings
                    .warnings
                    .push(format!("kernel.backend '{}': {:#}", config.kernel.backend, e));
            }
            findings.config = Some(config);
        }
        Err(e) => findings.errors.push(e.to_string()),
    }
    findings
}

/// Execute the validate command.
pub fn execute(args: ValidateArgs, json: bool) -> Result<()> {
    let findings = check(&args.config_file);

    if json {
        let result = serde_json::json!({
            "file": args.config_file,
            "valid": findings.errors.is_empty(),
            "errors": findings.errors,
            "warnings": findings.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "\n{} {}\n",
            "Validating".bright_green().bold(),
            args.config_file.bright_cyan()
        );
        for error in &findings.errors {
            print_error(error);
        }
        for warning in &findings.warnings {
            print_warning(warning);
        }
        if let (true, Some(config)) = (args.verbose, &findings.config) {
            println!("  backend:        {}", config.kernel.backend);
            println!("  portable lanes: {}", config.kernel.portable_lanes);
            println!("  warm-up:        {}", config.kernel.warmup_iterations);
            println!(
                "  logging:        {} ({})",
                config.logging.level, config.logging.format
            );
        }
        if findings.errors.is_empty() {
            print_success("Configuration is valid");
        }
    }

    if !findings.errors.is_empty() {
        anyhow::bail!("Configuration validation failed");
    }
    Ok(())
}
