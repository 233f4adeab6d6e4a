//! vsoftmax CLI entry point.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::{debug, Level};

use vsoftmax_cli::tracing_setup::{init_tracing, LogFormat, TracingConfig};
use vsoftmax_cli::{commands, install_kernels, load_config, Cli, Commands};
use vsoftmax_config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // validate and version must work even when the default config is broken
    let config = match cli.command {
        Commands::Validate(_) | Commands::Version => Config::default(),
        _ => load_config(cli.config.as_deref())?,
    };

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.level)
        .parse()
        .unwrap_or(Level::INFO);
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::from_name(&config.logging.format)
    };
    init_tracing(TracingConfig {
        level,
        format,
    })?;
    debug!(?config, "configuration resolved");

    if !cli.json && !matches!(cli.command, Commands::Version) {
        print_banner();
    }

    match cli.command {
        Commands::Run(args) => {
            let caps = install_kernels(&config.kernel)?;
            commands::run::execute(args, caps, cli.json)?;
        }
        Commands::Exp(args) => {
            let caps = install_kernels(&config.kernel)?;
            commands::exp::execute(args, caps, cli.json)?;
        }
        Commands::Info(args) => {
            let caps = install_kernels(&config.kernel)?;
            commands::info::execute(args, caps, cli.json)?;
        }
        Commands::Bench(args) => {
            let caps = install_kernels(&config.kernel)?;
            commands::bench::execute(args, caps, config.kernel.warmup_iterations, cli.json)?;
        }
        Commands::Validate(args) => {
            commands::validate::execute(args, cli.json)?;
        }
        Commands::Version => {
            print_version(cli.json)?;
        }
    }

    debug!("done");
    Ok(())
}

/// Print the banner.
fn print_banner() {
    println!(
        "  {} {} - {}",
        "vsoftmax".bright_green().bold(),
        env!("CARGO_PKG_VERSION").bright_yellow(),
        "range-reduced exp and softmax on the native vector width".white()
    );
}

/// Print version information.
fn print_version(json: bool) -> Result<()> {
    if json {
        let version = serde_json::json!({
            "name": "vsoftmax",
            "version": env!("CARGO_PKG_VERSION"),
            "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
        });
        println!("{}", serde_json::to_string_pretty(&version)?);
    } else {
        println!("{} {}", "vsoftmax".bright_green().bold(), env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
        println!();
        println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    }
    Ok(())
}
