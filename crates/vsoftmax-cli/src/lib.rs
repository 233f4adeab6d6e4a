//! vsoftmax CLI.

pub mod commands;
pub mod output;
pub mod tracing_setup;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use vsoftmax_config::{load_default_config, Config, ConfigLoader, KernelConfig, ENV_PREFIX};
use vsoftmax_kernels::{capabilities, init, init_with, VectorCapabilities};

/// vsoftmax - vectorized softmax kernels.
#[derive(Parser, Debug)]
#[command(
    name = "vsoftmax",
    version,
    about = "Vectorized binary32 softmax with a fused range-reduced exponential",
    long_about = "vsoftmax runs the softmax and exponential kernels on the widest vector\n\
                  unit the CPU offers (AVX2+FMA, NEON) or on a portable emulated unit.\n\n\
                  Use `info` to see which unit is selected and `bench` to time it\n\
                  against a scalar reference."
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path.
    #[arg(short, long, global = true, env = "VSOFTMAX_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Enable JSON output.
    #[arg(long, global = true)]
    pub json: bool,
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Softmax of a list of values.
    Run(commands::run::RunArgs),

    /// Vector exponential of a list of values, compared with libm.
    Exp(commands::exp::ExpArgs),

    /// Show the selected vector unit.
    Info(commands::info::InfoArgs),

    /// Time vector softmax against a scalar reference.
    Bench(commands::bench::BenchArgs),

    /// Validate a configuration file.
    Validate(commands::validate::ValidateArgs),

    /// Show version information.
    Version,
}

/// Load `path` if given, otherwise search the default locations.
/// `VSOFTMAX_*` overrides apply either way.
pub fn load_config(path: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::new()
            .with_file(path)
            .with_env_prefix(ENV_PREFIX)
            .load()
            .with_context(|| format!("loading configuration from {}", path))?,
        None => load_default_config().context("loading default configuration")?,
    };
    Ok(config)
}

/// Build the vector unit a kernel configuration asks for.
pub fn capabilities_for(config: &KernelConfig) -> Result<VectorCapabilities> {
    let caps = match config.backend_choice()? {
        None => VectorCapabilities::detect(),
        Some(backend) => VectorCapabilities::with_backend(backend, config.portable_lanes)
            .with_context(|| format!("selecting backend '{}'", config.backend))?,
    };
    Ok(caps)
}

/// Install the configured unit as the process-wide one.
pub fn install_kernels(config: &KernelConfig) -> Result<&'static VectorCapabilities> {
    if config.backend_choice()?.is_none() {
        init();
        return Ok(capabilities());
    }
    let caps = capabilities_for(config)?;
    Ok(init_with(caps)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_negative_values() {
        let cli = Cli::try_parse_from(["vsoftmax", "run", "-1.5", "2", "--stable"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.values, vec![-1.5, 2.0]);
                assert!(args.stable);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_command() {
        let cli = Cli::try_parse_from(["vsoftmax", "info", "--json", "-l", "debug"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Info(_)));
    }

    #[test]
    fn test_parse_exp_offset() {
        let cli = Cli::try_parse_from(["vsoftmax", "exp", "0", "1", "--offset", "-2"]).unwrap();
        match cli.command {
            Commands::Exp(args) => assert_eq!(args.offset, -2.0),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_capabilities_for_portable() {
        let config = KernelConfig {
            backend: "portable".to_string(),
            portable_lanes: 5,
            ..KernelConfig::default()
        };
        let caps = capabilities_for(&config).unwrap();
        assert_eq!(caps.native_width(), 5);

        let auto = capabilities_for(&KernelConfig::default()).unwrap();
        assert!(auto.backend().is_available());
    }
}
