//! CLI command implementations.

pub mod bench;
pub mod exp;
pub mod info;
pub mod run;
pub mod validate;

/// Inputs used when a command is given no values: 1, 2, ..., 10.
pub fn default_values() -> Vec<f32> {
    (1..=10).map(|i| i as f32).collect()
}
