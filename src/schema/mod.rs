//! Schema module - Gene values, genomes and run configuration.

mod config;
mod gene;

pub use config::*;
pub use gene::*;
