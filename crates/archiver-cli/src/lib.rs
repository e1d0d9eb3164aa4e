//! CLI argument model and validation for the auto-archiver binary.
//!
//! Every flag also reads an `AUTO_ARCHIVER_*` environment variable so the
//! binary can run unattended from a scheduler.

pub mod cli_args;
pub mod config;
pub mod validation;

pub use cli_args::Cli;
pub use config::ArchiverConfig;
pub use validation::*;
