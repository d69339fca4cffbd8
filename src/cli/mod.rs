//! Command Line Interface (CLI) layer.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) that turns user-provided options
//! into a `RunConfig` for the library API.
//!
//! If you are embedding this into another application, prefer using
//! the high-level `landsat_truecolor::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
