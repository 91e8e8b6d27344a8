//! Resolves a project's YAML configuration into a typed tree of values and
//! absolute paths, and creates the output directories it describes.
//!
//! ```no_run
//! use pathtree::configuration::Configuration;
//!
//! # fn main() -> miette::Result<()> {
//! let configuration = Configuration::load_from_path("config.yaml")?;
//! configuration.ensure_output_directories()?;
//!
//! let plots = configuration.paths()?.path_block("results")?.location("plots")?;
//! println!("Saving plots to {plots}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod configuration;
pub mod logging;
