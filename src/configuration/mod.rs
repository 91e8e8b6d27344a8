//! This module contains all configuration-relevant code: loading the YAML
//! document, resolving it into a typed tree and creating output directories.
//!
//! Your starting point should probably be [`Configuration::load_from_path`].
//!
//! # Internals
//! The configuration is first parsed into an unvalidated ("unresolved") form,
//! a plain [`serde_yaml::Value`]. Its `resolve` method then walks the document
//! with a [`ConfigTreeBuilder`], which turns every nested mapping into a
//! [`ConfigNode`] and every location string into a [`ResolvedLocation`].
//!
//! Everything under the `paths` key becomes a [`PathBlock`]: its string leaves
//! are always locations, a `root` entry re-anchors its siblings, and
//! [`PathBlock::ensure_all_directories_exist`] creates the directories it describes.
//!
//! ```yaml
//! analysis_name: plesse_2023
//! paths:
//!   working: 030_Analysen/working_directory
//!   data:
//!     root: 020_Daten
//!     raw: raw          # -> <project>/020_Daten/raw
//!   results:
//!     root: 040_Results
//!     plots: plots      # -> <project>/040_Results/plots
//! ```

#![allow(rustdoc::private_intra_doc_links)]

mod error;
mod structure;
mod traits;
mod utilities;

pub use error::{ConfigurationError, ConfigurationResult};
pub use structure::*;
pub use utilities::{
    get_default_configuration_file_path,
    normalize_lexically,
    DEFAULT_CONFIGURATION_FILE_NAME,
};
