use std::{fs, path::Path};

use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;

use crate::configuration::traits::ResolvableConfiguration;


pub const DEFAULT_PATHS_KEY: &str = "paths";
pub const DEFAULT_ANCHOR_KEY: &str = "root";
pub const DEFAULT_OUTPUT_DIRECTORY_TARGETS: [&str; 2] = ["working", "results"];

/// Key-name tokens that the legacy loaders treated as "this is a path".
pub const HEURISTIC_PATH_TOKENS: [&str; 8] = [
    "path",
    "dir",
    "directory",
    "root",
    "working",
    "results",
    "notebooks",
    "scripts",
];



#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathIndicatorMatch {
    /// The whole key must equal one of the tokens.
    #[default]
    Exact,

    /// The key must contain one of the tokens.
    Substring,
}


/// Decides, by key name alone, whether a string value outside of a paths block
/// is a location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathIndicator {
    tokens: Vec<String>,
    match_mode: PathIndicatorMatch,
}

impl PathIndicator {
    /// Tokens are trimmed and compared case-insensitively. Empty tokens are
    /// dropped, since in substring mode they would match every key.
    pub fn new<I, S>(tokens: I, match_mode: PathIndicatorMatch) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|token| token.as_ref().trim().to_lowercase())
                .filter(|token| !token.is_empty())
                .collect(),
            match_mode,
        }
    }

    /// The key-substring heuristic of the earlier loaders.
    pub fn heuristic() -> Self {
        Self::new(HEURISTIC_PATH_TOKENS, PathIndicatorMatch::Substring)
    }

    pub fn matches(&self, key: &str) -> bool {
        let key = key.to_lowercase();

        match self.match_mode {
            PathIndicatorMatch::Exact => self.tokens.iter().any(|token| *token == key),
            PathIndicatorMatch::Substring => {
                self.tokens.iter().any(|token| key.contains(token.as_str()))
            }
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn match_mode(&self) -> PathIndicatorMatch {
        self.match_mode
    }
}


/// Options of the configuration tree builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionOptions {
    /// Top-level key of the block whose string leaves are all locations.
    pub paths_key: String,

    /// Key that, inside a block, overrides the anchor of its siblings.
    /// Entries with this key are never materialized directly.
    pub anchor_key: String,

    /// Optional key-name rule for locations outside of the paths block.
    pub path_indicator: Option<PathIndicator>,

    /// Entries of the paths block that `ensure_output_directories` creates.
    pub output_directory_targets: Vec<String>,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            paths_key: DEFAULT_PATHS_KEY.to_string(),
            anchor_key: DEFAULT_ANCHOR_KEY.to_string(),
            path_indicator: None,
            output_directory_targets: DEFAULT_OUTPUT_DIRECTORY_TARGETS
                .iter()
                .map(|target| target.to_string())
                .collect(),
        }
    }
}

impl ResolutionOptions {
    pub fn with_path_indicator(mut self, path_indicator: PathIndicator) -> Self {
        self.path_indicator = Some(path_indicator);
        self
    }

    pub fn with_output_directory_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_directory_targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a string value under `key` (outside any paths block) is a location.
    pub(crate) fn is_path_indicator_key(&self, key: &str) -> bool {
        self.path_indicator
            .as_ref()
            .is_some_and(|indicator| indicator.matches(key))
    }

    /// Load builder options from a TOML file. Missing fields take their defaults.
    pub fn load_from_path<S: AsRef<Path>>(options_file_path: S) -> Result<Self> {
        let options_string = fs::read_to_string(options_file_path.as_ref())
            .into_diagnostic()
            .wrap_err_with(|| {
                miette!(
                    "Could not read options file at {}.",
                    options_file_path.as_ref().display()
                )
            })?;

        Self::load_from_toml_str(&options_string)
    }

    pub fn load_from_toml_str(options_string: &str) -> Result<Self> {
        let unresolved_options = toml::from_str::<UnresolvedResolutionOptions>(options_string)
            .into_diagnostic()
            .wrap_err("Could not parse options file!")?;

        unresolved_options
            .resolve()
            .wrap_err("Failed to resolve options.")
    }
}



#[derive(Deserialize, Debug)]
struct UnresolvedPathIndicator {
    tokens: Vec<String>,

    #[serde(default, rename = "match")]
    match_mode: PathIndicatorMatch,
}


#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub(crate) struct UnresolvedResolutionOptions {
    paths_key: Option<String>,

    anchor_key: Option<String>,

    path_indicator: Option<UnresolvedPathIndicator>,

    output_directory_targets: Option<Vec<String>>,
}

impl ResolvableConfiguration for UnresolvedResolutionOptions {
    type Resolved = ResolutionOptions;
    type Error = miette::Report;

    fn resolve(self) -> Result<Self::Resolved> {
        let defaults = ResolutionOptions::default();

        let paths_key = self.paths_key.unwrap_or(defaults.paths_key);
        if paths_key.trim().is_empty() {
            return Err(miette!("Field paths_key must not be empty."));
        }

        let anchor_key = self.anchor_key.unwrap_or(defaults.anchor_key);
        if anchor_key.trim().is_empty() {
            return Err(miette!("Field anchor_key must not be empty."));
        }

        let path_indicator = match self.path_indicator {
            Some(indicator) => {
                let indicator = PathIndicator::new(indicator.tokens, indicator.match_mode);

                if indicator.tokens().is_empty() {
                    return Err(miette!(
                        "Field path_indicator.tokens must contain at least one non-empty token."
                    ));
                }

                Some(indicator)
            }
            None => None,
        };

        let output_directory_targets = self
            .output_directory_targets
            .unwrap_or(defaults.output_directory_targets);

        Ok(ResolutionOptions {
            paths_key,
            anchor_key,
            path_indicator,
            output_directory_targets,
        })
    }
}
