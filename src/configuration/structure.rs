use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};
use serde_yaml::Value;
use tracing::debug;

pub use self::builder::ConfigTreeBuilder;
pub use self::location::ResolvedLocation;
pub use self::node::{ConfigNode, ConfigValue, PathBlock, ScalarValue};
pub use self::options::{
    PathIndicator,
    PathIndicatorMatch,
    ResolutionOptions,
    DEFAULT_ANCHOR_KEY,
    DEFAULT_OUTPUT_DIRECTORY_TARGETS,
    DEFAULT_PATHS_KEY,
    HEURISTIC_PATH_TOKENS,
};
use super::error::{ConfigurationError, ConfigurationResult};
use super::traits::ResolvableConfigurationWithContext;
use super::utilities::{get_default_configuration_file_path, join_key_path};

mod builder;
mod location;
mod materializer;
mod node;
mod options;



/// The parsed, not yet resolved document.
#[derive(Debug)]
pub(crate) struct UnresolvedConfiguration {
    document: Value,
}

/// Everything needed to resolve an [`UnresolvedConfiguration`].
pub(crate) struct ConfigurationContext {
    file_path: Option<PathBuf>,
    project_root: ResolvedLocation,
    options: ResolutionOptions,
}


/// The entire resolved configuration.
///
/// Dereferences to the root [`ConfigNode`], so `configuration.path_block("paths")`
/// and friends work directly.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// This is the file path this `Configuration` instance was loaded from
    /// (`None` if it was built from an in-memory document).
    pub file_path: Option<PathBuf>,

    /// Default anchor of every relative location.
    pub project_root: ResolvedLocation,

    /// Options the tree was built with.
    pub options: ResolutionOptions,

    /// Root of the resolved tree.
    pub tree: ConfigNode,
}


impl ResolvableConfigurationWithContext for UnresolvedConfiguration {
    type Resolved = Configuration;
    type Context = ConfigurationContext;
    type Error = ConfigurationError;

    fn resolve(self, context: Self::Context) -> ConfigurationResult<Self::Resolved> {
        let tree = ConfigTreeBuilder::new(&context.options, context.project_root.clone())
            .build(&self.document)?;

        Ok(Configuration {
            file_path: context.file_path,
            project_root: context.project_root,
            options: context.options,
            tree,
        })
    }
}


impl Configuration {
    /// Load the configuration from a specific file path. Relative locations
    /// are anchored to the directory containing the file.
    pub fn load_from_path<S: AsRef<Path>>(configuration_file_path: S) -> Result<Self> {
        Self::load_from_path_with_options(configuration_file_path, ResolutionOptions::default())
    }

    /// Like [`Configuration::load_from_path`], with custom builder options.
    pub fn load_from_path_with_options<S: AsRef<Path>>(
        configuration_file_path: S,
        options: ResolutionOptions,
    ) -> Result<Self> {
        let configuration_file_path = dunce::canonicalize(configuration_file_path.as_ref())
            .into_diagnostic()
            .wrap_err_with(|| {
                miette!(
                    "Could not canonicalize configuration file path {}.",
                    configuration_file_path.as_ref().display()
                )
            })?;

        let project_root = configuration_file_path
            .parent()
            .ok_or_else(|| miette!("Configuration file path has no parent directory."))?
            .to_path_buf();

        Self::load_from_path_with_project_root(configuration_file_path, project_root, options)
    }

    /// Load the configuration from a specific file path, anchoring relative
    /// locations to `project_root` instead of the file's directory.
    pub fn load_from_path_with_project_root<S, R>(
        configuration_file_path: S,
        project_root: R,
        options: ResolutionOptions,
    ) -> Result<Self>
    where
        S: AsRef<Path>,
        R: AsRef<Path>,
    {
        let configuration_file_path = configuration_file_path.as_ref();

        // Read the configuration file into memory.
        let configuration_string = fs::read_to_string(configuration_file_path)
            .into_diagnostic()
            .wrap_err_with(|| {
                miette!(
                    "Could not read configuration file {}.",
                    configuration_file_path.display()
                )
            })?;

        let document = serde_yaml::from_str::<Value>(&configuration_string)
            .into_diagnostic()
            .wrap_err("Could not parse configuration file!")?;

        let project_root = ResolvedLocation::anchor_at(project_root)
            .wrap_err("Could not resolve project root.")?;

        debug!(
            file_path = %configuration_file_path.display(),
            project_root = %project_root,
            "Resolving configuration."
        );

        let resolved_configuration = UnresolvedConfiguration { document }
            .resolve(ConfigurationContext {
                file_path: Some(configuration_file_path.to_path_buf()),
                project_root,
                options,
            })
            .wrap_err("Failed to resolve configuration.")?;

        Ok(resolved_configuration)
    }

    /// Load the configuration from the default path (`./config.yaml`).
    pub fn load_from_default_path() -> Result<Configuration> {
        Configuration::load_from_path(
            get_default_configuration_file_path()
                .wrap_err_with(|| "Could not load configuration file at default path.")?,
        )
    }

    /// Builds a configuration from an in-memory YAML document.
    pub fn from_yaml_str<R: AsRef<Path>>(
        configuration_string: &str,
        project_root: R,
        options: ResolutionOptions,
    ) -> ConfigurationResult<Self> {
        let document = serde_yaml::from_str::<Value>(configuration_string)?;
        let project_root = ResolvedLocation::anchor_at(project_root)?;

        UnresolvedConfiguration { document }.resolve(ConfigurationContext {
            file_path: None,
            project_root,
            options,
        })
    }

    /// The top-level paths block.
    pub fn paths(&self) -> ConfigurationResult<&PathBlock> {
        self.tree.path_block(&self.options.paths_key)
    }

    /// Creates the output directories listed in
    /// [`ResolutionOptions::output_directory_targets`] (by default `working`
    /// and every directory of `results`).
    ///
    /// Anchor entries (`root`) are never created directly; they only come
    /// into existence as parents of other directories. Targets missing from
    /// the configuration are skipped. Nothing is ever removed or overwritten.
    pub fn ensure_output_directories(&self) -> ConfigurationResult<()> {
        let paths = match self.tree.get(&self.options.paths_key) {
            Ok(ConfigValue::PathBlock(paths)) => paths,
            Ok(other) => {
                return Err(ConfigurationError::format(
                    self.options.paths_key.as_str(),
                    format!("expected a path block, found {}", other.kind_name()),
                ));
            }
            Err(ConfigurationError::KeyNotFound { .. }) => {
                debug!("No paths block, no output directories to create.");
                return Ok(());
            }
            Err(error) => return Err(error),
        };

        for target in &self.options.output_directory_targets {
            let target_key_path = join_key_path(paths.key_path(), target);

            if *target == self.options.anchor_key {
                debug!(
                    key_path = target_key_path.as_str(),
                    "Output directory target is an anchor entry, skipping."
                );
                continue;
            }

            match paths.get(target) {
                Ok(ConfigValue::Location(location)) => {
                    materializer::materialize_location(location, &target_key_path)?;
                }
                Ok(ConfigValue::PathBlock(block)) => block.ensure_all_directories_exist()?,
                Ok(other) => {
                    return Err(ConfigurationError::format(
                        target_key_path,
                        format!(
                            "output directory target must be a location or a path block, found {}",
                            other.kind_name()
                        ),
                    ));
                }
                Err(ConfigurationError::KeyNotFound { .. }) => {
                    debug!(
                        key_path = target_key_path.as_str(),
                        "Output directory target not configured, skipping."
                    );
                }
                Err(error) => return Err(error),
            }
        }

        Ok(())
    }
}

impl Deref for Configuration {
    type Target = ConfigNode;

    fn deref(&self) -> &Self::Target {
        &self.tree
    }
}
