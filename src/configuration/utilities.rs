use std::{
    env::current_dir,
    path::{Component, Path, PathBuf},
};

use miette::{miette, Context, IntoDiagnostic, Result};
use serde_yaml::Value;


pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "config.yaml";


/// Returns the default configuration filepath, which is at
/// `{current directory}/config.yaml`.
pub fn get_default_configuration_file_path() -> Result<PathBuf> {
    let mut configuration_filepath = current_dir()
        .into_diagnostic()
        .wrap_err_with(|| miette!("Could not get the current directory."))?;
    configuration_filepath.push(DEFAULT_CONFIGURATION_FILE_NAME);

    if !configuration_filepath.is_file() {
        return Err(miette!(
            "Could not find {} in the current directory ({}).",
            DEFAULT_CONFIGURATION_FILE_NAME,
            configuration_filepath.display()
        ));
    }

    Ok(configuration_filepath)
}


/// Lexically normalizes `path`: drops `.` components and folds `..` into
/// the preceding component. Never touches the filesystem, so symlinks
/// are not followed and the path does not need to exist.
///
/// A `..` directly below the root is dropped (`/..` is `/`).
#[must_use = "function returns the normalized path"]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                normalized.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(Component::ParentDir) | Some(Component::CurDir) | None => {
                    normalized.push(Component::ParentDir.as_os_str());
                }
            },
            Component::Normal(name) => normalized.push(name),
        }
    }

    // Strips verbatim `\\?\` prefixes on Windows, no-op elsewhere.
    dunce::simplified(&normalized).to_path_buf()
}


/// Joins a child key onto a dotted key path (`paths` + `results` -> `paths.results`).
pub(crate) fn join_key_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}


/// Human-readable name of a raw YAML value's kind, for error messages.
pub(crate) fn describe_yaml_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
