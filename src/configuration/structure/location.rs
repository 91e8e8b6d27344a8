use std::{
    env::current_dir,
    fmt::{self, Display, Formatter},
    ops::Deref,
    path::{Component, Path, PathBuf},
};

use serde::Serialize;
use tracing::trace;

use crate::configuration::{
    error::{ConfigurationError, ConfigurationResult},
    utilities::normalize_lexically,
};


/// An absolute, lexically normalized filesystem location.
///
/// Whether it denotes a file or a directory is up to whoever uses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResolvedLocation(PathBuf);

impl ResolvedLocation {
    /// Turns `base` into an anchor location. A relative `base` is taken to be
    /// relative to the current directory.
    pub fn anchor_at<P: AsRef<Path>>(base: P) -> ConfigurationResult<Self> {
        let base = base.as_ref();
        let raw = base.to_string_lossy().into_owned();

        validate_location_string(&raw, "<project root>")?;

        if base.is_absolute() {
            return Ok(Self(normalize_lexically(base)));
        }

        let working_directory =
            current_dir().map_err(|error| ConfigurationError::PathResolution {
                key_path: "<project root>".to_string(),
                raw,
                reason: format!("could not determine the current directory: {error}"),
            })?;

        Ok(Self(normalize_lexically(&working_directory.join(base))))
    }

    /// Resolves a location string found at `key_path`.
    ///
    /// Absolute strings are only normalized; relative ones are joined onto `anchor` first.
    pub fn resolve(raw: &str, anchor: &ResolvedLocation, key_path: &str) -> ConfigurationResult<Self> {
        validate_location_string(raw, key_path)?;

        let raw_path = Path::new(raw);
        let resolved = if raw_path.is_absolute() {
            normalize_lexically(raw_path)
        } else {
            normalize_lexically(&anchor.0.join(raw_path))
        };

        if !resolved.is_absolute() {
            // Only reachable on Windows for drive-relative (`C:foo`) or rooted (`\foo`) strings.
            return Err(ConfigurationError::PathResolution {
                key_path: key_path.to_string(),
                raw: raw.to_string(),
                reason: "does not resolve to an absolute path".to_string(),
            });
        }

        trace!(key_path, raw, resolved = %resolved.display(), "Resolved location.");

        Ok(Self(resolved))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl Deref for ResolvedLocation {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for ResolvedLocation {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for ResolvedLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}


fn validate_location_string(raw: &str, key_path: &str) -> ConfigurationResult<()> {
    let reject = |reason: &str| ConfigurationError::PathResolution {
        key_path: key_path.to_string(),
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    if raw.contains('\0') {
        return Err(reject("contains a NUL byte"));
    }

    if cfg!(windows) {
        const RESERVED_CHARACTERS: [char; 6] = ['<', '>', '"', '|', '?', '*'];

        let has_reserved_character = Path::new(raw).components().any(|component| {
            matches!(component, Component::Normal(name)
                if name.to_string_lossy().contains(RESERVED_CHARACTERS.as_slice()))
        });

        if has_reserved_character {
            return Err(reject("contains characters that are reserved on Windows"));
        }
    }

    Ok(())
}
