use std::fs;

use tracing::{debug, info};

use super::{
    location::ResolvedLocation,
    node::{ConfigValue, PathBlock},
};
use crate::configuration::{
    error::{ConfigurationError, ConfigurationResult},
    utilities::join_key_path,
};


#[derive(Default, Debug)]
struct MaterializationSummary {
    created: usize,
    already_present: usize,
}


pub(crate) fn materialize_path_block(block: &PathBlock) -> ConfigurationResult<()> {
    let mut summary = MaterializationSummary::default();
    visit_path_block(block, &mut summary)?;

    info!(
        key_path = block.key_path(),
        created = summary.created,
        already_present = summary.already_present,
        "Ensured directories exist."
    );

    Ok(())
}

pub(crate) fn materialize_location(
    location: &ResolvedLocation,
    key_path: &str,
) -> ConfigurationResult<()> {
    let mut summary = MaterializationSummary::default();
    ensure_directory_exists(location, key_path, &mut summary)?;

    if summary.created > 0 {
        info!(key_path, location = %location, "Created directory.");
    }

    Ok(())
}


fn visit_path_block(block: &PathBlock, summary: &mut MaterializationSummary) -> ConfigurationResult<()> {
    for (key, value) in block.iter() {
        if !block.is_materializable(key) {
            debug!(
                key_path = join_key_path(block.key_path(), key).as_str(),
                "Skipping anchor entry."
            );
            continue;
        }

        match value {
            ConfigValue::Location(location) => {
                ensure_directory_exists(
                    location,
                    &join_key_path(block.key_path(), key),
                    summary,
                )?;
            }
            ConfigValue::PathBlock(child_block) => visit_path_block(child_block, summary)?,
            // The builder only puts locations and path blocks into a path block.
            ConfigValue::Scalar(_) | ConfigValue::Sequence(_) | ConfigValue::Node(_) => {}
        }
    }

    Ok(())
}


/// `create_dir_all`, but a no-op for directories that already exist.
/// Existing files are reported as errors rather than touched.
fn ensure_directory_exists(
    location: &ResolvedLocation,
    key_path: &str,
    summary: &mut MaterializationSummary,
) -> ConfigurationResult<()> {
    if location.is_dir() {
        summary.already_present += 1;
        return Ok(());
    }

    fs::create_dir_all(location).map_err(|source| ConfigurationError::DirectoryCreation {
        key_path: key_path.to_string(),
        location: location.as_path().to_path_buf(),
        source,
    })?;

    debug!(key_path, location = %location, "Created directory.");
    summary.created += 1;

    Ok(())
}
