//! Turns the raw YAML document into a resolved [`ConfigNode`] tree.
//!
//! Resolution rules:
//! - every string leaf inside the paths block (and, if a [`PathIndicator`] is
//!   configured, every string leaf whose key matches it) becomes a
//!   [`ResolvedLocation`];
//! - relative locations are joined onto the nearest enclosing anchor, which is
//!   the project root unless a block declares its own anchor entry (`root`);
//! - a block's anchor entry is itself resolved against the *parent's* anchor.
//!
//! [`PathIndicator`]: super::options::PathIndicator

use std::collections::{BTreeMap, BTreeSet};

use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use super::{
    location::ResolvedLocation,
    node::{ConfigNode, ConfigValue, PathBlock, ScalarValue},
    options::ResolutionOptions,
};
use crate::configuration::{
    error::{ConfigurationError, ConfigurationResult},
    utilities::{describe_yaml_value, join_key_path},
};


/// Where in the document the block currently being built lives.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum BlockKind {
    /// The document root.
    Document,

    /// A block outside of the paths section.
    Plain,

    /// The paths block or anything nested inside it.
    Paths,
}


pub struct ConfigTreeBuilder<'o> {
    options: &'o ResolutionOptions,
    project_root: ResolvedLocation,
}

impl<'o> ConfigTreeBuilder<'o> {
    pub fn new(options: &'o ResolutionOptions, project_root: ResolvedLocation) -> Self {
        Self {
            options,
            project_root,
        }
    }

    /// Builds the whole tree. Either every entry resolves or the first error is returned.
    pub fn build(&self, document: &Value) -> ConfigurationResult<ConfigNode> {
        let Value::Mapping(mapping) = strip_tag(document) else {
            return Err(ConfigurationError::format(
                "<document>",
                format!(
                    "expected a mapping at the document root, found {}",
                    describe_yaml_value(document)
                ),
            ));
        };

        let (node, _) = self.build_block(mapping, "", &self.project_root, BlockKind::Document)?;

        Ok(node)
    }

    fn build_block(
        &self,
        mapping: &Mapping,
        key_path: &str,
        parent_base: &ResolvedLocation,
        kind: BlockKind,
    ) -> ConfigurationResult<(ConfigNode, BlockAnchoring)> {
        trace!(key_path, ?kind, "Building configuration block.");

        let raw_entries = stringify_keys(mapping, key_path)?;

        let anchoring = self.resolve_block_anchor(&raw_entries, key_path, parent_base, kind)?;
        let base = anchoring.base(parent_base);

        let mut entries = BTreeMap::new();

        for (key, raw_value) in raw_entries {
            let entry_key_path = join_key_path(key_path, &key);

            let value = match &anchoring.anchor {
                Some(anchor) if key == self.options.anchor_key => {
                    ConfigValue::Location(anchor.clone())
                }
                _ => self.build_value(&key, raw_value, &entry_key_path, base, kind)?,
            };

            entries.insert(key, value);
        }

        Ok((ConfigNode::new(key_path.to_string(), entries), anchoring))
    }

    /// Finds and resolves the block's own anchor entry, if it has one.
    fn resolve_block_anchor(
        &self,
        raw_entries: &[(String, &Value)],
        key_path: &str,
        parent_base: &ResolvedLocation,
        kind: BlockKind,
    ) -> ConfigurationResult<BlockAnchoring> {
        let anchor_key = self.options.anchor_key.as_str();

        let Some((_, raw_anchor)) = raw_entries.iter().find(|(key, _)| key == anchor_key) else {
            return Ok(BlockAnchoring::inherited());
        };

        let anchor_key_path = join_key_path(key_path, anchor_key);
        let raw_anchor = strip_tag(raw_anchor);

        let raw_anchor_string = match (kind, raw_anchor) {
            (BlockKind::Paths, Value::Null) => "",
            (BlockKind::Paths, Value::String(string)) => string.as_str(),
            (BlockKind::Paths, other) => {
                return Err(ConfigurationError::format(
                    anchor_key_path,
                    format!(
                        "expected a location string, found {}",
                        describe_yaml_value(other)
                    ),
                ));
            }
            (_, Value::String(string)) if self.options.is_path_indicator_key(anchor_key) => {
                string.as_str()
            }
            _ => return Ok(BlockAnchoring::inherited()),
        };

        // An empty anchor means "same as the parent's".
        let anchor = ResolvedLocation::resolve(raw_anchor_string, parent_base, &anchor_key_path)?;

        debug!(
            key_path = anchor_key_path.as_str(),
            anchor = %anchor,
            "Block declares its own anchor."
        );

        Ok(BlockAnchoring {
            anchor: Some(anchor),
        })
    }

    fn build_value(
        &self,
        key: &str,
        raw_value: &Value,
        key_path: &str,
        base: &ResolvedLocation,
        parent_kind: BlockKind,
    ) -> ConfigurationResult<ConfigValue> {
        let in_paths = parent_kind == BlockKind::Paths;
        let is_paths_block =
            parent_kind == BlockKind::Document && key == self.options.paths_key;

        match strip_tag(raw_value) {
            Value::Mapping(mapping) if in_paths || is_paths_block => {
                let (node, anchoring) = self.build_block(mapping, key_path, base, BlockKind::Paths)?;

                let materializable = node
                    .keys()
                    .map(|child_key| (child_key.to_string(), child_key != self.options.anchor_key))
                    .collect();

                Ok(ConfigValue::PathBlock(PathBlock::new(
                    node,
                    anchoring.base(base).clone(),
                    anchoring.anchor,
                    materializable,
                )))
            }
            Value::Mapping(mapping) => {
                let (node, _) = self.build_block(mapping, key_path, base, BlockKind::Plain)?;
                Ok(ConfigValue::Node(node))
            }
            other if is_paths_block => Err(ConfigurationError::format(
                key_path,
                format!("expected a mapping, found {}", describe_yaml_value(other)),
            )),
            Value::String(raw_location) if in_paths || self.options.is_path_indicator_key(key) => {
                let location = ResolvedLocation::resolve(raw_location, base, key_path)?;
                debug!(key_path, location = %location, "Resolved location.");

                Ok(ConfigValue::Location(location))
            }
            other if in_paths => Err(ConfigurationError::format(
                key_path,
                format!(
                    "expected a location string, found {}",
                    describe_yaml_value(other)
                ),
            )),
            Value::Sequence(sequence) => Ok(ConfigValue::Sequence(sequence.clone())),
            Value::Null => Ok(ConfigValue::Scalar(ScalarValue::Null)),
            Value::Bool(boolean) => Ok(ConfigValue::Scalar(ScalarValue::Bool(*boolean))),
            Value::Number(number) => Ok(ConfigValue::Scalar(ScalarValue::Number(number.clone()))),
            Value::String(string) => Ok(ConfigValue::Scalar(ScalarValue::String(string.clone()))),
            Value::Tagged(_) => unreachable!("tags are stripped above"),
        }
    }
}


/// The anchor a block declared for itself, if any.
struct BlockAnchoring {
    anchor: Option<ResolvedLocation>,
}

impl BlockAnchoring {
    fn inherited() -> Self {
        Self { anchor: None }
    }

    fn base<'a>(&'a self, parent_base: &'a ResolvedLocation) -> &'a ResolvedLocation {
        self.anchor.as_ref().unwrap_or(parent_base)
    }
}


/// Tags (`!foo value`) carry no meaning here; only the tagged value counts.
fn strip_tag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => strip_tag(&tagged.value),
        other => other,
    }
}


/// Converts mapping keys to strings. Scalar keys (numbers, booleans) are
/// accepted in their textual form; anything else is a format error.
fn stringify_keys<'m>(
    mapping: &'m Mapping,
    key_path: &str,
) -> ConfigurationResult<Vec<(String, &'m Value)>> {
    let mut seen_keys = BTreeSet::new();
    let mut entries = Vec::with_capacity(mapping.len());

    for (raw_key, value) in mapping {
        let key = match strip_tag(raw_key) {
            Value::String(string) => string.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(boolean) => boolean.to_string(),
            other => {
                return Err(ConfigurationError::format(
                    if key_path.is_empty() { "<document>" } else { key_path },
                    format!(
                        "keys must be strings, found {}",
                        describe_yaml_value(other)
                    ),
                ));
            }
        };

        if !seen_keys.insert(key.clone()) {
            return Err(ConfigurationError::format(
                join_key_path(key_path, &key),
                "key is defined more than once",
            ));
        }

        entries.push((key, value));
    }

    Ok(entries)
}
