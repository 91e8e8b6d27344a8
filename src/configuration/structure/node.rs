use std::{collections::BTreeMap, ops::Deref};

use serde::{Serialize, Serializer};
use serde_yaml::{Number, Value};

use super::{location::ResolvedLocation, materializer};
use crate::configuration::{
    error::{ConfigurationError, ConfigurationResult},
    utilities::join_key_path,
};


/// A plain configuration value, kept verbatim from the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl ScalarValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(string) => Some(string.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(boolean) => Some(*boolean),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(number) => number.as_f64(),
            _ => None,
        }
    }
}


/// A single entry of a [`ConfigNode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Scalar(ScalarValue),

    /// Passed through without interpretation.
    Sequence(Vec<Value>),

    Location(ResolvedLocation),

    Node(ConfigNode),

    PathBlock(PathBlock),
}

impl ConfigValue {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::Scalar(_) => "a scalar",
            ConfigValue::Sequence(_) => "a sequence",
            ConfigValue::Location(_) => "a location",
            ConfigValue::Node(_) => "a node",
            ConfigValue::PathBlock(_) => "a path block",
        }
    }

    pub fn as_location(&self) -> Option<&ResolvedLocation> {
        match self {
            ConfigValue::Location(location) => Some(location),
            _ => None,
        }
    }

    /// Path blocks are nodes too.
    pub fn as_node(&self) -> Option<&ConfigNode> {
        match self {
            ConfigValue::Node(node) => Some(node),
            ConfigValue::PathBlock(block) => Some(&block.node),
            _ => None,
        }
    }

    pub fn as_path_block(&self) -> Option<&PathBlock> {
        match self {
            ConfigValue::PathBlock(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            ConfigValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            ConfigValue::Sequence(sequence) => Some(sequence.as_slice()),
            _ => None,
        }
    }
}


/// A resolved, read-only configuration block. Entries are looked up by their
/// original key name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigNode {
    key_path: String,
    entries: BTreeMap<String, ConfigValue>,
}

impl ConfigNode {
    pub(crate) fn new(key_path: String, entries: BTreeMap<String, ConfigValue>) -> Self {
        Self { key_path, entries }
    }

    /// Dotted path of this node from the document root (empty for the root itself).
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn get(&self, key: &str) -> ConfigurationResult<&ConfigValue> {
        self.entries
            .get(key)
            .ok_or_else(|| ConfigurationError::KeyNotFound {
                node_path: self.display_path().to_string(),
                key: key.to_string(),
            })
    }

    pub fn location(&self, key: &str) -> ConfigurationResult<&ResolvedLocation> {
        let value = self.get(key)?;
        value
            .as_location()
            .ok_or_else(|| self.unexpected_type(key, "a location", value))
    }

    /// Returns the child node at `key`, which may also be a path block.
    pub fn node(&self, key: &str) -> ConfigurationResult<&ConfigNode> {
        let value = self.get(key)?;
        value
            .as_node()
            .ok_or_else(|| self.unexpected_type(key, "a node", value))
    }

    pub fn path_block(&self, key: &str) -> ConfigurationResult<&PathBlock> {
        let value = self.get(key)?;
        value
            .as_path_block()
            .ok_or_else(|| self.unexpected_type(key, "a path block", value))
    }

    pub fn scalar(&self, key: &str) -> ConfigurationResult<&ScalarValue> {
        let value = self.get(key)?;
        value
            .as_scalar()
            .ok_or_else(|| self.unexpected_type(key, "a scalar", value))
    }

    pub fn string(&self, key: &str) -> ConfigurationResult<&str> {
        let value = self.get(key)?;
        value
            .as_scalar()
            .and_then(ScalarValue::as_str)
            .ok_or_else(|| self.unexpected_type(key, "a string", value))
    }

    /// Looks up a value by its dotted key path relative to this node,
    /// e.g. `paths.results.plots`.
    pub fn lookup(&self, dotted_key_path: &str) -> ConfigurationResult<&ConfigValue> {
        let mut segments = dotted_key_path.split('.');

        // PANIC SAFETY: `split` always yields at least one segment.
        let first_segment = segments.next().unwrap();
        let mut current_value = self.get(first_segment)?;
        let mut current_key_path = join_key_path(&self.key_path, first_segment);

        for segment in segments {
            let node = current_value.as_node().ok_or_else(|| {
                ConfigurationError::UnexpectedValueType {
                    key_path: current_key_path.clone(),
                    expected: "a node",
                    found: current_value.kind_name(),
                }
            })?;

            current_value = node.get(segment)?;
            current_key_path = join_key_path(&current_key_path, segment);
        }

        Ok(current_value)
    }

    fn display_path(&self) -> &str {
        if self.key_path.is_empty() {
            "<document>"
        } else {
            &self.key_path
        }
    }

    fn unexpected_type(
        &self,
        key: &str,
        expected: &'static str,
        found: &ConfigValue,
    ) -> ConfigurationError {
        ConfigurationError::UnexpectedValueType {
            key_path: join_key_path(&self.key_path, key),
            expected,
            found: found.kind_name(),
        }
    }
}

impl Serialize for ConfigNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.entries.serialize(serializer)
    }
}


/// A block under the paths section. Its string leaves are locations
/// resolved against [`PathBlock::base`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathBlock {
    node: ConfigNode,

    /// Location relative children were resolved against.
    base: ResolvedLocation,

    /// The block's own anchor entry (`root`), if it declared one.
    anchor: Option<ResolvedLocation>,

    /// Per-entry flag: may the materializer create this entry directly?
    materializable: BTreeMap<String, bool>,
}

impl PathBlock {
    pub(crate) fn new(
        node: ConfigNode,
        base: ResolvedLocation,
        anchor: Option<ResolvedLocation>,
        materializable: BTreeMap<String, bool>,
    ) -> Self {
        Self {
            node,
            base,
            anchor,
            materializable,
        }
    }

    pub fn base(&self) -> &ResolvedLocation {
        &self.base
    }

    pub fn anchor(&self) -> Option<&ResolvedLocation> {
        self.anchor.as_ref()
    }

    pub fn is_materializable(&self, key: &str) -> bool {
        self.materializable.get(key).copied().unwrap_or(false)
    }

    pub fn as_node(&self) -> &ConfigNode {
        &self.node
    }

    /// Creates every directory in this block (recursing into nested blocks),
    /// except anchor entries, which only come into existence as parents of
    /// their descendants.
    ///
    /// Existing directories are left untouched. Stops at the first failure.
    pub fn ensure_all_directories_exist(&self) -> ConfigurationResult<()> {
        materializer::materialize_path_block(self)
    }
}

impl Deref for PathBlock {
    type Target = ConfigNode;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl Serialize for PathBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.node.serialize(serializer)
    }
}
