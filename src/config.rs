use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::Path,
};

/// Namespace written on the root element of emitted documents.
pub const DEFAULT_NAMESPACE: &str = "http://www.openmicroscopy.org/Schemas/OME/2015-01";

/// What to do when a second object claims an identifier that is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with [`ModelError::DuplicateIdentifier`].
    #[default]
    Reject,
    /// Keep the first declaration. Later ones are skipped along with their content, each with a
    /// warning.
    FirstWins,
    /// Keep the last declaration. Earlier ones are skipped along with their content, each with a
    /// warning.
    LastWins,
}

/// What to do with a child element the parent's schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementPolicy {
    /// Skip it and record a warning.
    #[default]
    Warn,
    /// Skip it silently.
    Ignore,
    /// Fail with [`ModelError::Schema`].
    Reject,
}

/// Options shared by parsing and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub duplicate_identifiers: DuplicatePolicy,
    /// Fail the parse when any reference is left unresolved or unrecognized.
    pub strict_references: bool,
    pub undeclared_elements: ElementPolicy,
    /// Warn about identifiers that do not follow the `Type:n` / LSID convention.
    pub validate_identifiers: bool,
    pub namespace: String,
    /// Spaces per nesting level when writing. Zero writes a single line.
    pub indent: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            duplicate_identifiers: DuplicatePolicy::default(),
            strict_references: false,
            undeclared_elements: ElementPolicy::default(),
            validate_identifiers: true,
            namespace: DEFAULT_NAMESPACE.to_string(),
            indent: 2,
        }
    }
}

impl ModelConfig {
    pub fn strict() -> Self {
        ModelConfig {
            strict_references: true,
            undeclared_elements: ElementPolicy::Reject,
            ..Default::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ModelError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ModelError> {
        Ok(toml::to_string(self)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        tracing::debug!("Reading model config from {:?}", path.as_ref());
        let content = read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn write_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        tracing::debug!("Writing model config to {:?}", path.as_ref());
        write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
