use std::{io, string::FromUtf8Error};

use quick_xml::events::attributes::AttrError;
use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

/// Fatal failures raised while constructing, linking or emitting a model.
///
/// Graph-completeness problems (dangling references, unrecognized reference kinds) are not
/// errors; they are collected as [`ParseDiagnostic`](crate::codec::ParseDiagnostic) values
/// returned next to the partial graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ModelError {
    #[error("<{element}> requires an ID attribute but none was given")]
    MissingRequiredIdentifier { element: String },
    #[error("Identifier '{id}' is declared by more than one object")]
    DuplicateIdentifier { id: String },
    #[error("<{role}> must contain exactly one concrete element, found {found:?}")]
    AmbiguousVariant { role: String, found: Vec<String> },
    #[error("Invalid quantity {element}.{property}='{value}': {reason}")]
    QuantityParse {
        element: String,
        property: String,
        value: String,
        reason: String,
    },
    #[error("<{element}> allows at most one <{child}>, found {count}")]
    CardinalityViolation {
        element: String,
        child: String,
        count: usize,
    },
    #[error("Markup error: {0}")]
    Markup(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("{0} reference(s) could not be resolved")]
    UnresolvedReferences(usize),
}

impl ModelError {
    /// True for the data errors that abort construction of the enclosing element.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ModelError::MissingRequiredIdentifier { .. }
                | ModelError::DuplicateIdentifier { .. }
                | ModelError::AmbiguousVariant { .. }
                | ModelError::QuantityParse { .. }
                | ModelError::CardinalityViolation { .. }
        )
    }
}

impl From<quick_xml::Error> for ModelError {
    fn from(src: quick_xml::Error) -> ModelError {
        ModelError::Markup(format!("{src}"))
    }
}

impl From<AttrError> for ModelError {
    fn from(src: AttrError) -> ModelError {
        ModelError::Markup(format!("Malformed attribute: {src}"))
    }
}

impl From<toml::de::Error> for ModelError {
    fn from(src: toml::de::Error) -> ModelError {
        ModelError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for ModelError {
    fn from(src: toml::ser::Error) -> ModelError {
        ModelError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for ModelError {
    fn from(src: JsonError) -> ModelError {
        ModelError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<FromUtf8Error> for ModelError {
    fn from(src: FromUtf8Error) -> ModelError {
        ModelError::Serialization(format!("Output is not valid UTF-8: {src}"))
    }
}

impl From<io::Error> for ModelError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => ModelError::NotFound(format!("{x}")),
            _ => ModelError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<RegexError> for ModelError {
    fn from(x: RegexError) -> Self {
        ModelError::Schema(format!("Regex parse failed: {x}"))
    }
}
