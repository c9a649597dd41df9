//! Error and warning types for EPUB conversion
//!
//! Fatal problems are [`ConvertError`] values and abort the whole conversion.
//! Recoverable problems are [`Warning`] values collected alongside the result.

use serde::Serialize;
use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Conversion failure
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("META-INF/container.xml not found")]
    MissingContainer,

    #[error("Could not find .opf file path in container.xml")]
    MalformedContainer,

    #[error(".opf file not found at path: {path}")]
    MissingPackageDocument { path: String },

    #[error("Failed to read ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error in {path}: {message}")]
    Xml { path: String, message: String },

    #[error("HTML rewrite failed for {path}: {message}")]
    Rewrite { path: String, message: String },

    #[error("Markup rendering failed: {0}")]
    Render(String),

    #[error("Input is not valid UTF-8 text: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),

    #[error("Strict mode: {0}")]
    Strict(Warning),
}

/// A recoverable problem; the affected unit is skipped or left unmodified
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    #[error("manifest id '{id}' declared more than once, keeping the last declaration")]
    DuplicateManifestId { id: String },

    #[error("spine itemref without idref")]
    SpineEntryWithoutIdref,

    #[error("spine idref '{idref}' has no manifest item")]
    UnresolvedSpineRef { idref: String },

    #[error("stylesheet '{href}' missing from archive")]
    MissingStylesheet { href: String },

    #[error("content document '{href}' missing from archive")]
    MissingContentDocument { href: String },

    #[error("content document '{href}' is a frameset and has no body")]
    MissingBody { href: String },

    #[error("asset '{reference}' referenced from '{document}' not found at '{resolved}'")]
    MissingAsset {
        document: String,
        reference: String,
        resolved: String,
    },
}

/// Successful conversion, tagged with whether anything was omitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Every member was found and processed
    Complete(T),
    /// The value is usable but some pieces were skipped or left unresolved
    Partial { value: T, warnings: Vec<Warning> },
}

impl<T> Outcome<T> {
    /// Build an outcome from a value and the warnings gathered while producing it
    pub fn from_parts(value: T, warnings: Vec<Warning>) -> Self {
        if warnings.is_empty() {
            Outcome::Complete(value)
        } else {
            Outcome::Partial { value, warnings }
        }
    }

    /// Apply strict mode: the first warning becomes a hard failure
    pub fn into_strict(self) -> Result<T> {
        match self {
            Outcome::Complete(value) => Ok(value),
            Outcome::Partial { value, warnings } => match warnings.into_iter().next() {
                Some(first) => Err(ConvertError::Strict(first)),
                None => Ok(value),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Complete(value) | Outcome::Partial { value, .. } => value,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            Outcome::Complete(_) => &[],
            Outcome::Partial { warnings, .. } => warnings,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Complete(value) | Outcome::Partial { value, .. } => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Complete(value) => Outcome::Complete(f(value)),
            Outcome::Partial { value, warnings } => Outcome::Partial {
                value: f(value),
                warnings,
            },
        }
    }
}
