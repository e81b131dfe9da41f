use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum ZddxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error opening XML {}", display_name(.path))]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing XML {}: {details}", display_name(.path))]
    XmlParse { path: PathBuf, details: String },

    /// Parse failure worded the way the language checker reports it
    #[error("Error opening XML {}: {details}", display_name(.path))]
    XmlOpen { path: PathBuf, details: String },

    #[error("{0}")]
    Extract(#[from] ExtractError),

    #[error("Error creating index file {}: {details}", .path.display())]
    IndexWrite { path: PathBuf, details: String },

    #[error("Error opening XSD {}", display_name(.path))]
    SchemaOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing XSD {}: {details}", display_name(.path))]
    SchemaCompile { path: PathBuf, details: String },

    #[error("File system traversal error: {} - {reason}", .path.display())]
    FileSystemTraversal { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },
}

/// Reasons a single device description cannot be turned into an index record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing <{section}> section")]
    MissingSection { section: &'static str },

    #[error("missing <{field}> in <deviceData>")]
    MissingField { field: &'static str },

    #[error("<{field}> has no value attribute")]
    MissingValue { field: &'static str },

    #[error("invalid literal for int() with base 16 in <{field}>: '{value}'")]
    InvalidHex { field: &'static str, value: String },
}

/// Reasons file contents cannot be turned into an XML tree
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("{0}")]
    Syntax(#[from] roxmltree::Error),

    #[error("elements nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("content is not valid {encoding}")]
    Undecodable { encoding: &'static str },
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: {details}")]
    SchemaParseFailed { details: String },

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Document parsing failed: {details}")]
    DocumentParseFailed { details: String },

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,

    #[error("Path is not representable as a C string: {}", .path.display())]
    InvalidPath { path: PathBuf },
}

impl From<LibXml2Error> for ZddxError {
    fn from(err: LibXml2Error) -> Self {
        ZddxError::LibXml2Internal {
            details: err.to_string(),
        }
    }
}

impl From<crate::config::ConfigError> for ZddxError {
    fn from(err: crate::config::ConfigError) -> Self {
        ZddxError::Config(err.to_string())
    }
}

impl ZddxError {
    /// The error without the file it concerns, for messages that already
    /// name the file.
    pub fn reason(&self) -> String {
        match self {
            ZddxError::ReadFile { source, .. } | ZddxError::SchemaOpen { source, .. } => {
                source.to_string()
            }
            ZddxError::XmlParse { details, .. }
            | ZddxError::XmlOpen { details, .. }
            | ZddxError::SchemaCompile { details, .. }
            | ZddxError::IndexWrite { details, .. } => details.clone(),
            other => other.to_string(),
        }
    }
}

/// The file name alone, which is how the tools have always reported files.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ZddxError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
