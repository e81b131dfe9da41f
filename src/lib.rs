//! # zddx-tools
//!
//! Maintenance tools for a directory of Z-Wave Device Description XML
//! (ZDDX) files: an indexer writing `ZDDX.indx` and `ZDDX.indxml`, a
//! checker for missing translations and an XSD validator.

pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod file_discovery;
pub mod indexer;
pub mod langcheck;
pub mod libxml2;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod validator;

pub use cli::{CommonArgs, IndexCli, LangCheckCli, ValidateCli, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, ToolArgs};
pub use dom::{
    MAX_DEPTH, XmlDocument, XmlElement, XmlNode, decode_document, load_document, parse_document,
};
pub use error::{ExtractError, LibXml2Error, Result, TreeError, ZddxError};
pub use extract::{IndexLayout, IndexRecord, extract};
pub use file_discovery::FileDiscovery;
pub use indexer::{IndexSummary, Indexer};
pub use langcheck::{CheckSummary, LanguageChecker, LanguageSet, MissingLanguage, check_tree};
pub use libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};
pub use output::Output;
pub use pipeline::{ErrorPolicy, FileFailure, FileOutcome, FileProcessor};
pub use validator::{SchemaValidator, ValidationStatus, ValidationSummary};
