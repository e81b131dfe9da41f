//! Schema validation of device description files.
//!
//! The schema is read and compiled once, before any document is touched.
//! Each document is then parsed and validated by libxml2 with its own
//! validation context, so files may be checked on several threads against
//! the one compiled schema.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{LibXml2Error, Result, ZddxError, display_name};
use crate::libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};
use crate::pipeline::{ErrorPolicy, FileFailure, FileProcessor};

pub const DEFAULT_SCHEMA: &str = "z-wave_v2.xsd";

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStatus {
    Valid,
    /// Schema violations, already formatted as error-log lines
    Invalid { error_count: i32, log: Vec<String> },
    /// libxml2 gave up on the document
    Error { code: i32 },
}

impl ValidationStatus {
    fn from_result(result: ValidationResult, file_name: &str) -> Self {
        match result {
            ValidationResult::Valid => ValidationStatus::Valid,
            ValidationResult::Invalid {
                error_count,
                errors,
            } => ValidationStatus::Invalid {
                error_count,
                log: errors
                    .iter()
                    .map(|d| d.log_line(file_name))
                    .collect(),
            },
            ValidationResult::InternalError { code } => ValidationStatus::Error { code },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }
}

/// Aggregated results of one validator run
#[derive(Debug, Default)]
pub struct ValidationSummary {
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub error_files: usize,
    pub failures: Vec<FileFailure>,
    pub duration: Duration,
}

impl ValidationSummary {
    pub fn all_valid(&self) -> bool {
        self.valid_files == self.total_files && self.failures.is_empty()
    }
}

/// A compiled schema plus the settings used to apply it
pub struct SchemaValidator {
    wrapper: LibXml2Wrapper,
    schema: XmlSchemaPtr,
    schema_path: PathBuf,
    policy: ErrorPolicy,
    processor: FileProcessor,
}

impl SchemaValidator {
    /// Read and compile the schema at `schema_path`.
    pub fn load(schema_path: &Path) -> Result<Self> {
        let data = fs::read(schema_path).map_err(|source| ZddxError::SchemaOpen {
            path: schema_path.to_path_buf(),
            source,
        })?;

        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper
            .parse_schema_from_memory(&data)
            .map_err(|e| ZddxError::SchemaCompile {
                path: schema_path.to_path_buf(),
                details: match e {
                    LibXml2Error::SchemaParseFailed { details } => details,
                    other => other.to_string(),
                },
            })?;

        info!("Compiled schema {}", schema_path.display());
        Ok(Self {
            wrapper,
            schema,
            schema_path: schema_path.to_path_buf(),
            policy: ErrorPolicy::AbortRun,
            processor: FileProcessor::sequential(),
        })
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_processor(mut self, processor: FileProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Parse and validate one document.
    pub fn validate_file(&self, path: &Path) -> Result<ValidationStatus> {
        File::open(path).map_err(|source| ZddxError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let document = self
            .wrapper
            .parse_document(path)
            .map_err(|e| ZddxError::XmlParse {
                path: path.to_path_buf(),
                details: match e {
                    LibXml2Error::DocumentParseFailed { details } => details,
                    other => other.to_string(),
                },
            })?;

        let result = self.wrapper.validate_document(&self.schema, &document)?;
        debug!("Validated {} (valid: {})", path.display(), result.is_valid());
        Ok(ValidationStatus::from_result(result, &display_name(path)))
    }

    /// Validate every file, writing one block of error-log lines to `out`
    /// per invalid document. Valid documents print nothing.
    pub fn run(&self, files: &[PathBuf], out: &mut dyn Write) -> Result<ValidationSummary> {
        let start = Instant::now();
        info!("Validating {} file(s) against {}", files.len(), self.schema_path.display());

        let outcomes = self
            .processor
            .process(files, self.policy, |path| self.validate_file(path))?;

        let mut summary = ValidationSummary::default();
        for outcome in outcomes {
            summary.total_files += 1;
            match outcome.result {
                Ok(ValidationStatus::Valid) => summary.valid_files += 1,
                Ok(ValidationStatus::Invalid { error_count, log }) => {
                    debug!("{}: {} error(s)", outcome.path.display(), error_count);
                    if log.is_empty() {
                        writeln!(out, "{}: failed schema validation", display_name(&outcome.path))?;
                    }
                    for line in &log {
                        writeln!(out, "{}", line)?;
                    }
                    summary.invalid_files += 1;
                }
                Ok(ValidationStatus::Error { code }) => {
                    warn!("libxml2 could not validate {} (code {})", outcome.path.display(), code);
                    writeln!(
                        out,
                        "{}: internal validation error (code {})",
                        display_name(&outcome.path),
                        code
                    )?;
                    summary.error_files += 1;
                }
                Err(error) => {
                    out.flush()?;
                    let failure = self.policy.settle(&outcome.path, error)?;
                    writeln!(out, "{}", failure.error)?;
                    summary.failures.push(failure);
                }
            }
        }

        out.flush()?;
        summary.duration = start.elapsed();
        Ok(summary)
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_path", &self.schema_path)
            .field("policy", &self.policy)
            .field("processor", &self.processor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="ZWaveDevice">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="brandName" type="xs:string"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    const VALID: &str = "<ZWaveDevice><brandName>Acme</brandName></ZWaveDevice>";
    const INVALID: &str = "<ZWaveDevice><productName>Plug</productName></ZWaveDevice>";

    fn setup(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_SCHEMA), SCHEMA).unwrap();
        let paths = files
            .iter()
            .map(|(name, content)| {
                let path = dir.path().join(name);
                fs::write(&path, content).unwrap();
                path
            })
            .collect();
        (dir, paths)
    }

    #[test]
    fn test_valid_documents_print_nothing() {
        let (dir, files) = setup(&[("a.xml", VALID), ("b.xml", VALID)]);
        let validator = SchemaValidator::load(&dir.path().join(DEFAULT_SCHEMA)).unwrap();

        let mut out = Vec::new();
        let summary = validator.run(&files, &mut out).unwrap();

        assert!(out.is_empty());
        assert_eq!(summary.valid_files, 2);
        assert!(summary.all_valid());
    }

    #[test]
    fn test_invalid_document_prints_block_and_continues() {
        let (dir, files) = setup(&[("bad.xml", INVALID), ("good.xml", VALID)]);
        let validator = SchemaValidator::load(&dir.path().join(DEFAULT_SCHEMA)).unwrap();

        let mut out = Vec::new();
        let summary = validator.run(&files, &mut out).unwrap();

        assert_eq!(summary.invalid_files, 1);
        assert_eq!(summary.valid_files, 1);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.lines().all(|line| line.starts_with("bad.xml:1: ")));
        assert!(!printed.contains(dir.path().to_str().unwrap()));
        assert!(printed.contains("productName"));
        assert!(!printed.contains("good.xml"));
    }

    #[test]
    fn test_malformed_document_aborts_run() {
        let (dir, files) = setup(&[("a.xml", VALID), ("broken.xml", "<ZWaveDevice>"), ("c.xml", INVALID)]);
        let validator = SchemaValidator::load(&dir.path().join(DEFAULT_SCHEMA)).unwrap();

        let mut out = Vec::new();
        match validator.run(&files, &mut out) {
            Err(ZddxError::XmlParse { path, .. }) => assert!(path.ends_with("broken.xml")),
            other => panic!("Expected XmlParse, got {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_skip_policy_reports_malformed_document() {
        let (dir, files) = setup(&[("broken.xml", "<ZWaveDevice>"), ("c.xml", INVALID)]);
        let validator = SchemaValidator::load(&dir.path().join(DEFAULT_SCHEMA))
            .unwrap()
            .with_policy(ErrorPolicy::SkipAndContinue)
            .with_processor(FileProcessor::new(2));

        let mut out = Vec::new();
        let summary = validator.run(&files, &mut out).unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.invalid_files, 1);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Error parsing XML broken.xml"));
    }

    #[test]
    fn test_missing_schema_is_open_error() {
        let dir = TempDir::new().unwrap();
        match SchemaValidator::load(&dir.path().join(DEFAULT_SCHEMA)) {
            Err(error @ ZddxError::SchemaOpen { .. }) => {
                assert!(error.to_string().starts_with("Error opening XSD z-wave_v2.xsd"))
            }
            other => panic!("Expected SchemaOpen, got {:?}", other),
        }
    }

    #[test]
    fn test_broken_schema_is_compile_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_SCHEMA);
        fs::write(&path, "<notASchema/>").unwrap();

        match SchemaValidator::load(&path) {
            Err(error @ ZddxError::SchemaCompile { .. }) => {
                assert!(error.to_string().starts_with("Error parsing XSD z-wave_v2.xsd"))
            }
            other => panic!("Expected SchemaCompile, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_document_is_open_error() {
        let (dir, _) = setup(&[]);
        let validator = SchemaValidator::load(&dir.path().join(DEFAULT_SCHEMA)).unwrap();

        match validator.validate_file(&dir.path().join("gone.xml")) {
            Err(ZddxError::ReadFile { .. }) => (),
            other => panic!("Expected ReadFile, got {:?}", other),
        }
    }
}
