//! LibXML2 FFI Wrapper Module
//!
//! Rust has no mature XML Schema (XSD) validator, so schema compilation and
//! validation go through libxml2 directly, the same engine `xmllint` uses.
//!
//! Every libxml2 object is owned by a Rust value that frees it on drop:
//!
//! - [`XmlSchemaPtr`] owns a compiled schema (`xmlSchemaFree`), shared via `Arc`
//! - [`XmlDocPtr`] owns a parsed document (`xmlFreeDoc`)
//! - parser and validation contexts live only inside the call that needs them
//!
//! ## Thread Safety
//!
//! Per the libxml2 threading notes, document parsing and validation with
//! separate contexts may run concurrently and a compiled schema is read-only
//! during validation. Schema *parsing* is not thread-safe; schemas are
//! compiled once, before any file is processed.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Once};

use libc::{c_char, c_int, c_void};

use crate::error::{LibXml2Error, LibXml2Result};

/// Global initialization flag for libxml2
///
/// libxml2's initialization functions are NOT thread-safe, so they run
/// exactly once behind `std::sync::Once`.
static LIBXML2_INIT: Once = Once::new();

/// Suppress error reports on stderr; errors are collected instead.
const XML_PARSE_NOERROR: c_int = 1 << 5;
/// Suppress warning reports on stderr.
const XML_PARSE_NOWARNING: c_int = 1 << 6;
/// Forbid network access while loading documents.
const XML_PARSE_NONET: c_int = 1 << 11;

const DOCUMENT_PARSE_OPTIONS: c_int = XML_PARSE_NOERROR | XML_PARSE_NOWARNING | XML_PARSE_NONET;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();

    // Document parsing
    pub fn xmlReadFile(
        filename: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);
    pub fn xmlGetLastError() -> *const xmlError;
    pub fn xmlResetLastError();

    // Schema parsing functions
    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation functions
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
}

#[allow(non_camel_case_types)]
#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *const xmlError)>;

/// One diagnostic reported by libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDiagnostic {
    /// Document the diagnostic refers to, when libxml2 knows it
    pub file: Option<String>,
    pub line: u32,
    pub message: String,
}

impl XmlDiagnostic {
    /// Copy a libxml2 error record into owned Rust data
    ///
    /// # Safety
    ///
    /// `error` must be null or point to a valid `xmlError`.
    unsafe fn from_raw(error: *const xmlError) -> Option<Self> {
        if error.is_null() {
            return None;
        }
        let error = unsafe { &*error };
        let message = unsafe { owned_c_str(error.message) }?;
        Some(XmlDiagnostic {
            file: unsafe { owned_c_str(error.file) },
            line: u32::try_from(error.line).unwrap_or(0),
            message: message.trim().to_string(),
        })
    }

    /// `<file>:<line>: <message>`, the shape of one error-log line.
    ///
    /// `file_name` replaces the path libxml2 recorded, which is whatever path
    /// the document was opened with.
    pub fn log_line(&self, file_name: &str) -> String {
        format!("{}:{}: {}", file_name, self.line, self.message)
    }
}

unsafe fn owned_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    Some(c_str.to_string_lossy().into_owned())
}

/// Callback for libxml2 to report parser and validation errors (structured)
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *const xmlError) {
    let diagnostics = unsafe { &mut *(user_data as *mut Vec<XmlDiagnostic>) };

    if let Some(diagnostic) = unsafe { XmlDiagnostic::from_raw(error) } {
        diagnostics.push(diagnostic);
    }
}

/// Thread-safe wrapper for a compiled libxml2 schema
#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: a compiled xmlSchema is only read during validation
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must come from `xmlSchemaParse` and be owned by nobody else.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        Some(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }
}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = std::ptr::null_mut();
        }
    }
}

/// A parsed document, freed when dropped
#[derive(Debug)]
pub struct XmlDocPtr {
    ptr: *mut XmlDoc,
}

// Safety: a document is only touched by the thread holding it
unsafe impl Send for XmlDocPtr {}

impl Drop for XmlDocPtr {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlFreeDoc(self.ptr);
            }
            self.ptr = std::ptr::null_mut();
        }
    }
}

/// Validation result from libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Validation succeeded (return code 0)
    Valid,
    /// Validation failed with errors (return code > 0)
    Invalid {
        error_count: i32,
        errors: Vec<XmlDiagnostic>,
    },
    /// Internal error occurred (return code < 0)
    InternalError { code: i32 },
}

impl ValidationResult {
    /// Create ValidationResult from libxml2 return code and captured errors
    pub fn from_code(code: c_int, errors: Vec<XmlDiagnostic>) -> Self {
        match code {
            0 => ValidationResult::Valid,
            n if n > 0 => ValidationResult::Invalid {
                error_count: n,
                errors,
            },
            n => ValidationResult::InternalError { code: n },
        }
    }

    /// Check if validation was successful
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Check if validation failed due to schema violations
    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid { .. })
    }

    /// Check if an internal error occurred
    pub fn is_error(&self) -> bool {
        matches!(self, ValidationResult::InternalError { .. })
    }
}

/// Safe access to the libxml2 functionality the validator needs
pub struct LibXml2Wrapper {
    _phantom: PhantomData<()>,
}

impl LibXml2Wrapper {
    /// Create a wrapper, initializing libxml2 on first use.
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper {
            _phantom: PhantomData,
        }
    }

    /// Compile an XML schema held in memory.
    ///
    /// **Not thread-safe** in libxml2; compile schemas before spreading work
    /// over threads.
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        let size = c_int::try_from(schema_data.len()).map_err(|_| LibXml2Error::MemoryAllocation)?;
        let mut diagnostics: Vec<XmlDiagnostic> = Vec::new();

        unsafe {
            let parser_ctxt =
                xmlSchemaNewMemParserCtxt(schema_data.as_ptr() as *const c_char, size);
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(structured_error_callback),
                &mut diagnostics as *mut Vec<XmlDiagnostic> as *mut c_void,
            );

            let schema_ptr = xmlSchemaParse(parser_ctxt);

            // Always free the parser context
            xmlSchemaFreeParserCtxt(parser_ctxt);

            XmlSchemaPtr::from_raw(schema_ptr).ok_or_else(|| LibXml2Error::SchemaParseFailed {
                details: summarize(&diagnostics, "not a valid XML Schema"),
            })
        }
    }

    /// Parse a document from disk.
    ///
    /// Network access is disabled and libxml2's own stderr reporting is
    /// silenced; the failure reason is returned instead.
    pub fn parse_document(&self, path: &Path) -> LibXml2Result<XmlDocPtr> {
        let c_path = path
            .to_str()
            .and_then(|s| CString::new(s).ok())
            .ok_or_else(|| LibXml2Error::InvalidPath {
                path: path.to_path_buf(),
            })?;

        unsafe {
            xmlResetLastError();
            let doc = xmlReadFile(c_path.as_ptr(), std::ptr::null(), DOCUMENT_PARSE_OPTIONS);
            if doc.is_null() {
                let details = XmlDiagnostic::from_raw(xmlGetLastError())
                    .map(|d| format!("line {}: {}", d.line, d.message))
                    .unwrap_or_else(|| "document is not well-formed".to_string());
                return Err(LibXml2Error::DocumentParseFailed { details });
            }
            Ok(XmlDocPtr { ptr: doc })
        }
    }

    /// Validate a parsed document, collecting every reported error.
    ///
    /// Safe to call concurrently: each call owns its validation context.
    pub fn validate_document(
        &self,
        schema: &XmlSchemaPtr,
        doc: &XmlDocPtr,
    ) -> LibXml2Result<ValidationResult> {
        let mut errors: Vec<XmlDiagnostic> = Vec::new();

        unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                &mut errors as *mut Vec<XmlDiagnostic> as *mut c_void,
            );

            let result_code = xmlSchemaValidateDoc(valid_ctxt, doc.ptr);

            // Always free the validation context
            xmlSchemaFreeValidCtxt(valid_ctxt);

            Ok(ValidationResult::from_code(result_code, errors))
        }
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(diagnostics: &[XmlDiagnostic], fallback: &str) -> String {
    if diagnostics.is_empty() {
        return fallback.to_string();
    }
    diagnostics
        .iter()
        .map(|d| d.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SIMPLE_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="root" type="xs:string"/>
</xs:schema>"#;

    const VALID_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>Hello World</root>"#;

    const INVALID_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root><invalid>content</invalid></root>"#;

    fn temp_xml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_schema_parsing_success() {
        let wrapper = LibXml2Wrapper::new();
        assert!(wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).is_ok());
    }

    #[test]
    fn test_schema_parsing_invalid_schema() {
        let wrapper = LibXml2Wrapper::new();
        let result = wrapper.parse_schema_from_memory(b"<invalid>not a schema</invalid>");

        match result {
            Err(LibXml2Error::SchemaParseFailed { details }) => assert!(!details.is_empty()),
            other => panic!("Expected SchemaParseFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_parsing_empty_data() {
        let wrapper = LibXml2Wrapper::new();
        assert!(wrapper.parse_schema_from_memory(&[]).is_err());
    }

    #[test]
    fn test_validate_valid_document() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).unwrap();
        let file = temp_xml(VALID_XML);

        let doc = wrapper.parse_document(file.path()).unwrap();
        let result = wrapper.validate_document(&schema, &doc).unwrap();
        assert_eq!(result, ValidationResult::Valid);
    }

    #[test]
    fn test_validate_invalid_document_collects_errors() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).unwrap();
        let file = temp_xml(INVALID_XML);

        let doc = wrapper.parse_document(file.path()).unwrap();
        match wrapper.validate_document(&schema, &doc).unwrap() {
            ValidationResult::Invalid { error_count, errors } => {
                assert!(error_count > 0);
                assert!(!errors.is_empty());
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_document() {
        let wrapper = LibXml2Wrapper::new();
        let file = temp_xml("<root><unclosed></root>");

        match wrapper.parse_document(file.path()) {
            Err(LibXml2Error::DocumentParseFailed { details }) => assert!(!details.is_empty()),
            other => panic!("Expected DocumentParseFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_document() {
        let wrapper = LibXml2Wrapper::new();
        assert!(wrapper.parse_document(Path::new("/nonexistent/file.xml")).is_err());
    }

    #[test]
    fn test_validation_result_from_code() {
        assert_eq!(ValidationResult::from_code(0, vec![]), ValidationResult::Valid);
        assert_eq!(
            ValidationResult::from_code(5, vec![]),
            ValidationResult::Invalid {
                error_count: 5,
                errors: vec![]
            }
        );
        assert_eq!(
            ValidationResult::from_code(-1, vec![]),
            ValidationResult::InternalError { code: -1 }
        );
    }

    #[test]
    fn test_validation_result_predicates() {
        let valid = ValidationResult::Valid;
        assert!(valid.is_valid());
        assert!(!valid.is_invalid());
        assert!(!valid.is_error());

        let invalid = ValidationResult::Invalid {
            error_count: 1,
            errors: vec![],
        };
        assert!(invalid.is_invalid());

        let error = ValidationResult::InternalError { code: -1 };
        assert!(error.is_error());
    }

    #[test]
    fn test_diagnostic_formatting() {
        let diagnostic = XmlDiagnostic {
            file: Some("/srv/zddx/device.xml".to_string()),
            line: 7,
            message: "Element 'invalid': This element is not expected.".to_string(),
        };
        assert_eq!(
            diagnostic.log_line("device.xml"),
            "device.xml:7: Element 'invalid': This element is not expected."
        );
    }

    #[test]
    fn test_schema_shared_across_threads() {
        use rayon::prelude::*;

        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).unwrap();
        let file = temp_xml(VALID_XML);

        let results: Vec<_> = (0..8)
            .into_par_iter()
            .map(|_| {
                let local = LibXml2Wrapper::new();
                let doc = local.parse_document(file.path()).unwrap();
                local.validate_document(&schema, &doc).unwrap()
            })
            .collect();

        assert!(results.iter().all(|r| r.is_valid()));
    }
}
