//! Builds the two index files of a device description directory.
//!
//! The tabular index (`ZDDX.indx`) is tab separated with one row per
//! indexed document. The XML index (`ZDDX.indxml`) holds one
//! `<DeviceDescription>` element per row, with the same values as
//! attributes.

use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use tracing::{debug, info};

use crate::dom::load_document;
use crate::error::{Result, ZddxError, display_name};
use crate::extract::{IndexLayout, IndexRecord, extract};
use crate::pipeline::{ErrorPolicy, FileFailure, FileProcessor};

pub const TABULAR_INDEX: &str = "ZDDX.indx";
pub const XML_INDEX: &str = "ZDDX.indxml";

const XML_INDEX_ROOT: &str = "ZDDXIndex";
const XML_INDEX_ENTRY: &str = "DeviceDescription";

/// Totals of one indexer run
#[derive(Debug, Default)]
pub struct IndexSummary {
    pub indexed: usize,
    pub failures: Vec<FileFailure>,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct Indexer {
    tabular_path: PathBuf,
    xml_path: PathBuf,
    layout: IndexLayout,
    policy: ErrorPolicy,
    processor: FileProcessor,
}

impl Indexer {
    /// Index files named `ZDDX.indx` and `ZDDX.indxml` inside `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            tabular_path: dir.join(TABULAR_INDEX),
            xml_path: dir.join(XML_INDEX),
            layout: IndexLayout::Standard,
            policy: ErrorPolicy::SkipAndContinue,
            processor: FileProcessor::sequential(),
        }
    }

    pub fn with_output_paths(mut self, tabular: PathBuf, xml: PathBuf) -> Self {
        self.tabular_path = tabular;
        self.xml_path = xml;
        self
    }

    pub fn with_layout(mut self, layout: IndexLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_processor(mut self, processor: FileProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn tabular_path(&self) -> &Path {
        &self.tabular_path
    }

    pub fn xml_path(&self) -> &Path {
        &self.xml_path
    }

    /// Parse one document and project it onto an index record.
    pub fn index_file(&self, path: &Path) -> Result<IndexRecord> {
        let document = load_document(path)?;
        let record = extract(&document, &display_name(path))?;
        debug!("Indexed {} (manufacturer {})", path.display(), record.manufacturer_id);
        Ok(record)
    }

    /// Index `files`, writing both index files.
    ///
    /// The tabular index is created before any document is read; if that
    /// fails nothing else happens. Documents that cannot be indexed are
    /// reported on `out` and left out of both files.
    pub fn run(&self, files: &[PathBuf], out: &mut dyn Write) -> Result<IndexSummary> {
        let start = Instant::now();
        let mut tabular = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::CRLF)
            .has_headers(false)
            .from_path(&self.tabular_path)
            .map_err(|e| write_error(&self.tabular_path, e))?;

        info!("Indexing {} file(s) into {}", files.len(), self.tabular_path.display());

        let outcomes = self
            .processor
            .process(files, self.policy, |path| self.index_file(path))?;

        let mut summary = IndexSummary::default();
        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.result {
                Ok(record) => {
                    tabular
                        .write_record(record.values(self.layout))
                        .map_err(|e| write_error(&self.tabular_path, e))?;
                    records.push(record);
                }
                Err(error) => {
                    let failure = self.policy.settle(&outcome.path, error)?;
                    writeln!(
                        out,
                        "Error loading Z-Wave Device Description XML {}: {}",
                        display_name(&failure.path),
                        failure.error.reason()
                    )?;
                    summary.failures.push(failure);
                }
            }
        }

        tabular
            .flush()
            .map_err(|e| write_error(&self.tabular_path, e))?;

        let xml = render_xml_index(&records, self.layout)
            .map_err(|e| write_error(&self.xml_path, e))?;
        fs::write(&self.xml_path, xml).map_err(|e| write_error(&self.xml_path, e))?;

        summary.indexed = records.len();
        summary.duration = start.elapsed();
        info!(
            "Indexed {} file(s), skipped {}",
            summary.indexed,
            summary.failures.len()
        );
        Ok(summary)
    }
}

fn write_error(path: &Path, error: impl std::fmt::Display) -> ZddxError {
    ZddxError::IndexWrite {
        path: path.to_path_buf(),
        details: error.to_string(),
    }
}

/// Render the XML index for `records`, tab indented.
pub fn render_xml_index(records: &[IndexRecord], layout: IndexLayout) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b'\t', 1);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(io::Error::other)?;

    if records.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(XML_INDEX_ROOT)))
            .map_err(io::Error::other)?;
    } else {
        writer
            .write_event(Event::Start(BytesStart::new(XML_INDEX_ROOT)))
            .map_err(io::Error::other)?;

        for record in records {
            let mut entry = BytesStart::new(XML_INDEX_ENTRY);
            for (name, value) in record.fields(layout) {
                entry.push_attribute((name, value.as_str()));
            }
            writer
                .write_event(Event::Empty(entry))
                .map_err(io::Error::other)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(XML_INDEX_ROOT)))
            .map_err(io::Error::other)?;
    }

    let mut bytes = writer.into_inner().into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}
