//! Completeness check for localized text.
//!
//! A node whose direct children include `<lang>` elements is a localization
//! node: it is complete for a language when some `lang` child carries that
//! `xml:lang` and non-blank leading text. Every other node with children is
//! descended into.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::dom::{XmlElement, load_document};
use crate::error::{Result, ZddxError, display_name};
use crate::pipeline::{ErrorPolicy, FileFailure, FileProcessor};

pub const DEFAULT_LANGUAGES: [&str; 3] = ["en", "de", "ru"];

/// Languages every localization node must provide, in reporting order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    codes: Vec<String>,
}

impl LanguageSet {
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for code in codes {
            let code = code.into();
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Self { codes: unique }
    }

    /// Parse a comma separated list such as `en,de,ru`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty()),
        )
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn position(&self, code: &str) -> Option<usize> {
        self.codes.iter().position(|c| c == code)
    }
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGES)
    }
}

/// One required language absent from one localization node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingLanguage {
    /// Tree path down to the localization node, followed by the node's own
    /// name: a `description` under `deviceDescription` reports as
    /// `//deviceDescription/description/description`.
    pub path: String,
    pub language: String,
}

impl fmt::Display for MissingLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.language)
    }
}

/// Walk a document from its root element, pre-order, collecting every
/// missing language.
pub fn check_tree(root: &XmlElement, languages: &LanguageSet) -> Vec<MissingLanguage> {
    let mut findings = Vec::new();
    walk(root, "/", languages, &mut findings);
    findings
}

fn walk(
    node: &XmlElement,
    path: &str,
    languages: &LanguageSet,
    findings: &mut Vec<MissingLanguage>,
) {
    if !node.has_children() {
        return;
    }

    if node.child("lang").is_none() {
        for child in node.elements() {
            walk(child, &format!("{}/{}", path, child.name), languages, findings);
        }
        return;
    }

    let mut complete = vec![false; languages.len()];
    for lang in node.children_named("lang") {
        let has_text = lang.first_text().is_some_and(|text| !text.trim().is_empty());
        if has_text
            && let Some(code) = lang.attribute("xml:lang")
            && let Some(index) = languages.position(code)
        {
            complete[index] = true;
        }
    }

    let node_path = format!("{}/{}", path, node.name);
    for (code, done) in languages.codes().iter().zip(complete) {
        if !done {
            findings.push(MissingLanguage {
                path: node_path.clone(),
                language: code.clone(),
            });
        }
    }
}

/// Totals of one checker run
#[derive(Debug, Default)]
pub struct CheckSummary {
    pub files_checked: usize,
    pub findings: usize,
    pub failures: Vec<FileFailure>,
    pub duration: Duration,
}

/// Runs the walker over a list of files and prints one line per finding
#[derive(Debug, Clone)]
pub struct LanguageChecker {
    languages: LanguageSet,
    policy: ErrorPolicy,
    processor: FileProcessor,
}

impl LanguageChecker {
    pub fn new(languages: LanguageSet) -> Self {
        Self {
            languages,
            policy: ErrorPolicy::AbortRun,
            processor: FileProcessor::sequential(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_processor(mut self, processor: FileProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn check_file(&self, path: &Path) -> Result<Vec<MissingLanguage>> {
        // Parse failures keep the wording the checker has always used
        let document = load_document(path).map_err(|error| match error {
            ZddxError::XmlParse { path, details } => ZddxError::XmlOpen { path, details },
            other => other,
        })?;
        let findings = check_tree(&document.root, &self.languages);
        debug!("{}: {} missing translation(s)", path.display(), findings.len());
        Ok(findings)
    }

    /// Check every file, writing `<file> <path> (<language>)` lines to `out`.
    ///
    /// Under [`ErrorPolicy::AbortRun`] the first unreadable file ends the run
    /// with its error, after the findings of the files before it are written.
    pub fn run(&self, files: &[PathBuf], out: &mut dyn Write) -> Result<CheckSummary> {
        let start = Instant::now();
        info!(
            "Checking {} file(s) for languages {}",
            files.len(),
            self.languages.codes().join(",")
        );

        let outcomes = self
            .processor
            .process(files, self.policy, |path| self.check_file(path))?;

        let mut summary = CheckSummary::default();
        for outcome in outcomes {
            match outcome.result {
                Ok(findings) => {
                    let name = display_name(&outcome.path);
                    for finding in &findings {
                        writeln!(out, "{} {}", name, finding)?;
                    }
                    summary.files_checked += 1;
                    summary.findings += findings.len();
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

impl Default for LanguageChecker {
    fn default() -> Self {
        Self::new(LanguageSet::default())
    }
}
