//! Run summaries for the operator.
//!
//! Report lines (index errors, missing languages, schema error logs) are
//! written by the tools themselves. This module only renders the closing
//! summary, which goes to stderr and is shown in verbose mode.

use std::time::Duration;

use crate::cli::VerbosityLevel;
use crate::error::display_name;
use crate::indexer::IndexSummary;
use crate::langcheck::CheckSummary;
use crate::pipeline::FileFailure;
use crate::validator::ValidationSummary;

/// Simple output formatter for human-readable summaries
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stderr),
        }
    }

    /// Formatter that never emits colour codes
    pub fn plain(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: false,
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Print `summary` on stderr when running verbosely.
    pub fn report(&self, summary: &str) {
        if self.verbosity >= VerbosityLevel::Verbose && !summary.is_empty() {
            eprint!("{}", summary);
        }
    }

    pub fn format_index_summary(&self, summary: &IndexSummary) -> String {
        let mut output = String::new();
        output.push_str("Index Summary:\n");
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Indexed:", "32"),
            summary.indexed
        ));
        if !summary.failures.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Skipped:", "33"),
                summary.failures.len()
            ));
        }
        output.push_str(&format!("  Duration: {}\n", format_duration(summary.duration)));
        output.push_str(&self.format_failures(&summary.failures));
        output
    }

    pub fn format_check_summary(&self, summary: &CheckSummary) -> String {
        let mut output = String::new();
        output.push_str("Language Check Summary:\n");
        output.push_str(&format!("  Files checked: {}\n", summary.files_checked));

        let color = if summary.findings == 0 { "32" } else { "31" };
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Missing translations:", color),
            summary.findings
        ));
        if !summary.failures.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Unreadable:", "33"),
                summary.failures.len()
            ));
        }
        output.push_str(&format!("  Duration: {}\n", format_duration(summary.duration)));
        output.push_str(&self.format_failures(&summary.failures));
        output
    }

    pub fn format_validation_summary(&self, summary: &ValidationSummary) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!("  Total files: {}\n", summary.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            summary.valid_files
        ));

        if summary.invalid_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                summary.invalid_files
            ));
        }
        if summary.error_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                summary.error_files
            ));
        }
        if !summary.failures.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Unreadable:", "33"),
                summary.failures.len()
            ));
        }

        output.push_str(&format!("  Duration: {}\n", format_duration(summary.duration)));
        output.push_str(&self.format_failures(&summary.failures));
        output
    }

    // Individual failures are listed only at debug verbosity
    fn format_failures(&self, failures: &[FileFailure]) -> String {
        if self.verbosity < VerbosityLevel::Debug || failures.is_empty() {
            return String::new();
        }

        let mut output = String::from("\nSkipped files:\n");
        for failure in failures {
            output.push_str(&format!(
                "  {}  {} - {}\n",
                self.colorize("-", "36"),
                display_name(&failure.path),
                failure.error.reason()
            ));
        }
        output
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZddxError;
    use std::path::PathBuf;

    fn failure(name: &str) -> FileFailure {
        FileFailure {
            path: PathBuf::from(name),
            error: ZddxError::XmlParse {
                path: PathBuf::from(name),
                details: "unexpected end of stream".to_string(),
            },
        }
    }

    #[test]
    fn test_index_summary() {
        let summary = IndexSummary {
            indexed: 12,
            failures: vec![failure("B.xml")],
            duration: Duration::from_millis(40),
        };

        let formatted = Output::plain(VerbosityLevel::Verbose).format_index_summary(&summary);
        assert!(formatted.contains("Index Summary:"));
        assert!(formatted.contains("Indexed: 12"));
        assert!(formatted.contains("Skipped: 1"));
        assert!(!formatted.contains("B.xml"));
    }

    #[test]
    fn test_debug_lists_failures() {
        let summary = CheckSummary {
            files_checked: 3,
            findings: 0,
            failures: vec![failure("B.xml")],
            duration: Duration::ZERO,
        };

        let formatted = Output::plain(VerbosityLevel::Debug).format_check_summary(&summary);
        assert!(formatted.contains("Missing translations: 0"));
        assert!(formatted.contains("B.xml - unexpected end of stream"));
    }

    #[test]
    fn test_validation_summary() {
        let summary = ValidationSummary {
            total_files: 3,
            valid_files: 2,
            invalid_files: 1,
            ..Default::default()
        };

        let formatted = Output::plain(VerbosityLevel::Verbose).format_validation_summary(&summary);
        assert!(formatted.contains("Total files: 3"));
        assert!(formatted.contains("Valid: 2"));
        assert!(formatted.contains("Invalid: 1"));
        assert!(!formatted.contains("Errors:"));
    }

    #[test]
    fn test_colors() {
        let output = Output {
            verbosity: VerbosityLevel::Normal,
            show_colors: true,
        };
        assert_eq!(output.colorize("Valid:", "32"), "\x1b[32mValid:\x1b[0m");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(75)), "1m15.0s");
    }
}
