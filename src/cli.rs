use clap::{ArgAction, Args, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{Config, ToolArgs};
use crate::extract::IndexLayout;
use crate::langcheck::LanguageSet;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show run summaries and progress
    Verbose,
    /// Show all available debugging information
    Debug,
}

/// Options every tool accepts
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct CommonArgs {
    /// Directory holding the device description files [default: .]
    #[arg(short = 'C', long = "dir")]
    pub dir: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Worker threads; 0 uses every core
    #[arg(short = 'j', long = "jobs")]
    pub jobs: Option<usize>,

    /// Process files in name order instead of directory order
    #[arg(long = "sort")]
    pub sort: bool,

    /// File name pattern (regular expression) selecting input files
    #[arg(long = "pattern")]
    pub pattern: Option<String>,

    /// More output; repeat for debugging detail
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Errors only
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CommonArgs {
    pub fn verbosity(&self) -> VerbosityLevel {
        match (self.quiet, self.verbose) {
            (true, _) => VerbosityLevel::Quiet,
            (false, 0) => VerbosityLevel::Normal,
            (false, 1) => VerbosityLevel::Verbose,
            (false, _) => VerbosityLevel::Debug,
        }
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.dir {
            config.files.directory = dir.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.files.pattern = pattern.clone();
        }
        if self.sort {
            config.files.sort = true;
        }
        if let Some(jobs) = self.jobs {
            config.processing.jobs = jobs;
        }
        if self.verbose > 0 {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if self.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }
    }
}

/// Build the ZDDX index files of a directory
#[derive(Parser, Debug, Clone)]
#[command(name = "zddx-index")]
#[command(about = "Write ZDDX.indx and ZDDX.indxml for the Z-Wave device descriptions in a directory")]
#[command(version)]
pub struct IndexCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Tabular index file [default: ZDDX.indx]
    #[arg(long = "tabular-out")]
    pub tabular_out: Option<PathBuf>,

    /// XML index file [default: ZDDX.indxml]
    #[arg(long = "xml-out")]
    pub xml_out: Option<PathBuf>,

    /// Add product code, RF frequency and manual URL columns
    #[arg(long = "extended")]
    pub extended: bool,
}

/// Report missing translations in device descriptions
#[derive(Parser, Debug, Clone)]
#[command(name = "zddx-langcheck")]
#[command(about = "List localized texts missing a required language")]
#[command(version)]
pub struct LangCheckCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Required languages, comma separated [default: en,de,ru]
    #[arg(short = 'l', long = "languages")]
    pub languages: Option<String>,
}

/// Validate device descriptions against the ZDDX schema
#[derive(Parser, Debug, Clone)]
#[command(name = "zddx-validate")]
#[command(about = "Validate Z-Wave device descriptions against the XSD schema")]
#[command(version)]
pub struct ValidateCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Schema file [default: z-wave_v2.xsd]
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
}

impl ToolArgs for IndexCli {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn apply_overrides(&self, config: &mut Config) {
        self.common.apply_overrides(config);
        if let Some(path) = &self.tabular_out {
            config.index.tabular_out = path.clone();
        }
        if let Some(path) = &self.xml_out {
            config.index.xml_out = path.clone();
        }
        if self.extended {
            config.index.layout = IndexLayout::Extended;
        }
    }
}

impl ToolArgs for LangCheckCli {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn apply_overrides(&self, config: &mut Config) {
        self.common.apply_overrides(config);
        if let Some(list) = &self.languages {
            config.languages.required = LanguageSet::parse_list(list).codes().to_vec();
        }
    }
}

impl ToolArgs for ValidateCli {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn apply_overrides(&self, config: &mut Config) {
        self.common.apply_overrides(config);
        if let Some(schema) = &self.schema {
            config.validation.schema = schema.clone();
        }
    }
}
