use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use zddx_tools::{ConfigManager, LangCheckCli, LanguageChecker, Output, logging};

fn main() -> ExitCode {
    let cli = LangCheckCli::parse();
    logging::init(cli.common.verbosity());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            println!("{:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &LangCheckCli) -> Result<()> {
    let config = ConfigManager::load_config(cli).context("Failed to load configuration")?;

    let files = config.discovery()?.discover_files(&config.files.directory)?;
    let checker = LanguageChecker::new(config.language_set())
        .with_policy(config.languages.on_parse_error)
        .with_processor(config.processor());

    let summary = checker.run(&files, &mut io::stdout().lock())?;

    let output = Output::new(config.verbosity());
    output.report(&output.format_check_summary(&summary));
    Ok(())
}
