use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use zddx_tools::{ConfigManager, Output, SchemaValidator, ValidateCli, logging};

fn main() -> ExitCode {
    let cli = ValidateCli::parse();
    logging::init(cli.common.verbosity());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            println!("{:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &ValidateCli) -> Result<()> {
    let config = ConfigManager::load_config(cli).context("Failed to load configuration")?;

    // Compiled before the directory is listed; a bad schema stops everything
    let validator = SchemaValidator::load(&config.resolve(&config.validation.schema))?
        .with_policy(config.validation.on_parse_error)
        .with_processor(config.processor());

    let files = config.discovery()?.discover_files(&config.files.directory)?;
    let summary = validator.run(&files, &mut io::stdout().lock())?;

    let output = Output::new(config.verbosity());
    output.report(&output.format_validation_summary(&summary));
    Ok(())
}
