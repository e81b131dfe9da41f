use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use zddx_tools::{ConfigManager, IndexCli, Indexer, Output, logging};

fn main() -> ExitCode {
    let cli = IndexCli::parse();
    logging::init(cli.common.verbosity());

    println!("Creating index file for ZDDX");
    match run(&cli) {
        Ok(()) => {
            println!("Done");
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!("{:#}", error);
            println!("Failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &IndexCli) -> Result<()> {
    let config = ConfigManager::load_config(cli).context("Failed to load configuration")?;
    let dir = &config.files.directory;

    let files = config.discovery()?.discover_files(dir)?;
    let indexer = Indexer::new(dir)
        .with_output_paths(
            config.resolve(&config.index.tabular_out),
            config.resolve(&config.index.xml_out),
        )
        .with_layout(config.index.layout)
        .with_policy(config.index.on_error)
        .with_processor(config.processor());

    let summary = indexer.run(&files, &mut io::stdout().lock())?;

    let output = Output::new(config.verbosity());
    output.report(&output.format_index_summary(&summary));
    Ok(())
}
