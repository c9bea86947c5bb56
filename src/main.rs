mod cli;
mod db;
mod error;
mod fmt;
mod gateway;
mod importer;
mod models;
mod parser;
mod settings;
mod staging;
mod workbook;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging() {
    // RUST_LOG wins; otherwise the configured level keeps stderr quiet.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings::load_settings().log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Preview {
            file,
            brand,
            skip_header,
            json,
        } => cli::preview::run(&file, &brand, skip_header, json),
        Commands::Import {
            file,
            brand,
            skip_header,
            yes,
        } => cli::import::run(&file, &brand, skip_header, yes),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
