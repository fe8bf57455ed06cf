use clap::{command, Parser, Subcommand};
use lazyregistry::{
    config::{self, NamespaceConfig, DEFAULT_CONFIG_FILENAME},
    Origin, RegistryError, RegistryResult,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a namespace manifest and list its registries
    Check {
        /// Path to the manifest (JSON)
        manifest: PathBuf,
    },
    /// Print the discriminator stored in a saved directory
    Inspect {
        dir: PathBuf,

        /// Discriminator field name
        #[arg(short, long, default_value = "type")]
        field: String,

        #[arg(long, default_value = DEFAULT_CONFIG_FILENAME)]
        config_filename: String,
    },
}

/// Returns false when the manifest holds malformed references.
fn check(manifest: &Path) -> RegistryResult<bool> {
    let config = NamespaceConfig::from_file(manifest)?;
    info!("manifest loaded.");

    for (name, registry) in &config.registries {
        let mode = if registry.eager_load { "eager" } else { "lazy" };
        println!("{} ({}, {} entries)", name, mode, registry.entries.len());
        for (key, reference) in &registry.entries {
            println!("  {} -> {}", key, reference);
        }
    }

    let issues = config.validate();
    for issue in &issues {
        eprintln!("invalid: {}", issue);
    }
    Ok(issues.is_empty())
}

fn inspect(dir: &Path, field: &str, config_filename: &str) -> RegistryResult<()> {
    let path = dir.join(config_filename);
    debug!("reading {:?}", path);

    let object: Value = config::from_file(&path)?;
    let discriminator = object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| RegistryError::MissingDiscriminator {
            origin: Origin::default(),
            field: field.to_string(),
        })?;

    println!("{}", discriminator);
    Ok(())
}

fn run(cli: &Cli) -> RegistryResult<bool> {
    match &cli.command {
        Command::Check { manifest } => check(manifest),
        Command::Inspect {
            dir,
            field,
            config_filename,
        } => inspect(dir, field, config_filename).map(|_| true),
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
