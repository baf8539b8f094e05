use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use flowsketch::blueprint::validator::Validator;
use flowsketch::catalog::Catalog;
use flowsketch::compiler::core::{CompileOptions, Compiler};
use flowsketch::compiler::loader::{
    load_blueprint_from_json, load_catalog_from_yaml, load_description, write_blueprint,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a plain-language description into a blueprint
    Generate {
        /// Description text (or use --file)
        text: Option<String>,

        /// Read the description from a file
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Write the blueprint here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Module catalog YAML (defaults to the built-in table)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Scenario name (defaults to the first words of the description)
        #[arg(long)]
        name: Option<String>,

        /// Blueprint variables (key=value)
        #[arg(long, short = 'D', value_parser = parse_key_val)]
        vars: Vec<(String, serde_json::Value)>,

        /// Scheduling interval in seconds
        #[arg(long)]
        interval: Option<u32>,
    },

    /// Check the structure of a blueprint JSON file
    Validate {
        file: PathBuf,
    },

    /// List catalog modules and their versions
    Catalog {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, serde_json::Value), String> {
    let pos = s.find('=').ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    let key = s[..pos].to_string();
    let val_str = &s[pos + 1..];
    // Try parsing as JSON, otherwise treat as string
    let val = serde_json::from_str(val_str).unwrap_or_else(|_| serde_json::Value::String(val_str.to_string()));
    Ok((key, val))
}

fn open_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(p) => {
            info!("Loading catalog from: {:?}", p);
            load_catalog_from_yaml(p)
        }
        None => Ok(Catalog::builtin()?),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { text, file, output, catalog, name, vars, interval } => {
            let description = match (text, file) {
                (Some(t), None) => t,
                (None, Some(f)) => load_description(&f)?,
                (Some(_), Some(_)) => bail!("Pass either a description or --file, not both"),
                (None, None) => bail!("No description given"),
            };

            let catalog = open_catalog(catalog.as_deref())?;
            info!("Catalog holds {} modules", catalog.len());

            let compiler = Compiler::new(Arc::new(catalog));
            let options = CompileOptions {
                name,
                variables: vars,
                schedule_interval: interval,
            };
            let blueprint = compiler.compile_with(&description, &options)?;

            match output {
                Some(path) => {
                    write_blueprint(&path, &blueprint)?;
                    info!("Blueprint written to {}", path.display());
                }
                None => println!("{}", blueprint.to_json_pretty()?),
            }
        }

        Commands::Validate { file } => {
            let blueprint = load_blueprint_from_json(&file)?;
            let report = Validator::new().validate(&blueprint);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.valid {
                error!("{} failed validation", file.display());
                std::process::exit(1);
            }
        }

        Commands::Catalog { catalog } => {
            let catalog = open_catalog(catalog.as_deref())?;
            for (module, entry) in catalog.modules() {
                println!(
                    "{:<40} v{:<3} {}",
                    module,
                    entry.version,
                    entry.label.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}
