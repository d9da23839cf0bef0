//! Crafting Calculator
//!
//! Command line front end: load recipe files, then answer queries once or
//! interactively.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use craft_calculator::app::{Application, LinePrompt, Mode};
use craft_calculator::config::{CONFIG_FILE, Settings};
use craft_calculator::loader;
use craft_calculator::registry::Registry;
use craft_calculator::resolve::Traversal;

#[derive(Parser)]
#[command(name = "craft-calculator")]
#[command(about = "Crafting recipe calculator: per-station steps and raw material totals")]
struct Cli {
    /// Recipe files (.txt or .json) or directories holding them
    files: Vec<PathBuf>,

    /// Add every workstation the recipes need and settle their recipes too
    #[arg(short, long)]
    implicit: bool,

    /// Show the result as a crafting tree
    #[arg(short, long)]
    recursive: bool,

    /// Show the crafting tree as JSON
    #[arg(short, long)]
    json: bool,

    /// Settings file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log engine decisions to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query, e.g. "1 anvil_bench + 1 crafting_bench"
    Calc {
        /// Query in the form `amount name [+/- amount name ...]`
        query: String,
    },

    /// Read queries from standard input until exit
    Repl,

    /// List every known name: recipes, pending recipes, raw materials
    Keywords,

    /// Load recipe files and report pending recipes and skipped rows
    Check,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("craft_calculator=warn"));
    if verbose {
        filter = filter.add_directive("craft_calculator=debug".parse()?);
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
    Ok(())
}

fn load_registry(settings: &Settings, files: &[PathBuf]) -> Result<Registry> {
    let mut registry = Registry::new().with_station_aliases(settings.station_aliases.clone());

    for path in settings.recipe_files.iter().chain(files) {
        load(&mut registry, path)?;
    }

    Ok(registry)
}

fn load(registry: &mut Registry, path: &Path) -> Result<()> {
    loader::load_path(registry, path)
        .with_context(|| format!("Failed to load recipes from {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("Failed to read settings from {}", cli.config.display()))?;
    let registry = load_registry(&settings, &cli.files)?;

    let mode = if cli.json {
        Mode::Json
    } else if cli.recursive {
        Mode::Recursive
    } else {
        Mode::Iterative
    };
    let traversal = if cli.implicit {
        Traversal::Implicit
    } else {
        Traversal::Explicit
    };

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Calc { query } => {
            let mut app = Application::new(registry, settings)
                .with_mode(mode)
                .with_traversal(traversal);
            let mut prompt = LinePrompt::new(io::stdin().lock(), io::stdout());
            for line in app.respond(&query, &mut prompt)? {
                println!("{}", line);
            }
        }

        Commands::Repl => {
            let mut app = Application::new(registry, settings)
                .with_mode(mode)
                .with_traversal(traversal)
                .fit_separator(true);
            let mut prompt = LinePrompt::new(io::stdin().lock(), io::stdout());
            app.run(&mut prompt)?;
        }

        Commands::Keywords => {
            let keywords = registry.keywords();
            if keywords.is_empty() {
                println!("No recipes loaded. Pass recipe files or set recipe_files in {}.", CONFIG_FILE);
            } else {
                for keyword in keywords {
                    println!("{}", keyword);
                }
            }
        }

        Commands::Check => {
            println!(
                "{} recipes, {} pending, {} raw materials",
                registry.resolved_names().count(),
                registry.pending_names().count(),
                registry.raw_names().count()
            );

            for name in registry.pending_names() {
                println!("\nPending: {}", name);
                for (i, option) in registry.options(name).unwrap_or_default().iter().enumerate() {
                    println!("  ({}) {}", i, option);
                }
            }

            if !registry.errors().is_empty() {
                println!("\nSkipped rows:");
                for error in registry.errors() {
                    println!("  {}", error);
                }
            }
        }
    }

    Ok(())
}
