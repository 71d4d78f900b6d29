mod commands;

use crate::commands::{derive, enrich, export, info, load, query, validate, QueryCommand};
use clap::{Parser, Subcommand};
use nepal_election::config::{self, Settings, CONFIG_FILE, ENV_FILE};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[clap(about = "Nepali election data pipeline")]
struct Opts {
    /// Settings file layered over the defaults
    #[clap(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Directory holding the raw dataset files
    #[clap(long)]
    data_dir: Option<PathBuf>,
    /// SQLite database path
    #[clap(long)]
    database: Option<PathBuf>,
    /// Directory the JSON tables are exported to
    #[clap(long)]
    export_dir: Option<PathBuf>,
    /// Directory of researched candidate profiles
    #[clap(long)]
    profiles_dir: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load raw datasets into the database.
    Load {
        /// Reload datasets even if their files are unchanged
        #[clap(long)]
        force: bool,
    },
    /// Derive tagged candidate, constituency and party tables.
    Derive,
    /// Check the derived tables for consistency.
    Validate {
        /// Also write the report as JSON
        #[clap(long)]
        report: Option<PathBuf>,
    },
    /// Export the derived tables as JSON.
    Export,
    /// Load, derive, validate and export in one go.
    Run {
        #[clap(long)]
        force: bool,
    },
    /// Query the derived tables.
    Query {
        #[clap(subcommand)]
        command: QueryCommand,
    },
    /// Research candidate profiles with Gemini.
    Enrich {
        /// Only consider the first N candidates
        #[clap(long)]
        limit: Option<usize>,
        /// Research candidates that already have a saved profile
        #[clap(long)]
        no_skip: bool,
        /// Concurrent requests (1 to 30)
        #[clap(long)]
        concurrency: Option<usize>,
        #[clap(long)]
        model: Option<String>,
        /// Markdown file holding the system prompt
        #[clap(long)]
        prompt: Option<PathBuf>,
    },
    /// Show table sizes and recent stage timings.
    Info,
}

fn fail(stage: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("❌ {} failed: {}", stage, e);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    env_logger::init();
    config::load_env_file(Path::new(ENV_FILE));
    let opts = Opts::parse();

    let mut settings = match Settings::load_from(&opts.config) {
        Ok(settings) => settings,
        Err(e) => fail("Configuration", e),
    };
    if let Some(dir) = opts.data_dir {
        settings.data_dir = dir;
    }
    if let Some(path) = opts.database {
        settings.database_path = path;
    }
    if let Some(dir) = opts.export_dir {
        settings.export_dir = dir;
    }
    if let Some(dir) = opts.profiles_dir {
        settings.profiles_dir = dir;
    }

    match opts.command {
        Command::Load { force } => {
            if let Err(e) = load(&settings, force).await {
                fail("Load", e);
            }
        }
        Command::Derive => {
            if let Err(e) = derive(&settings).await {
                fail("Derivation", e);
            }
        }
        Command::Validate { report } => {
            if let Err(e) = validate(&settings, report.as_deref()).await {
                fail("Validation", e);
            }
        }
        Command::Export => {
            if let Err(e) = export(&settings).await {
                fail("Export", e);
            }
        }
        Command::Run { force } => {
            if let Err(e) = load(&settings, force).await {
                fail("Load", e);
            }
            if let Err(e) = derive(&settings).await {
                fail("Derivation", e);
            }
            if let Err(e) = validate(&settings, None).await {
                fail("Validation", e);
            }
            if let Err(e) = export(&settings).await {
                fail("Export", e);
            }
            println!("🎉 Pipeline complete");
        }
        Command::Query { command } => {
            if let Err(e) = query(&settings, command).await {
                fail("Query", e);
            }
        }
        Command::Enrich {
            limit,
            no_skip,
            concurrency,
            model,
            prompt,
        } => {
            if let Some(concurrency) = concurrency {
                settings.concurrency = concurrency;
            }
            if let Some(model) = model {
                settings.model = model;
            }
            if let Some(prompt) = prompt {
                settings.prompt_path = prompt;
            }
            if let Err(e) = enrich(&settings, limit, no_skip).await {
                fail("Enrichment", e);
            }
        }
        Command::Info => {
            if let Err(e) = info(&settings).await {
                fail("Info", e);
            }
        }
    }
}
