//! Cohort CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod settings;

#[derive(Parser)]
#[command(name = "cohort")]
#[command(about = "Dependency-aware file clustering and batching", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Settings file (defaults to <root>/cohort.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extract imports on a single thread
    #[arg(long, global = true)]
    sequential: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack the repository into size-bounded batches
    Batch {
        /// Override the batch budget
        #[arg(short, long)]
        budget: Option<u64>,
    },
    /// List the weakly connected clusters
    Clusters,
    /// List the circular dependency groups
    Cycles,
    /// Print files in dependency order, dependencies first
    Order {
        /// Files to order (defaults to every file in the repository)
        files: Vec<String>,
    },
    /// Split a module among candidate sub-modules
    Subdivide {
        /// JSON array of candidates with `name`, `entryFiles` and `keyFiles`
        #[arg(long)]
        candidates: PathBuf,

        /// Path prefix of the module being split
        #[arg(short, long, default_value = "")]
        scope: String,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "cohort={0},cohort_core={0},cohort_indexer={0}",
            log_level
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Version = cli.command {
        println!("Cohort v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing::info!("Cohort v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Repository root: {}", cli.root.display());

    let mut settings = settings::Settings::load(&cli.root, cli.config.as_deref())?;
    let ctx = commands::Context {
        root: cli.root,
        parallel: !cli.sequential,
    };

    match cli.command {
        Commands::Batch { budget } => {
            if let Some(budget) = budget {
                settings.engine.batch = settings.engine.batch.with_budget(budget);
                settings.validate()?;
            }
            commands::batch(&ctx, &settings)
        }
        Commands::Clusters => commands::clusters(&ctx, &settings),
        Commands::Cycles => commands::cycles(&ctx, &settings),
        Commands::Order { files } => commands::order(&ctx, &settings, files),
        Commands::Subdivide { candidates, scope } => {
            commands::subdivide(&ctx, &settings, &candidates, &scope)
        }
        Commands::Version => Ok(()),
    }
}
