//! Command-line interface for the depfix dependency conflict engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing::error;

use depfix_core::DepfixConfig;

mod commands;

/// Operation finished without unresolved issues.
pub const EXIT_OK: i32 = 0;
/// General error: I/O, index unreachable, subprocess failure.
pub const EXIT_ERROR: i32 = 1;
/// Conflicts are present and were not (fully) fixed.
pub const EXIT_CONFLICTS: i32 = 2;

static LOGGING: OnceCell<()> = OnceCell::new();

fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        // logs go to stderr so stdout stays machine-readable
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// CLI arguments parser
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Detect and automatically resolve dependency conflicts in Python environments"
)]
pub struct Cli {
    /// Python interpreter whose environment is inspected
    #[arg(long, value_name = "PATH", global = true)]
    python: Option<PathBuf>,

    /// Package index JSON API base URL
    #[arg(long, value_name = "URL", global = true)]
    index_url: Option<String>,

    /// Directory for the on-disk index cache
    #[arg(long, value_name = "DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Emit machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the environment for dependency conflicts
    Scan,

    /// Resolve detected conflicts and apply the fixes
    Fix {
        /// Show what would change without touching the environment
        #[arg(long)]
        dry_run: bool,

        /// Apply without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Write the installed set to a lock file
    Lock {
        /// Output file (default: requirements.lock.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Reinstall the environment pinned in a lock file
    Restore {
        /// Lock file to read (default: requirements.lock.json)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Also uninstall packages absent from the lock file
        #[arg(long)]
        remove_missing: bool,
    },

    /// List installed packages with newer releases
    Outdated,
}

/// Parse arguments, dispatch, and return the process exit code.
pub async fn run() -> i32 {
    init_logging();
    let cli = Cli::parse();

    let mut config = DepfixConfig::default();
    if let Some(python) = cli.python {
        config.python = python;
    }
    if let Some(index_url) = cli.index_url {
        config.index_url = index_url;
    }
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = Some(cache_dir);
    }

    let result = match cli.command {
        Commands::Scan => commands::scan::execute(&config, cli.json).await,
        Commands::Fix { dry_run, yes } => {
            commands::fix::execute(&config, cli.json, dry_run, yes).await
        }
        Commands::Lock { output } => commands::lock::execute(&config, output).await,
        Commands::Restore {
            file,
            remove_missing,
        } => commands::restore::execute(&config, file, remove_missing).await,
        Commands::Outdated => commands::outdated::execute(&config, cli.json).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            EXIT_ERROR
        }
    }
}
