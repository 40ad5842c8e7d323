use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use yogik_core::{SqliteStore, Store, StoreError};

mod commands;

#[derive(Parser)]
#[command(name = "yogik", version, about = "Guided yoga and breathing practice timer")]
struct Cli {
    /// Database file (defaults to ~/.config/yogik/yogik.db)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timed transition/hold laps
    Yoga(commands::practice::YogaArgs),
    /// Counted breathing at a fixed ratio
    Pranayama(commands::practice::PranayamaArgs),
    /// Staged breath repetitions with optional rest
    Kriya(commands::practice::KriyaArgs),
    /// Run a pose sequence
    Custom(commands::practice::CustomArgs),
    /// Recently used yoga and pranayama configurations
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Saved pose sequences and .yogikseq files
    Sequence {
        #[command(subcommand)]
        action: commands::sequence::SequenceAction,
    },
    /// Saved kriyas
    Kriyas {
        #[command(subcommand)]
        action: commands::kriyas::KriyasAction,
    },
    /// Global settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = open_store(cli.db.as_deref())
        .map_err(Into::into)
        .and_then(|store| match cli.command {
            Commands::Yoga(args) => commands::practice::yoga(args, store),
            Commands::Pranayama(args) => commands::practice::pranayama(args, store),
            Commands::Kriya(args) => commands::practice::kriya(args, store),
            Commands::Custom(args) => commands::practice::custom(args, store),
            Commands::History { action } => commands::history::run(action, store.as_ref()),
            Commands::Sequence { action } => commands::sequence::run(action, store.as_ref()),
            Commands::Kriyas { action } => commands::kriyas::run(action, store.as_ref()),
            Commands::Settings { action } => commands::settings::run(action, store.as_ref()),
        });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so prompts on stdout stay readable.
/// `YOGIK_LOG` wins over `RUST_LOG`; the default is warnings only.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("YOGIK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(db: Option<&Path>) -> Result<Arc<dyn Store>, StoreError> {
    let store = match db {
        Some(path) => SqliteStore::open_at(path)?,
        None => SqliteStore::open()?,
    };
    tracing::debug!(path = ?db, "store opened");
    Ok(Arc::new(store))
}
