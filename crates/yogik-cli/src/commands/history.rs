use clap::{Subcommand, ValueEnum};
use yogik_core::history::HistoryConfig;
use yogik_core::storage::keys;
use yogik_core::{HistoryLedger, PranayamaConfig, Store, YogaConfig};

#[derive(Clone, Copy, ValueEnum)]
pub enum HistoryMode {
    Yoga,
    Pranayama,
}

impl HistoryMode {
    fn outcome_unit(self) -> &'static str {
        match self {
            HistoryMode::Yoga => "laps",
            HistoryMode::Pranayama => "rounds",
        }
    }
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recent configurations, newest first
    List {
        #[arg(long, value_enum)]
        mode: HistoryMode,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget every entry for a mode
    Clear {
        #[arg(long, value_enum)]
        mode: HistoryMode,
    },
    /// Remove one entry by its list position
    Delete {
        #[arg(long, value_enum)]
        mode: HistoryMode,
        index: usize,
    },
}

impl HistoryAction {
    fn mode(&self) -> HistoryMode {
        match self {
            HistoryAction::List { mode, .. }
            | HistoryAction::Clear { mode }
            | HistoryAction::Delete { mode, .. } => *mode,
        }
    }
}

pub fn run(action: HistoryAction, store: &dyn Store) -> Result<(), Box<dyn std::error::Error>> {
    match action.mode() {
        HistoryMode::Yoga => apply::<YogaConfig>(action, store, keys::YOGA_HISTORY),
        HistoryMode::Pranayama => apply::<PranayamaConfig>(action, store, keys::PRANAYAMA_HISTORY),
    }
}

fn apply<C: HistoryConfig>(
    action: HistoryAction,
    store: &dyn Store,
    key: &'static str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = HistoryLedger::<C>::load(store, key);
    match action {
        HistoryAction::List { mode, json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(ledger.entries())?);
            } else if ledger.is_empty() {
                println!("No history.");
            } else {
                for (index, entry) in ledger.entries().iter().enumerate() {
                    println!(
                        "{index}  {:<12} {:>4} {}  {}",
                        entry.name,
                        entry.outcome,
                        mode.outcome_unit(),
                        entry.last_used.format("%Y-%m-%d %H:%M"),
                    );
                }
            }
        }
        HistoryAction::Clear { .. } => {
            ledger.clear();
            ledger.save(store)?;
            println!("history cleared");
        }
        HistoryAction::Delete { index, .. } => {
            let removed = ledger
                .delete(index)
                .ok_or_else(|| format!("no history entry at index {index}"))?;
            ledger.save(store)?;
            println!("removed {}", removed.name);
        }
    }
    Ok(())
}
