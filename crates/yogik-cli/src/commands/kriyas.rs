use clap::Subcommand;
use uuid::Uuid;
use yogik_core::{Library, Store};

#[derive(Subcommand)]
pub enum KriyasAction {
    /// List saved kriyas
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved kriya
    Delete { id: Uuid },
}

pub fn run(action: KriyasAction, store: &dyn Store) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::new(store);
    match action {
        KriyasAction::List { json } => {
            let kriyas = library.kriyas();
            if json {
                println!("{}", serde_json::to_string_pretty(&kriyas)?);
            } else if kriyas.is_empty() {
                println!("No saved kriyas.");
            } else {
                for kriya in kriyas {
                    println!(
                        "{}  {} ({} stages, x{}, rest {}s)",
                        kriya.id,
                        kriya.name,
                        kriya.stages.len(),
                        kriya.repeat_count,
                        kriya.rest_seconds
                    );
                }
            }
        }
        KriyasAction::Delete { id } => {
            if !library.delete_kriya(id)? {
                return Err(format!("no saved kriya with id {id}").into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
