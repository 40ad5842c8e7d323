use std::path::PathBuf;

use clap::Subcommand;
use uuid::Uuid;
use yogik_core::modes::custom::surya_namaskar;
use yogik_core::{ExportedSequence, Library, SavedSequence, Store};

#[derive(Subcommand)]
pub enum SequenceAction {
    /// List the built-in preset followed by saved sequences
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a saved sequence as a .yogikseq document
    Export {
        id: Uuid,
        /// File or directory to write to (prints to stdout otherwise)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Add the sequence from a .yogikseq file to the saved list
    Import { path: PathBuf },
    /// Delete a saved sequence
    Delete { id: Uuid },
}

pub fn run(action: SequenceAction, store: &dyn Store) -> Result<(), Box<dyn std::error::Error>> {
    let library = Library::new(store);
    match action {
        SequenceAction::List { json } => {
            let all: Vec<SavedSequence> = std::iter::once(surya_namaskar())
                .chain(library.sequences())
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
                return Ok(());
            }
            for sequence in all {
                let id = if sequence.is_preset {
                    "preset".to_string()
                } else {
                    sequence.id.to_string()
                };
                println!("{id:<36}  {} ({} poses)", sequence.name, sequence.poses.len());
            }
        }
        SequenceAction::Export { id, out } => {
            let sequence = library
                .find_sequence(id)
                .ok_or_else(|| format!("no saved sequence with id {id}"))?;
            let doc = ExportedSequence::new(sequence);
            let json = doc.to_json()?;
            match out {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(doc.file_name())
                    } else {
                        path
                    };
                    std::fs::write(&path, json)?;
                    println!("exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        SequenceAction::Import { path } => {
            let json = std::fs::read_to_string(&path)?;
            let sequence = library.import_sequence(&json)?;
            println!(
                "imported {} ({} poses) as {}",
                sequence.name,
                sequence.poses.len(),
                sequence.id
            );
        }
        SequenceAction::Delete { id } => {
            if !library.delete_sequence(id)? {
                return Err(format!("no saved sequence with id {id}").into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
