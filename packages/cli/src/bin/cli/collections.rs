use clap::Subcommand;
use colored::*;
use courier_cli::DbState;
use courier_core::truncate;
use courier_records::CollectionCreateInput;
use inquire::Confirm;

use super::utils::{format_date, new_table};

#[derive(Subcommand)]
pub enum CollectionsCommands {
    /// List all collections
    List,
    /// Add a new collection
    Add {
        /// Collection name
        #[arg(short, long)]
        name: String,
        /// Collection description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a collection and every record in it
    Remove {
        /// Collection ID to delete
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle_collections_command(
    state: &DbState,
    command: CollectionsCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        CollectionsCommands::List => list_collections(state).await,
        CollectionsCommands::Add { name, description } => {
            add_collection(state, name, description).await
        }
        CollectionsCommands::Remove { id, yes } => remove_collection(state, &id, yes).await,
    }
}

async fn list_collections(state: &DbState) -> Result<(), Box<dyn std::error::Error>> {
    let collections = state.collection_storage.list().await?;

    if collections.is_empty() {
        println!("{}", "No collections found".yellow());
        println!(
            "{}",
            "Use 'courier collections add --name <NAME>' to create one".dimmed()
        );
        return Ok(());
    }

    let ids: Vec<&str> = collections.iter().map(|c| c.id.as_str()).collect();
    let records = state.record_storage.get_by_collection_ids(&ids).await?;

    let mut table = new_table(vec!["ID", "Name", "Description", "Records", "Created"]);
    for collection in &collections {
        let record_count = records.get(&collection.id).map_or(0, Vec::len);
        table.add_row(vec![
            collection.id.clone(),
            truncate(&collection.name, 30),
            truncate(collection.description.as_deref().unwrap_or("-"), 40),
            record_count.to_string(),
            format_date(&collection.created_at),
        ]);
    }

    println!("{}", table);
    println!("Total: {} collections", collections.len().to_string().cyan());
    Ok(())
}

async fn add_collection(
    state: &DbState,
    name: String,
    description: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection = state
        .collection_storage
        .create(CollectionCreateInput { name, description })
        .await?;

    println!(
        "{}",
        format!("✅ Collection '{}' created", collection.name).green()
    );
    println!("{:<8} {}", "ID:".cyan(), collection.id);
    Ok(())
}

async fn remove_collection(
    state: &DbState,
    id: &str,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection = match state.collection_storage.get(id).await? {
        Some(collection) => collection,
        None => return Err(format!("Collection with ID '{}' not found", id).into()),
    };

    let confirmed = yes
        || Confirm::new(&format!(
            "Delete '{}' and all of its records?",
            collection.name
        ))
        .with_default(false)
        .prompt()?;

    if !confirmed {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    state.collection_storage.delete(id).await?;
    println!(
        "{}",
        format!("✅ Collection '{}' deleted", collection.name).green()
    );
    Ok(())
}
