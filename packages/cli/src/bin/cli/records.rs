use clap::Subcommand;
use colored::*;
use courier_cli::args::parse_header;
use courier_cli::DbState;
use courier_core::{truncate, MutationResult};
use courier_records::{Header, Record};
use inquire::Confirm;

use super::utils::{format_date, new_table};

#[derive(Subcommand)]
pub enum RecordsCommands {
    /// List records grouped by collection, in display order
    List {
        /// Collection ID (repeatable); all collections when omitted
        #[arg(short, long = "collection")]
        collections: Vec<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a single record
    Show {
        /// Record ID
        id: String,
        /// Skip loading headers
        #[arg(long)]
        no_headers: bool,
    },
    /// Add a record at the end of the display order
    Add {
        /// Collection ID the record belongs to
        #[arg(short, long)]
        collection: String,
        /// Record name
        #[arg(short, long)]
        name: String,
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Request URL
        #[arg(short, long)]
        url: Option<String>,
        /// Request body
        #[arg(short, long)]
        body: Option<String>,
        /// Header as key=value (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<Header>,
    },
    /// Edit a record; -H replaces the whole header set
    Edit {
        /// Record ID
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        method: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
        /// Header as key=value (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<Header>,
        /// Remove every header from the record
        #[arg(long, conflicts_with = "headers")]
        clear_headers: bool,
    },
    /// Move a record to a new display position
    Move {
        /// Record ID
        id: String,
        /// Target position; records at or after it shift down by one
        #[arg(short, long)]
        order: i64,
        /// Target collection; defaults to the record's current collection
        #[arg(short, long)]
        collection: Option<String>,
    },
    /// Delete a record
    Remove {
        /// Record ID
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle_records_command(
    state: &DbState,
    command: RecordsCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        RecordsCommands::List { collections, json } => list_records(state, collections, json).await,
        RecordsCommands::Show { id, no_headers } => show_record(state, &id, !no_headers).await,
        RecordsCommands::Add {
            collection,
            name,
            method,
            url,
            body,
            headers,
        } => {
            let mut record = Record::new(collection, name).with_method(method);
            record.url = url;
            record.body = body;
            record.headers = Some(headers);
            add_record(state, record).await
        }
        RecordsCommands::Edit {
            id,
            name,
            method,
            url,
            body,
            headers,
            clear_headers,
        } => {
            let edits = RecordEdits {
                name,
                method,
                url,
                body,
                headers: if clear_headers {
                    Some(Vec::new())
                } else if headers.is_empty() {
                    None
                } else {
                    Some(headers)
                },
            };
            edit_record(state, &id, edits).await
        }
        RecordsCommands::Move {
            id,
            order,
            collection,
        } => move_record(state, &id, order, collection).await,
        RecordsCommands::Remove { id, yes } => remove_record(state, &id, yes).await,
    }
}

struct RecordEdits {
    name: Option<String>,
    method: Option<String>,
    url: Option<String>,
    body: Option<String>,
    /// `None` keeps the stored headers
    headers: Option<Vec<Header>>,
}

async fn list_records(
    state: &DbState,
    collection_ids: Vec<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection_ids = if collection_ids.is_empty() {
        state
            .collection_storage
            .list()
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect()
    } else {
        collection_ids
    };

    let grouped = state
        .record_storage
        .get_by_collection_ids(&collection_ids)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&grouped)?);
        return Ok(());
    }

    if grouped.is_empty() {
        println!("{}", "No records found".yellow());
        return Ok(());
    }

    let mut total = 0;
    for collection_id in &collection_ids {
        let Some(records) = grouped.get(collection_id) else {
            continue;
        };
        total += records.len();

        println!("{}", collection_id.cyan().bold());
        let mut table = new_table(vec!["Order", "ID", "Method", "Name", "URL", "Headers"]);
        for record in records {
            table.add_row(vec![
                record.order.to_string(),
                record.id.clone(),
                record.method.clone(),
                truncate(&record.name, 30),
                truncate(record.url.as_deref().unwrap_or("-"), 40),
                record.header_list().len().to_string(),
            ]);
        }
        println!("{}", table);
    }

    println!("Total: {} records", total.to_string().cyan());
    Ok(())
}

async fn show_record(
    state: &DbState,
    id: &str,
    include_headers: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = match state.record_storage.get_by_id(id, include_headers).await? {
        Some(record) => record,
        None => return Err(format!("Record with ID '{}' not found", id).into()),
    };

    println!("{}", record.name.bold());
    println!("{:<12} {}", "ID:".cyan(), record.id);
    println!("{:<12} {}", "Collection:".cyan(), record.collection_id);
    println!("{:<12} {}", "Order:".cyan(), record.order);
    println!(
        "{:<12} {} {}",
        "Request:".cyan(),
        record.method.green(),
        record.url.as_deref().unwrap_or("")
    );
    println!("{:<12} {}", "Created:".cyan(), format_date(&record.created_at));
    println!("{:<12} {}", "Updated:".cyan(), format_date(&record.updated_at));

    if let Some(headers) = &record.headers {
        if headers.is_empty() {
            println!("{:<12} {}", "Headers:".cyan(), "none".dimmed());
        } else {
            let mut table = new_table(vec!["Key", "Value"]);
            for header in headers {
                table.add_row(vec![header.key.clone(), header.value.clone()]);
            }
            println!("{}", table);
        }
    }

    if let Some(body) = &record.body {
        println!("{}", "Body:".cyan());
        println!("{}", body);
    }

    Ok(())
}

async fn add_record(state: &DbState, record: Record) -> Result<(), Box<dyn std::error::Error>> {
    let id = record.id.clone();
    let name = record.name.clone();
    let result = state.record_storage.create(record).await?;
    report(result, &format!("Record '{}' created ({})", name.trim(), id))
}

async fn edit_record(
    state: &DbState,
    id: &str,
    edits: RecordEdits,
) -> Result<(), Box<dyn std::error::Error>> {
    // Update replaces the header set, so the stored headers are loaded and resupplied
    let mut record = match state.record_storage.get_by_id(id, true).await? {
        Some(record) => record,
        None => return Err(format!("Record with ID '{}' not found", id).into()),
    };

    if let Some(name) = edits.name {
        record.name = name;
    }
    if let Some(method) = edits.method {
        record.method = method;
    }
    if edits.url.is_some() {
        record.url = edits.url;
    }
    if edits.body.is_some() {
        record.body = edits.body;
    }
    if edits.headers.is_some() {
        record.headers = edits.headers;
    }

    let result = state.record_storage.update(record).await?;
    report(result, &format!("Record '{}' updated", id))
}

async fn move_record(
    state: &DbState,
    id: &str,
    order: i64,
    collection: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection_id = match collection {
        Some(collection_id) => collection_id,
        None => match state.record_storage.get_by_id(id, false).await? {
            Some(record) => record.collection_id,
            None => return Err(format!("Record with ID '{}' not found", id).into()),
        },
    };

    let result = state.record_storage.sort(id, &collection_id, order).await?;
    report(
        result,
        &format!("Record '{}' moved to position {} in {}", id, order, collection_id),
    )
}

async fn remove_record(
    state: &DbState,
    id: &str,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = match state.record_storage.get_by_id(id, false).await? {
        Some(record) => record,
        None => return Err(format!("Record with ID '{}' not found", id).into()),
    };

    let confirmed = yes
        || Confirm::new(&format!("Are you sure you want to delete '{}'?", record.name))
            .with_default(false)
            .prompt()?;

    if !confirmed {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    state.record_storage.delete(id).await?;
    println!("{}", format!("✅ Record '{}' deleted", record.name).green());
    Ok(())
}

fn report(result: MutationResult, success_message: &str) -> Result<(), Box<dyn std::error::Error>> {
    if result.is_success() {
        println!("{}", format!("✅ {}", success_message).green());
        Ok(())
    } else {
        Err(result.message.into())
    }
}
