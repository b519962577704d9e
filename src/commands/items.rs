//! Listing commands: browse the feed and report an item.

use std::path::PathBuf;

use prettytable::{row, Table};

use crate::api::{Item, ItemKind, NewItem};
use crate::commands::{authenticated_client, report_failure};
use crate::config::Config;
use crate::error::{FinditbackError, Result};

const FETCH_ITEMS_FAILED: &str = "Failed to fetch items";
const SUBMIT_FAILED: &str = "Failed to submit item";

/// Fields of a new report as given on the command line.
#[derive(Debug, Clone)]
pub struct ReportArgs {
    /// Whether the item was lost or found
    pub kind: ItemKind,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Where the item was lost or found
    pub location: String,
    /// Category value stored by the backend
    pub category: String,
    /// Photo to upload before creating the listing
    pub photo: Option<PathBuf>,
}

/// Print the listing of one kind as a table.
pub async fn list_items(config: &Config, kind: ItemKind) -> Result<()> {
    let (_store, client) = authenticated_client(config)?;

    let items = client
        .list_items(kind)
        .await
        .map_err(|e| report_failure(e, FETCH_ITEMS_FAILED))?;

    if items.is_empty() {
        println!("No {} items reported yet", kind.as_str());
        return Ok(());
    }

    items_table(&items, kind).printstd();
    println!("\n{} item(s)", items.len());
    Ok(())
}

/// Upload the photo, when given, then create the listing.
pub async fn report_item(config: &Config, args: ReportArgs) -> Result<()> {
    let new_item = validate_report(&args)?;
    let (_store, client) = authenticated_client(config)?;

    let image_id = match &args.photo {
        Some(path) => {
            let uploaded = client
                .upload_image(path)
                .await
                .map_err(|e| report_failure(e, SUBMIT_FAILED))?;
            Some(uploaded.id)
        }
        None => None,
    };

    client
        .create_item(&NewItem {
            image_id,
            ..new_item
        })
        .await
        .map_err(|e| report_failure(e, SUBMIT_FAILED))?;

    println!("{} item \"{}\" reported", args.kind, args.title.trim());
    Ok(())
}

fn validate_report(args: &ReportArgs) -> Result<NewItem> {
    for (field, value) in [
        ("title", &args.title),
        ("description", &args.description),
        ("location", &args.location),
    ] {
        if value.trim().is_empty() {
            return Err(FinditbackError::InvalidInput(format!("{} must not be empty", field)).into());
        }
    }

    Ok(NewItem {
        kind: args.kind,
        title: args.title.trim().to_string(),
        description: args.description.trim().to_string(),
        location: args.location.trim().to_string(),
        image_id: None,
        category: args.category.clone(),
    })
}

/// Table of `items`; the poster column is labelled per `kind`.
pub fn items_table(items: &[Item], kind: ItemKind) -> Table {
    let mut table = Table::new();
    table.add_row(row![
        "ID",
        "Title",
        "Category",
        "Location",
        kind.poster_label(),
        "Date"
    ]);

    for item in items {
        let poster = item
            .posted_by
            .as_ref()
            .map(|p| {
                if p.username.is_empty() {
                    p.id.clone()
                } else {
                    p.username.clone()
                }
            })
            .unwrap_or_else(|| "-".to_string());
        let date = item
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(row![
            item.id,
            item.title,
            item.category.as_deref().unwrap_or("-"),
            item.location,
            poster,
            date
        ]);
    }

    table
}
