//! `sereno db` - document store maintenance.

use clap::Subcommand;
use serde_json::json;

use crate::cli::{app_state, utils, OutputFormat};
use crate::models::{MeditationDoc, UserDoc, MEDITATION_COLLECTION, USER_COLLECTION};

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Check document store connectivity")]
    Ping,

    #[command(about = "Apply collection indexes (email uniqueness, lookups)")]
    Init,

    #[command(about = "List collections with document counts")]
    Collections,

    #[command(about = "Delete every document in a collection (destructive)")]
    Clear {
        #[arg(help = "Collection name")]
        collection: String,

        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = app_state().await?;
    let gateway = &state.gateway;

    match cmd {
        DbCommands::Ping => match gateway.ping().await {
            Ok(_) => utils::output_success(&output_format, "Document store reachable", None),
            Err(e) => utils::output_error(&output_format, &e.to_string(), Some("STORE_ERROR")),
        },

        DbCommands::Init => {
            gateway.apply_indexes::<UserDoc>(USER_COLLECTION).await?;
            gateway
                .apply_indexes::<MeditationDoc>(MEDITATION_COLLECTION)
                .await?;
            utils::output_success(&output_format, "Indexes applied", None)
        }

        DbCommands::Collections => {
            let names = gateway.list_collection_names().await?;
            let mut rows = Vec::with_capacity(names.len());
            for name in names {
                let count = gateway.count_documents(&name).await?;
                rows.push(json!({ "collection": name, "documents": count }));
            }
            utils::output_rows(
                &output_format,
                &rows,
                |row| {
                    format!(
                        "{:<24} {:>8}",
                        row["collection"].as_str().unwrap_or("-"),
                        row["documents"]
                    )
                },
                "No collections found",
            )
        }

        DbCommands::Clear { collection, yes } => {
            if !yes {
                return utils::output_error(
                    &output_format,
                    "Refusing to clear without --yes",
                    Some("CONFIRMATION_REQUIRED"),
                );
            }
            let deleted = gateway.clear_collection(&collection).await?;
            utils::output_success(
                &output_format,
                &format!("Removed {} documents from '{}'", deleted, collection),
                Some(json!({ "deleted": deleted })),
            )
        }
    }
}
