//! `sereno stats` - aggregate usage counters and catalog breakdowns.

use serde_json::json;

use crate::cli::{app_state, utils, OutputFormat};

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let state = app_state().await?;

    let total_users = state.users.count().await?;
    let total_meditations = state.meditations.count().await?;
    let by_category = state.meditations.count_by_category().await?;
    let by_kind = state.meditations.count_by_kind().await?;

    match output_format {
        OutputFormat::Json => utils::output_success(
            &output_format,
            "stats",
            Some(json!({
                "total_users": total_users,
                "total_meditations": total_meditations,
                "meditations_by_category": by_category
                    .iter()
                    .map(|(category, count)| json!({ "category": category, "count": count }))
                    .collect::<Vec<_>>(),
                "meditations_by_kind": by_kind
                    .iter()
                    .map(|(kind, count)| json!({ "kind": kind, "count": count }))
                    .collect::<Vec<_>>(),
            })),
        ),
        OutputFormat::Text => {
            println!("Users:       {}", total_users);
            println!("Meditations: {}", total_meditations);
            if !by_category.is_empty() {
                println!("\nBy category:");
                for (category, count) in &by_category {
                    println!("  {:<15} {}", category, count);
                }
            }
            if !by_kind.is_empty() {
                println!("\nBy kind:");
                for (kind, count) in &by_kind {
                    println!("  {:<15} {}", kind, count);
                }
            }
            Ok(())
        }
    }
}
