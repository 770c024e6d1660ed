//! `sereno report` - run the aggregation reports from the command line.

use clap::Subcommand;
use serde_json::json;

use crate::cli::{app_state, utils, OutputFormat};
use crate::config;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum ReportCommands {
    #[command(about = "Meditations grouped by category and kind")]
    CategoryKind,

    #[command(about = "Mood level distribution across all users")]
    MoodDistribution,

    #[command(about = "Meditation history with joined catalog detail")]
    History {
        #[arg(long, help = "Maximum rows to return")]
        limit: Option<i64>,
    },

    #[command(about = "Most active users by completed meditations")]
    ActiveUsers {
        #[arg(long, help = "Maximum rows to return")]
        limit: Option<i64>,
    },
}

pub async fn handle(cmd: ReportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = app_state().await?;

    match cmd {
        ReportCommands::CategoryKind => category_kind(&state, &output_format).await,
        ReportCommands::MoodDistribution => mood_distribution(&state, &output_format).await,
        ReportCommands::History { limit } => {
            let limit = limit.unwrap_or(config::config().reports.history_limit);
            history(&state, limit, &output_format).await
        }
        ReportCommands::ActiveUsers { limit } => {
            let limit = limit.unwrap_or(config::config().reports.active_users_limit);
            active_users(&state, limit, &output_format).await
        }
    }
}

pub async fn category_kind(state: &AppState, output_format: &OutputFormat) -> anyhow::Result<()> {
    let rows = state.reports.meditations_by_category_kind().await?;

    if matches!(output_format, OutputFormat::Text) && !rows.is_empty() {
        println!("{:<15} {:<20} {:>8} {:>14}", "CATEGORY", "KIND", "TOTAL", "AVG DURATION");
        println!("{}", "-".repeat(60));
    }

    let total: i64 = rows.iter().map(|r| r.total).sum();
    let values: Vec<_> = rows
        .iter()
        .map(|r| {
            json!({
                "category": r.category,
                "kind": r.kind,
                "total": r.total,
                "avg_duration": r.avg_duration,
            })
        })
        .collect();

    utils::output_rows(
        output_format,
        &values,
        |row| {
            let avg = row["avg_duration"]
                .as_f64()
                .map(|v| format!("{:.1} min", v))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{:<15} {:<20} {:>8} {:>14}",
                row["category"].as_str().unwrap_or("-"),
                row["kind"].as_str().unwrap_or("-"),
                row["total"].as_i64().unwrap_or(0),
                avg
            )
        },
        "No meditations found",
    )?;

    if matches!(output_format, OutputFormat::Text) && !rows.is_empty() {
        println!("{}", "-".repeat(60));
        println!("{:<36} {:>8}", "TOTAL", total);
    }

    Ok(())
}

pub async fn mood_distribution(state: &AppState, output_format: &OutputFormat) -> anyhow::Result<()> {
    let rows = state.reports.mood_distribution().await?;

    if matches!(output_format, OutputFormat::Text) && !rows.is_empty() {
        println!("{:<7} {:<25} {:>8}", "LEVEL", "FEELING", "TOTAL");
        println!("{}", "-".repeat(42));
    }

    let values: Vec<_> = rows
        .iter()
        .map(|r| json!({ "level": r.level, "feeling": r.feeling, "total": r.total }))
        .collect();

    utils::output_rows(
        output_format,
        &values,
        |row| {
            format!(
                "{:<7} {:<25} {:>8}",
                row["level"].as_i64().unwrap_or(0),
                row["feeling"].as_str().unwrap_or("-"),
                row["total"].as_i64().unwrap_or(0)
            )
        },
        "No mood entries found",
    )
}

pub async fn history(state: &AppState, limit: i64, output_format: &OutputFormat) -> anyhow::Result<()> {
    let rows = state.reports.history_detail(limit).await?;

    if matches!(output_format, OutputFormat::Text) && !rows.is_empty() {
        println!(
            "{:<22} {:<28} {:<14} {:<12}",
            "USER", "MEDITATION", "KIND", "COMPLETED"
        );
        println!("{}", "-".repeat(80));
    }

    let values: Vec<_> = rows
        .iter()
        .map(|r| {
            json!({
                "user_name": r.user_name,
                "user_email": r.user_email,
                "title": r.title,
                "kind": r.kind,
                "category": r.category,
                "planned_minutes": r.planned_minutes,
                "actual_minutes": r.actual_minutes,
                "completed_at": r.completed_at.try_to_rfc3339_string().unwrap_or_default(),
            })
        })
        .collect();

    utils::output_rows(
        output_format,
        &values,
        |row| {
            let date = row["completed_at"]
                .as_str()
                .map(|s| s.chars().take(10).collect::<String>())
                .unwrap_or_default();
            format!(
                "{:<22} {:<28} {:<14} {:<12}",
                truncate(row["user_name"].as_str().unwrap_or("-"), 21),
                truncate(row["title"].as_str().unwrap_or("-"), 27),
                truncate(row["kind"].as_str().unwrap_or("-"), 13),
                date
            )
        },
        "No meditation history found",
    )?;

    if matches!(output_format, OutputFormat::Text) && !rows.is_empty() {
        println!("{}", "-".repeat(80));
        println!("Rows: {}", rows.len());
    }

    Ok(())
}

pub async fn active_users(state: &AppState, limit: i64, output_format: &OutputFormat) -> anyhow::Result<()> {
    let rows = state.reports.most_active_users(limit).await?;

    if matches!(output_format, OutputFormat::Text) && !rows.is_empty() {
        println!("{:<4} {:<28} {:>12} {:>8}", "#", "NAME", "MEDITATIONS", "MOODS");
        println!("{}", "-".repeat(56));
    }

    match output_format {
        OutputFormat::Json => {
            let values: Vec<_> = rows
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id.to_hex(),
                        "name": r.name,
                        "email": r.email,
                        "total_meditations": r.total_meditations,
                        "total_moods": r.total_moods,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No users found");
            } else {
                for (i, row) in rows.iter().enumerate() {
                    println!(
                        "{:<4} {:<28} {:>12} {:>8}",
                        i + 1,
                        truncate(&row.name, 27),
                        row.total_meditations,
                        row.total_moods
                    );
                }
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
