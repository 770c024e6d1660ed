//! Interactive administrative shell.
//!
//! The shell is a finite set of named menu states with an explicit
//! dispatch table: a (state, choice) pair either navigates to another
//! state or runs one operation and stays put. The operations drive the
//! repositories and the report engine directly.

use std::io::{self, Write};

use chrono::{NaiveDate, TimeZone, Utc};

use crate::auth::password;
use crate::cli::commands::report;
use crate::cli::OutputFormat;
use crate::models::{
    Category, HistoryEntry, MeditationDoc, MeditationPatch, MoodEntry, UserDoc, UserPatch,
    RECOMMENDED_KINDS,
};
use crate::repository::{RemovalDecision, RemovalOutcome, RepoError};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Main,
    Reports,
    Users,
    Meditations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    // Reports
    ReportCategoryKind,
    ReportMoodDistribution,
    ReportHistory,
    ReportActiveUsers,
    // Users
    ListUsers,
    FindUserByEmail,
    InsertUser,
    UpdateUser,
    RemoveUser,
    AddMoodEntry,
    AddHistoryEntry,
    // Meditations
    ListMeditations,
    FindMeditationByTitle,
    InsertMeditation,
    UpdateMeditation,
    RemoveMeditation,
    MeditationsByCategory,
    MeditationsByKind,
    MeditationsByDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Goto(MenuState),
    Run(Operation),
    Exit,
    Invalid,
}

/// The complete transition table. Every reachable (state, choice) pair is
/// listed here; anything else is invalid.
pub fn dispatch(state: MenuState, choice: &str) -> Action {
    use Action::*;
    use MenuState::*;
    use Operation::*;

    match (state, choice) {
        (Main, "1") => Goto(Reports),
        (Main, "2") => Goto(Users),
        (Main, "3") => Goto(Meditations),
        (Main, "0") => Exit,

        (Reports, "1") => Run(ReportCategoryKind),
        (Reports, "2") => Run(ReportMoodDistribution),
        (Reports, "3") => Run(ReportHistory),
        (Reports, "4") => Run(ReportActiveUsers),
        (Reports, "0") => Goto(Main),

        (Users, "1") => Run(ListUsers),
        (Users, "2") => Run(FindUserByEmail),
        (Users, "3") => Run(InsertUser),
        (Users, "4") => Run(UpdateUser),
        (Users, "5") => Run(RemoveUser),
        (Users, "6") => Run(AddMoodEntry),
        (Users, "7") => Run(AddHistoryEntry),
        (Users, "0") => Goto(Main),

        (Meditations, "1") => Run(ListMeditations),
        (Meditations, "2") => Run(FindMeditationByTitle),
        (Meditations, "3") => Run(InsertMeditation),
        (Meditations, "4") => Run(UpdateMeditation),
        (Meditations, "5") => Run(RemoveMeditation),
        (Meditations, "6") => Run(MeditationsByCategory),
        (Meditations, "7") => Run(MeditationsByKind),
        (Meditations, "8") => Run(MeditationsByDuration),
        (Meditations, "0") => Goto(Main),

        _ => Invalid,
    }
}

fn render(state: MenuState) -> &'static str {
    match state {
        MenuState::Main => {
            "\n==== SERENO ADMIN ====\n\
             1 - Reports\n\
             2 - Manage users\n\
             3 - Manage meditations\n\
             0 - Quit\n"
        }
        MenuState::Reports => {
            "\n==== REPORTS ====\n\
             1 - Meditations by category and kind\n\
             2 - Mood distribution\n\
             3 - Meditation history (joined detail)\n\
             4 - Most active users\n\
             0 - Back\n"
        }
        MenuState::Users => {
            "\n==== USERS ====\n\
             1 - List users\n\
             2 - Find user by email\n\
             3 - Insert user\n\
             4 - Update user\n\
             5 - Remove user\n\
             6 - Add mood entry\n\
             7 - Add meditation history entry\n\
             0 - Back\n"
        }
        MenuState::Meditations => {
            "\n==== MEDITATIONS ====\n\
             1 - List meditations\n\
             2 - Find meditation by title\n\
             3 - Insert meditation\n\
             4 - Update meditation\n\
             5 - Remove meditation\n\
             6 - Filter by category\n\
             7 - Filter by kind\n\
             8 - Filter by duration range\n\
             0 - Back\n"
        }
    }
}

pub async fn run(state: &AppState) -> anyhow::Result<()> {
    let mut menu = MenuState::Main;

    loop {
        println!("{}", render(menu));
        let choice = prompt("Choose an option: ")?;

        match dispatch(menu, choice.trim()) {
            Action::Goto(next) => menu = next,
            Action::Exit => {
                if confirm("Really quit?")? {
                    println!("Bye.");
                    return Ok(());
                }
            }
            Action::Run(op) => {
                if let Err(e) = run_operation(state, op).await {
                    eprintln!("Error: {}", e);
                }
            }
            Action::Invalid => println!("Invalid option"),
        }
    }
}

async fn run_operation(state: &AppState, op: Operation) -> anyhow::Result<()> {
    let text = OutputFormat::Text;

    match op {
        Operation::ReportCategoryKind => report::category_kind(state, &text).await,
        Operation::ReportMoodDistribution => report::mood_distribution(state, &text).await,
        Operation::ReportHistory => {
            report::history(state, crate::config::config().reports.history_limit, &text).await
        }
        Operation::ReportActiveUsers => {
            report::active_users(
                state,
                crate::config::config().reports.active_users_limit,
                &text,
            )
            .await
        }

        Operation::ListUsers => list_users(state).await,
        Operation::FindUserByEmail => find_user_by_email(state).await,
        Operation::InsertUser => insert_user(state).await,
        Operation::UpdateUser => update_user(state).await,
        Operation::RemoveUser => remove_user(state).await,
        Operation::AddMoodEntry => add_mood_entry(state).await,
        Operation::AddHistoryEntry => add_history_entry(state).await,

        Operation::ListMeditations => list_meditations(state).await,
        Operation::FindMeditationByTitle => find_meditation_by_title(state).await,
        Operation::InsertMeditation => insert_meditation(state).await,
        Operation::UpdateMeditation => update_meditation(state).await,
        Operation::RemoveMeditation => remove_meditation(state).await,
        Operation::MeditationsByCategory => meditations_by_category(state).await,
        Operation::MeditationsByKind => meditations_by_kind(state).await,
        Operation::MeditationsByDuration => meditations_by_duration(state).await,
    }
}

// ---- user operations ----

async fn list_users(state: &AppState) -> anyhow::Result<()> {
    let limit = crate::config::config().reports.list_limit;
    let users = state.users.list_summary(limit).await?;

    if users.is_empty() {
        println!("No users registered");
        return Ok(());
    }

    println!("{:<26} {:<26} {:<30}", "ID", "NAME", "EMAIL");
    println!("{}", "-".repeat(84));
    for user in &users {
        println!(
            "{:<26} {:<26} {:<30}",
            user.id.to_hex(),
            truncate(&user.name, 25),
            truncate(&user.email, 29)
        );
    }
    println!("Total: {} user(s)", users.len());
    Ok(())
}

async fn find_user_by_email(state: &AppState) -> anyhow::Result<()> {
    let email = prompt("Email: ")?;

    match state.users.find_by_email(email.trim()).await? {
        Some(user) => {
            println!("ID:                  {}", user.id.map(|id| id.to_hex()).unwrap_or_default());
            println!("Name:                {}", user.name);
            println!("Email:               {}", user.email);
            println!("National id:         {}", user.national_id.as_deref().unwrap_or("-"));
            println!("Mood entries:        {}", user.mood_entries.len());
            println!("Meditation history:  {}", user.meditation_history.len());
            println!("Assessment results:  {}", user.assessment_results.len());
        }
        None => println!("No user with email '{}'", email.trim()),
    }
    Ok(())
}

async fn insert_user(state: &AppState) -> anyhow::Result<()> {
    let name = prompt("Name: ")?;
    let email = prompt("Email: ")?;
    let secret = prompt("Password: ")?;

    if name.trim().is_empty() || email.trim().is_empty() || secret.is_empty() {
        println!("Name, email and password are required");
        return Ok(());
    }

    let password_hash = password::hash_password(&secret)?;
    let mut user = UserDoc::new(name.trim(), email.trim(), password_hash);

    user.national_id = prompt_optional("National id (optional): ")?;
    if let Some(date) = prompt_optional("Birth date YYYY-MM-DD (optional): ")? {
        match parse_birth_date(&date) {
            Some(dt) => user.birth_date = Some(dt),
            None => println!("Ignoring unparseable date '{}'", date),
        }
    }
    user.blood_type = prompt_optional("Blood type (optional): ")?;
    user.allergies = prompt_optional("Allergies (optional): ")?;

    match state.users.insert(user).await {
        Ok(id) => println!("✓ User created with id {}", id.to_hex()),
        Err(RepoError::Conflict(msg)) => println!("Conflict: {}", msg),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn update_user(state: &AppState) -> anyhow::Result<()> {
    let email = prompt("Email of the user to update: ")?;
    let user = match state.users.find_by_email(email.trim()).await? {
        Some(user) => user,
        None => {
            println!("No user with email '{}'", email.trim());
            return Ok(());
        }
    };
    let id = doc_id(user.id)?;

    println!("Leave a field blank to keep its current value.");
    let patch = UserPatch {
        name: prompt_optional(&format!("Name [{}]: ", user.name))?,
        national_id: prompt_optional("National id: ")?,
        birth_date: prompt_optional("Birth date YYYY-MM-DD: ")?
            .and_then(|d| parse_birth_date(&d).map(|dt| dt.to_chrono())),
        blood_type: prompt_optional("Blood type: ")?,
        allergies: prompt_optional("Allergies: ")?,
        avatar_url: prompt_optional("Avatar URL: ")?,
        ..Default::default()
    };

    if patch.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }

    state.users.update(id, patch).await?;
    println!("✓ User updated");
    Ok(())
}

async fn remove_user(state: &AppState) -> anyhow::Result<()> {
    let email = prompt("Email of the user to remove: ")?;
    let user = match state.users.find_by_email(email.trim()).await? {
        Some(user) => user,
        None => {
            println!("No user with email '{}'", email.trim());
            return Ok(());
        }
    };

    if !confirm(&format!("Remove '{}' and all embedded data?", user.name))? {
        println!("Removal cancelled");
        return Ok(());
    }

    let id = doc_id(user.id)?;
    state.users.delete(id).await?;
    println!("✓ User removed");
    Ok(())
}

async fn add_mood_entry(state: &AppState) -> anyhow::Result<()> {
    let email = prompt("User email: ")?;
    let user = match state.users.find_by_email(email.trim()).await? {
        Some(user) => user,
        None => {
            println!("No user with email '{}'", email.trim());
            return Ok(());
        }
    };

    println!("Mood levels: 1 very low, 2 low, 3 neutral, 4 good, 5 very good");
    let level: i32 = match prompt("Level (1-5): ")?.trim().parse() {
        Ok(level) => level,
        Err(_) => {
            println!("Level must be a number");
            return Ok(());
        }
    };
    let feeling = prompt("Dominant feeling: ")?;
    let notes = prompt_optional("Notes (optional): ")?;

    let entry = match MoodEntry::new(level, feeling.trim(), notes) {
        Ok(entry) => entry,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let id = doc_id(user.id)?;
    state.users.add_mood_entry(id, entry).await?;
    println!("✓ Mood entry added");
    Ok(())
}

async fn add_history_entry(state: &AppState) -> anyhow::Result<()> {
    let email = prompt("User email: ")?;
    let user = match state.users.find_by_email(email.trim()).await? {
        Some(user) => user,
        None => {
            println!("No user with email '{}'", email.trim());
            return Ok(());
        }
    };

    list_meditations(state).await?;
    let meditation_id = prompt("Meditation id: ")?;
    let meditation = match state.meditations.find_by_id(meditation_id.trim()).await? {
        Some(m) => m,
        None => {
            println!("No meditation with id '{}'", meditation_id.trim());
            return Ok(());
        }
    };

    let actual_minutes = prompt_optional("Actual minutes (optional): ")?
        .and_then(|v| v.trim().parse::<i64>().ok());

    let entry = HistoryEntry::new(doc_id(meditation.id)?, actual_minutes);
    let id = doc_id(user.id)?;
    state.users.add_history_entry(id, entry).await?;
    println!("✓ History entry added for '{}'", meditation.title);
    Ok(())
}

// ---- meditation operations ----

async fn list_meditations(state: &AppState) -> anyhow::Result<()> {
    let limit = crate::config::config().reports.list_limit;
    let meditations = state.meditations.list_summary(limit).await?;

    if meditations.is_empty() {
        println!("No meditations in the catalog");
        return Ok(());
    }

    println!(
        "{:<26} {:<28} {:<14} {:<13} {:>6}",
        "ID", "TITLE", "KIND", "CATEGORY", "MIN"
    );
    println!("{}", "-".repeat(90));
    for m in &meditations {
        println!(
            "{:<26} {:<28} {:<14} {:<13} {:>6}",
            m.id.to_hex(),
            truncate(&m.title, 27),
            truncate(&m.kind, 13),
            m.category.as_str(),
            m.duration_minutes
        );
    }
    println!("Total: {} meditation(s)", meditations.len());
    Ok(())
}

async fn find_meditation_by_title(state: &AppState) -> anyhow::Result<()> {
    let title = prompt("Title: ")?;

    match state.meditations.find_by_title(title.trim()).await? {
        Some(m) => {
            println!("ID:          {}", m.id.map(|id| id.to_hex()).unwrap_or_default());
            println!("Title:       {}", m.title);
            println!("Description: {}", m.description);
            println!("Duration:    {} min", m.duration_minutes);
            println!("Kind:        {}", m.kind);
            println!("Category:    {}", m.category);
        }
        None => println!("No meditation titled '{}'", title.trim()),
    }
    Ok(())
}

async fn insert_meditation(state: &AppState) -> anyhow::Result<()> {
    let title = prompt("Title: ")?;
    let description = prompt("Description: ")?;
    let duration: i64 = match prompt("Duration in minutes: ")?.trim().parse() {
        Ok(d) => d,
        Err(_) => {
            println!("Duration must be a number");
            return Ok(());
        }
    };

    println!("Suggested kinds: {}", RECOMMENDED_KINDS.join(", "));
    let kind = prompt("Kind: ")?;

    println!(
        "Categories: {}",
        Category::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let category: Category = match prompt("Category: ")?.parse() {
        Ok(c) => c,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let mut meditation = match MeditationDoc::new(
        title.trim(),
        description.trim(),
        duration,
        kind.trim(),
        category,
    ) {
        Ok(m) => m,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    meditation.audio_url = prompt_optional("Audio URL (optional): ")?;

    match state.meditations.insert(meditation.clone(), false).await {
        Ok(id) => println!("✓ Meditation created with id {}", id.to_hex()),
        Err(RepoError::Conflict(msg)) => {
            println!("{}", msg);
            if confirm("Insert anyway?")? {
                let id = state.meditations.insert(meditation, true).await?;
                println!("✓ Meditation created with id {}", id.to_hex());
            } else {
                println!("Insert cancelled");
            }
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn update_meditation(state: &AppState) -> anyhow::Result<()> {
    let title = prompt("Title of the meditation to update: ")?;
    let meditation = match state.meditations.find_by_title(title.trim()).await? {
        Some(m) => m,
        None => {
            println!("No meditation titled '{}'", title.trim());
            return Ok(());
        }
    };
    let id = doc_id(meditation.id)?;

    println!("Leave a field blank to keep its current value.");
    let patch = MeditationPatch {
        title: prompt_optional(&format!("Title [{}]: ", meditation.title))?,
        description: prompt_optional("Description: ")?,
        duration_minutes: prompt_optional(&format!(
            "Duration in minutes [{}]: ",
            meditation.duration_minutes
        ))?
        .and_then(|v| v.trim().parse::<i64>().ok()),
        kind: prompt_optional(&format!("Kind [{}]: ", meditation.kind))?,
        category: prompt_optional(&format!("Category [{}]: ", meditation.category))?
            .and_then(|v| v.parse().ok()),
        audio_url: prompt_optional("Audio URL: ")?,
        ..Default::default()
    };

    if patch.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }

    state.meditations.update(id, patch).await?;
    println!("✓ Meditation updated");
    Ok(())
}

async fn remove_meditation(state: &AppState) -> anyhow::Result<()> {
    let title = prompt("Title of the meditation to remove: ")?;
    let meditation = match state.meditations.find_by_title(title.trim()).await? {
        Some(m) => m,
        None => {
            println!("No meditation titled '{}'", title.trim());
            return Ok(());
        }
    };
    let id = doc_id(meditation.id)?;

    let references = state.meditations.count_references(id).await?;

    let decision = if references == 0 {
        RemovalDecision::Cancel // unused: zero references delete directly
    } else {
        println!(
            "{} user(s) have this meditation in their history. Options:",
            references
        );
        println!("  1 - Remove and keep the dangling references");
        println!("  2 - Remove and strip the history entries from every user");
        println!("  3 - Cancel");
        match prompt("Choose (1/2/3): ")?.trim() {
            "1" => RemovalDecision::KeepReferences,
            "2" => RemovalDecision::StripReferences,
            _ => RemovalDecision::Cancel,
        }
    };

    match state.meditations.remove(id, decision).await? {
        RemovalOutcome::Removed { title, stripped_users } => {
            if stripped_users > 0 {
                println!("✓ Removed '{}', stripped history from {} user(s)", title, stripped_users);
            } else {
                println!("✓ Removed '{}'", title);
            }
        }
        RemovalOutcome::Cancelled { referencing_users } => {
            println!(
                "Removal cancelled; {} user(s) still reference it",
                referencing_users
            );
        }
    }
    Ok(())
}

async fn meditations_by_category(state: &AppState) -> anyhow::Result<()> {
    println!(
        "Categories: {}",
        Category::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let category = prompt("Category: ")?;
    let limit = crate::config::config().reports.list_limit;

    let meditations = state
        .meditations
        .find_by_category(category.trim(), limit)
        .await?;
    print_meditation_rows(&meditations);
    Ok(())
}

async fn meditations_by_kind(state: &AppState) -> anyhow::Result<()> {
    println!("Suggested kinds: {}", RECOMMENDED_KINDS.join(", "));
    let kind = prompt("Kind: ")?;
    let limit = crate::config::config().reports.list_limit;

    let meditations = state.meditations.find_by_kind(kind.trim(), limit).await?;
    print_meditation_rows(&meditations);
    Ok(())
}

async fn meditations_by_duration(state: &AppState) -> anyhow::Result<()> {
    let min: i64 = match prompt("Minimum minutes: ")?.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            println!("Minimum must be a number");
            return Ok(());
        }
    };
    let max: i64 = match prompt("Maximum minutes: ")?.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            println!("Maximum must be a number");
            return Ok(());
        }
    };
    let limit = crate::config::config().reports.list_limit;

    let meditations = state.meditations.find_by_duration(min, max, limit).await?;
    print_meditation_rows(&meditations);
    Ok(())
}

fn print_meditation_rows(meditations: &[MeditationDoc]) {
    if meditations.is_empty() {
        println!("No meditations matched");
        return;
    }
    for m in meditations {
        println!(
            "{:<28} {:<14} {:<13} {:>4} min",
            truncate(&m.title, 27),
            truncate(&m.kind, 13),
            m.category.as_str(),
            m.duration_minutes
        );
    }
    println!("Total: {} meditation(s)", meditations.len());
}

fn doc_id(id: Option<bson::oid::ObjectId>) -> anyhow::Result<bson::oid::ObjectId> {
    id.ok_or_else(|| anyhow::anyhow!("stored document is missing its id"))
}

// ---- line input helpers ----

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

fn prompt_optional(label: &str) -> io::Result<Option<String>> {
    let value = prompt(label)?;
    let trimmed = value.trim();
    Ok(if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    })
}

fn confirm(label: &str) -> io::Result<bool> {
    let answer = prompt(&format!("{} (y/N): ", label))?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn parse_birth_date(input: &str) -> Option<bson::DateTime> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()?;
    let datetime = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
    Some(bson::DateTime::from_chrono(datetime))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_menu_navigation() {
        assert_eq!(dispatch(MenuState::Main, "1"), Action::Goto(MenuState::Reports));
        assert_eq!(dispatch(MenuState::Main, "2"), Action::Goto(MenuState::Users));
        assert_eq!(dispatch(MenuState::Main, "3"), Action::Goto(MenuState::Meditations));
        assert_eq!(dispatch(MenuState::Main, "0"), Action::Exit);
        assert_eq!(dispatch(MenuState::Main, "9"), Action::Invalid);
    }

    #[test]
    fn submenus_return_to_main() {
        for state in [MenuState::Reports, MenuState::Users, MenuState::Meditations] {
            assert_eq!(dispatch(state, "0"), Action::Goto(MenuState::Main));
        }
    }

    #[test]
    fn every_listed_choice_is_wired() {
        for choice in ["1", "2", "3", "4"] {
            assert!(matches!(dispatch(MenuState::Reports, choice), Action::Run(_)));
        }
        for choice in ["1", "2", "3", "4", "5", "6", "7"] {
            assert!(matches!(dispatch(MenuState::Users, choice), Action::Run(_)));
            assert!(matches!(dispatch(MenuState::Meditations, choice), Action::Run(_)));
        }
        assert!(matches!(
            dispatch(MenuState::Meditations, "8"),
            Action::Run(Operation::MeditationsByDuration)
        ));
    }

    #[test]
    fn birth_dates_parse_or_are_rejected() {
        assert!(parse_birth_date("1990-05-17").is_some());
        assert!(parse_birth_date("17/05/1990").is_none());
        assert!(parse_birth_date("").is_none());
    }
}
