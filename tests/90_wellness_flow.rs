//! End-to-end flows against a live MongoDB. These tests are skipped unless
//! MONGO_URI is exported, so the default `cargo test` run stays green on
//! machines without a store.

mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use sereno_api::auth::password;
use sereno_api::config::StoreConfig;
use sereno_api::db::StoreGateway;
use sereno_api::models::{Category, HistoryEntry, MeditationDoc, MoodEntry, Notification, UserDoc};
use sereno_api::reports::REMOVED_PLACEHOLDER;
use sereno_api::repository::{RemovalDecision, RemovalOutcome, RepoError};
use sereno_api::state::AppState;

fn mongo_uri() -> Option<String> {
    std::env::var("MONGO_URI").ok()
}

async fn test_state(uri: &str, database: &str) -> Result<AppState> {
    let cfg = StoreConfig {
        uri: uri.to_string(),
        database: database.to_string(),
        server_selection_timeout_ms: 5000,
        connect_timeout_ms: 5000,
    };
    let gateway = StoreGateway::connect(&cfg).await?;
    Ok(AppState::new(gateway))
}

#[tokio::test]
async fn repository_and_report_flow() -> Result<()> {
    let Some(uri) = mongo_uri() else {
        eprintln!("MONGO_URI not set; skipping repository_and_report_flow");
        return Ok(());
    };

    let db_name = format!("sereno_test_repo_{}", std::process::id());
    let state = test_state(&uri, &db_name).await?;

    // An empty catalog yields an empty report, not an error
    assert!(state.reports.meditations_by_category_kind().await?.is_empty());

    // Seed the catalog and one user
    let meditation = MeditationDoc::new(
        "Morning Calm",
        "Start the day grounded",
        10,
        "mindfulness",
        Category::Beginner,
    )?;
    let meditation_id = state.meditations.insert(meditation, false).await?;

    let hash = password::hash_password("secret-pass")?;
    let user = UserDoc::new("User A", "user-a@example.com", hash.clone());
    let user_id = state.users.insert(user).await?;

    // A second user with the same email is refused and the store unchanged
    let duplicate = UserDoc::new("Someone Else", "user-a@example.com", hash);
    assert!(matches!(
        state.users.insert(duplicate).await,
        Err(RepoError::Conflict(_))
    ));
    assert_eq!(state.users.count().await?, 1);

    // Record a completion and read it back through the joined report
    state
        .users
        .add_history_entry(user_id, HistoryEntry::new(meditation_id, Some(12)))
        .await?;

    let rows = state.reports.history_detail(50).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Morning Calm");
    assert_eq!(rows[0].planned_minutes, Some(10));
    assert_eq!(rows[0].actual_minutes, Some(12));
    assert_eq!(rows[0].user_email, "user-a@example.com");

    // Concurrent mood appends must both persist (atomic pushes)
    let (first, second) = tokio::join!(
        state
            .users
            .add_mood_entry(user_id, MoodEntry::new(4, "calm", None)?),
        state
            .users
            .add_mood_entry(user_id, MoodEntry::new(2, "tense", None)?),
    );
    first?;
    second?;

    let stored = state
        .users
        .find_by_oid(user_id)
        .await?
        .expect("user exists");
    assert_eq!(stored.mood_entries.len(), 2);

    let moods = state.reports.mood_distribution().await?;
    let total: i64 = moods.iter().map(|r| r.total).sum();
    assert_eq!(total, 2);
    // Sorted by level descending
    assert_eq!(moods[0].level, 4);

    // Cancelling a removal leaves the meditation and references intact
    let outcome = state
        .meditations
        .remove(meditation_id, RemovalDecision::Cancel)
        .await?;
    assert_eq!(
        outcome,
        RemovalOutcome::Cancelled {
            referencing_users: 1
        }
    );
    assert!(state.meditations.find_by_oid(meditation_id).await?.is_some());

    // Removing while keeping references leaves a dangling reference that
    // report 3 renders with the placeholder instead of dropping the row
    let outcome = state
        .meditations
        .remove(meditation_id, RemovalDecision::KeepReferences)
        .await?;
    assert!(matches!(outcome, RemovalOutcome::Removed { .. }));

    let rows = state.reports.history_detail(50).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, REMOVED_PLACEHOLDER);
    assert!(rows[0].planned_minutes.is_none());

    // The strip cascade removes only matching entries
    let other = MeditationDoc::new(
        "Evening Wind Down",
        "Let the day go",
        15,
        "relaxation",
        Category::Intermediate,
    )?;
    let other_id = state.meditations.insert(other, false).await?;
    state
        .users
        .add_history_entry(user_id, HistoryEntry::new(other_id, None))
        .await?;

    // Catalog breakdowns group what is currently stored
    let by_category = state.meditations.count_by_category().await?;
    assert_eq!(by_category, vec![("intermediate".to_string(), 1)]);
    let by_kind = state.meditations.count_by_kind().await?;
    assert_eq!(by_kind, vec![("relaxation".to_string(), 1)]);

    let outcome = state
        .meditations
        .remove(other_id, RemovalDecision::StripReferences)
        .await?;
    assert!(matches!(
        outcome,
        RemovalOutcome::Removed {
            stripped_users: 1,
            ..
        }
    ));

    let stored = state
        .users
        .find_by_oid(user_id)
        .await?
        .expect("user exists");
    // The dangling "Morning Calm" entry survives; only the stripped one went
    assert_eq!(stored.meditation_history.len(), 1);
    assert_eq!(stored.meditation_history[0].meditation_id, meditation_id);

    // Activity ranking counts both arrays without materializing them
    let active = state.reports.most_active_users(10).await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].total_meditations, 1);
    assert_eq!(active[0].total_moods, 2);

    // Notifications append like every other embedded array
    state
        .users
        .add_notification(user_id, Notification::new("Welcome", "Glad you are here"))
        .await?;
    let stored = state
        .users
        .find_by_oid(user_id)
        .await?
        .expect("user exists");
    assert_eq!(stored.notifications.len(), 1);
    assert!(!stored.notifications[0].read);

    // Full and summary listings agree on membership
    let full = state.users.list(10).await?;
    let summaries = state.users.list_summary(10).await?;
    assert_eq!(full.len(), 1);
    assert_eq!(summaries.len(), 1);
    assert_eq!(full[0].email, summaries[0].email);

    state.gateway.database().drop().await?;
    Ok(())
}

#[tokio::test]
async fn http_registration_and_mood_flow() -> Result<()> {
    let Some(uri) = mongo_uri() else {
        eprintln!("MONGO_URI not set; skipping http_registration_and_mood_flow");
        return Ok(());
    };

    let db_name = format!("sereno_test_http_{}", std::process::id());
    std::env::set_var("MONGO_DB_NAME", &db_name);

    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Register
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "name": "Flow Tester",
            "email": "flow@example.com",
            "password": "a-strong-one"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    let access_token = body["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string();
    let refresh_token = body["data"]["refresh_token"]
        .as_str()
        .expect("refresh token")
        .to_string();

    // Duplicate email is a conflict
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({
            "name": "Flow Tester II",
            "email": "flow@example.com",
            "password": "another"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Wrong password is unauthorized
    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": "flow@example.com", "password": "wrong" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Correct login works
    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": "flow@example.com", "password": "a-strong-one" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // A refresh token buys a new access token
    let res = client
        .post(format!("{}/auth/refresh", server.base_url))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Out-of-range mood level is rejected before persistence
    let res = client
        .post(format!("{}/mood", server.base_url))
        .bearer_auth(&access_token)
        .json(&json!({ "level": 6, "feeling": "too good" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Two valid entries land
    for (level, feeling) in [(4, "calm"), (3, "steady")] {
        let res = client
            .post(format!("{}/mood", server.base_url))
            .bearer_auth(&access_token)
            .json(&json!({ "level": level, "feeling": feeling }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(format!("{}/mood/weekly-report", server.base_url))
        .bearer_auth(&access_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["total_entries"], 2);
    assert_eq!(body["data"]["average_level"], 3.5);

    // Assessment kinds are normalized on the way in
    let res = client
        .post(format!("{}/assessments", server.base_url))
        .bearer_auth(&access_token)
        .json(&json!({
            "kind": "Burnout Questionnaire",
            "score": 17,
            "answers": { "q1": 3, "q2": 4 }
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/assessments/history", server.base_url))
        .bearer_auth(&access_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["assessments"][0]["kind"], "burnout");

    // Clean up the throwaway database
    let cfg = StoreConfig {
        uri,
        database: db_name,
        server_selection_timeout_ms: 5000,
        connect_timeout_ms: 5000,
    };
    let gateway = StoreGateway::connect(&cfg).await?;
    gateway.database().drop().await?;

    Ok(())
}
