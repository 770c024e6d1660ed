mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn root_reports_service_info() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(&server.base_url).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Sereno API");
    assert!(body["data"]["endpoints"].is_object());

    Ok(())
}

#[tokio::test]
async fn health_answers_even_without_a_store() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    // OK with a live MongoDB, SERVICE_UNAVAILABLE without one; either way
    // the endpoint must answer with the structured envelope
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("success").is_some(), "missing 'success': {}", body);
    assert!(body["data"]["status"].is_string());

    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for (method, path) in [
        ("GET", "/profile"),
        ("GET", "/mood/weekly-report"),
        ("GET", "/assessments/history"),
    ] {
        let res = match method {
            "GET" => client.get(format!("{}{}", server.base_url, path)).send().await?,
            _ => unreachable!(),
        };
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{} {}", method, path);

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["error"], true, "{} should carry the error envelope", path);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    let res = client
        .post(format!("{}/mood", server.base_url))
        .json(&json!({ "level": 3 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn malformed_bearer_tokens_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/profile", server.base_url))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/profile", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
