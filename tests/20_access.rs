mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn id_of(res: reqwest::Response) -> Result<i64> {
    let body: Value = res.json().await?;
    body["id"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("no id in {}", body))
}

#[tokio::test]
async fn foreign_records_are_forbidden_and_missing_ones_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.register("alice@example.com").await?;
    let bob = server.register("bob@example.com").await?;

    let res = server
        .post("/api/conversations", &alice, json!({ "title": "Evening thoughts" }))
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let conversation = id_of(res).await?;

    let res = server
        .get(&format!("/api/conversations/{}", conversation), &bob)
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert!(
        body["message"].as_str().unwrap_or_default().contains("Access denied"),
        "{}",
        body
    );

    let res = server
        .get(&format!("/api/conversations/{}/messages", conversation), &bob)
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.get("/api/conversations/999999", &bob).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // the owner still sees it
    let res = server
        .get(&format!("/api/conversations/{}", conversation), &alice)
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn missing_is_reported_before_forbidden_and_unauthenticated_first() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.register("alice@example.com").await?;

    let res = server
        .client
        .delete(server.url("/api/emotions/12345"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.delete("/api/emotions/12345", &alice).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn users_can_only_touch_their_own_account() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.register("alice@example.com").await?;
    let bob = server.register("bob@example.com").await?;

    let me: Value = server.get("/api/users/me", &alice).await?.json().await?;
    let alice_id = me["id"].as_i64().unwrap_or_default();

    let res = server
        .client
        .put(server.url(&format!("/api/users/{}", alice_id)))
        .bearer_auth(&bob)
        .json(&json!({ "bio": "hijacked" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .put(server.url(&format!("/api/users/{}", alice_id)))
        .bearer_auth(&alice)
        .json(&json!({ "bio": "Gardener", "country": "NZ" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["bio"], "Gardener");
    assert_eq!(updated["firstName"], "Test");

    Ok(())
}

#[tokio::test]
async fn deleting_an_account_removes_owned_records() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.register("alice@example.com").await?;

    server
        .post("/api/emotions", &alice, json!({ "emotionType": "CALM" }))
        .await?;
    let me: Value = server.get("/api/users/me", &alice).await?.json().await?;
    let alice_id = me["id"].as_i64().unwrap_or_default();

    let res = server
        .delete(&format!("/api/users/{}", alice_id), &alice)
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // the token now names an account that is gone
    let res = server.get("/api/users/me", &alice).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .login("alice@example.com", "correct horse battery staple")
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
