mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

async fn add_pet(server: &TestServer, token: &str, name: &str) -> Result<String> {
    let res = server
        .client
        .post(server.url("/api/v1/pets"))
        .bearer_auth(token)
        .json(&json!({ "name": name, "petType": "dog", "gender": "male", "breed": "Beagle" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());

    let body = res.json::<Value>().await?;
    Ok(body["data"]["pet"]["id"].as_str().context("no pet id")?.to_string())
}

#[tokio::test]
async fn pet_routes_require_pet_owner_role() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, _) = server.active_account("doc@example.com", "physician").await?;

    let res = server
        .client
        .get(server.url("/api/v1/pets"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Access denied");
    assert_eq!(body["message"], "This endpoint requires one of: pet_owner");
    Ok(())
}

#[tokio::test]
async fn owner_manages_pet_lifecycle() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, owner_id) = server.active_account("owner@example.com", "pet_owner").await?;
    let pet_id = add_pet(&server, &token, "Rex").await?;

    let res = server
        .client
        .get(server.url(&format!("/api/v1/pets/{}", pet_id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["pet"]["ownerId"], owner_id.as_str());
    assert_eq!(body["data"]["pet"]["isLost"], false);

    let res = server
        .client
        .put(server.url(&format!("/api/v1/pets/{}", pet_id)))
        .bearer_auth(&token)
        .json(&json!({ "name": "Max" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["pet"]["name"], "Max");
    assert_eq!(body["data"]["pet"]["breed"], "Beagle");

    let res = server
        .client
        .post(server.url(&format!("/api/v1/pets/{}/lost", pet_id)))
        .bearer_auth(&token)
        .json(&json!({
            "lastSeenDate": "2025-03-01T18:00:00Z",
            "lastSeenLocation": "Riverside park",
            "description": "Red collar"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["pet"]["isLost"], true);
    assert_eq!(body["data"]["pet"]["lostDetails"]["lastSeenLocation"], "Riverside park");

    let res = server
        .client
        .delete(server.url(&format!("/api/v1/pets/{}", pet_id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url("/api/v1/pets"))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["pets"], json!([]));
    Ok(())
}

#[tokio::test]
async fn other_owners_pets_are_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (alice, _) = server.active_account("alice@example.com", "pet_owner").await?;
    let (bob, _) = server.active_account("bob@example.com", "pet_owner").await?;
    let pet_id = add_pet(&server, &alice, "Rex").await?;

    let res = server
        .client
        .get(server.url(&format!("/api/v1/pets/{}", pet_id)))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["error"], "Pet not found");

    let res = server
        .client
        .delete(server.url(&format!("/api/v1/pets/{}", pet_id)))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .get(server.url("/api/v1/pets"))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(res.json::<Value>().await?["data"]["pets"], json!([]));
    Ok(())
}

#[tokio::test]
async fn blank_pet_name_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, _) = server.active_account("blank@example.com", "pet_owner").await?;

    let res = server
        .client
        .post(server.url("/api/v1/pets"))
        .bearer_auth(&token)
        .json(&json!({ "name": "  ", "petType": "cat", "gender": "female" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn each_admitted_pet_request_is_audited() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, owner_id) = server.active_account("audit@example.com", "pet_owner").await?;
    let pet_id = add_pet(&server, &token, "Rex").await?;

    server
        .client
        .get(server.url(&format!("/api/v1/pets/{}", pet_id)))
        .bearer_auth(&token)
        .send()
        .await?;

    // Rejected before the audit layer
    server.client.get(server.url("/api/v1/pets")).send().await?;

    let events = server.audit.events();
    let actions: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["create_pet", "view_pet"]);
    assert!(events.iter().all(|e| e.user_id == owner_id));
    assert_eq!(events[1].endpoint, format!("/api/v1/pets/{}", pet_id));
    Ok(())
}
