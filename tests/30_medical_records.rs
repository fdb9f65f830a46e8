mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

async fn add_record(server: &TestServer, token: &str, record: Value) -> Result<String> {
    let res = server
        .client
        .post(server.url("/api/v1/medical-records"))
        .bearer_auth(token)
        .json(&record)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["message"], "Medical record created successfully");
    Ok(body["data"]["record"]["id"].as_str().context("no record id")?.to_string())
}

async fn list_titles(server: &TestServer, token: &str, query: &str) -> Result<Vec<String>> {
    let res = server
        .client
        .get(server.url(&format!("/api/v1/medical-records{}", query)))
        .bearer_auth(token)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "list failed: {}", res.status());

    let body = res.json::<Value>().await?;
    Ok(body["data"]["records"]
        .as_array()
        .context("records is not an array")?
        .iter()
        .filter_map(|r| r["title"].as_str().map(str::to_string))
        .collect())
}

#[tokio::test]
async fn physician_keeps_records_without_role_restriction() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, owner_id) = server.active_account("doc@example.com", "physician").await?;

    let id = add_record(
        &server,
        &token,
        json!({ "recordType": "visit", "title": "Annual check-up", "date": "2025-02-01T10:00:00Z" }),
    )
    .await?;

    let res = server
        .client
        .get(server.url(&format!("/api/v1/medical-records/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["record"]["ownerId"], owner_id.as_str());
    assert_eq!(body["data"]["record"]["diagnosis"], json!([]));
    Ok(())
}

#[tokio::test]
async fn list_filters_by_type_window_and_search() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, _) = server.active_account("patient@example.com", "individual").await?;

    add_record(
        &server,
        &token,
        json!({ "recordType": "lab_result", "title": "Lipid panel", "date": "2025-01-10T09:00:00Z", "provider": "Dr. Okafor" }),
    )
    .await?;
    add_record(
        &server,
        &token,
        json!({ "recordType": "imaging", "title": "Chest X-ray", "date": "2025-02-20T09:00:00Z", "description": "Clear lungs" }),
    )
    .await?;
    add_record(
        &server,
        &token,
        json!({ "recordType": "lab_result", "title": "HbA1c", "date": "2025-03-05T09:00:00Z" }),
    )
    .await?;

    assert_eq!(list_titles(&server, &token, "").await?, ["HbA1c", "Chest X-ray", "Lipid panel"]);
    assert_eq!(list_titles(&server, &token, "?recordType=imaging").await?, ["Chest X-ray"]);
    assert_eq!(
        list_titles(&server, &token, "?startDate=2025-01-10&endDate=2025-02-28").await?,
        ["Chest X-ray", "Lipid panel"]
    );
    assert_eq!(list_titles(&server, &token, "?search=LUNGS").await?, ["Chest X-ray"]);
    assert_eq!(list_titles(&server, &token, "?search=okafor&recordType=lab_result").await?, ["Lipid panel"]);
    assert!(list_titles(&server, &token, "?search=50%25").await?.is_empty());

    let res = server
        .client
        .get(server.url("/api/v1/medical-records?recordType=horoscope"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn records_are_scoped_to_their_owner() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (alice, _) = server.active_account("alice@example.com", "individual").await?;
    let (bob, _) = server.active_account("bob@example.com", "veteran").await?;
    let id = add_record(
        &server,
        &alice,
        json!({ "recordType": "allergy", "title": "Penicillin", "date": "2024-11-01T00:00:00Z", "isCritical": true }),
    )
    .await?;

    assert!(list_titles(&server, &bob, "").await?.is_empty());

    let res = server
        .client
        .put(server.url(&format!("/api/v1/medical-records/{}", id)))
        .bearer_auth(&bob)
        .json(&json!({ "title": "Nothing" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["error"], "Medical record not found");

    let res = server
        .client
        .delete(server.url(&format!("/api/v1/medical-records/{}", id)))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .delete(server.url(&format!("/api/v1/medical-records/{}", id)))
        .bearer_auth(&alice)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(list_titles(&server, &alice, "").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn update_rejects_blank_title_and_audits_changes() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, owner_id) = server.active_account("patient@example.com", "individual").await?;
    let id = add_record(
        &server,
        &token,
        json!({ "recordType": "prescription", "title": "Metformin", "date": "2025-01-02T00:00:00Z" }),
    )
    .await?;

    let res = server
        .client
        .put(server.url(&format!("/api/v1/medical-records/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "title": " " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .put(server.url(&format!("/api/v1/medical-records/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "medications": ["metformin 500mg"], "isShared": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["record"]["medications"], json!(["metformin 500mg"]));
    assert_eq!(body["data"]["record"]["isShared"], true);

    let events = server.audit.events();
    let actions: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["create_medical_record", "update_medical_record", "update_medical_record"]);
    assert!(events.iter().all(|e| e.user_id == owner_id));
    Ok(())
}
