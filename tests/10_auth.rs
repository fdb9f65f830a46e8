mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::{TestServer, PASSWORD};
use medtap_api::auth::{AccountStatus, Role};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].is_u64());
    Ok(())
}

#[tokio::test]
async fn register_returns_token_and_pending_user() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, body) = server.register("New.Owner@Example.com", "pet_owner").await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));

    let user = &body["data"]["user"];
    assert_eq!(user["email"], "new.owner@example.com");
    assert_eq!(user["userType"], "pet_owner");
    assert_eq!(user["status"], "pending_verification");
    assert!(user.get("passwordHash").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_409() -> Result<()> {
    let server = TestServer::spawn().await?;

    server.register("twice@example.com", "individual").await?;
    let (status, _) = server.register("twice@example.com", "physician").await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn short_password_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/api/v1/auth/register"))
        .json(&serde_json::json!({
            "email": "short@example.com",
            "password": "short",
            "userType": "individual"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_user_type_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, _) = server.register("odd@example.com", "administrator").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_is_401() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("owner@example.com", "pet_owner").await?;

    let (status, body) = server.login("owner@example.com", "not the password").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, _) = server.login("nobody@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn pending_account_can_log_in_but_not_pass_the_gate() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("pending@example.com", "individual").await?;

    let (status, body) = server.login("pending@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();

    let res = server
        .client
        .get(server.url("/api/v1/auth/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await?["error"], "Invalid or inactive user");
    Ok(())
}

#[tokio::test]
async fn suspended_account_cannot_log_in() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (_, id) = server.active_account("banned@example.com", "legal").await?;
    server.users.set_status(id.parse()?, AccountStatus::Suspended).await;

    let (status, body) = server.login("banned@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account is suspended or inactive");
    Ok(())
}

#[tokio::test]
async fn me_returns_stored_user() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, id) = server.active_account("me@example.com", "veteran").await?;

    let res = server
        .client
        .get(server.url("/api/v1/auth/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["user"]["id"], id.as_str());
    assert_eq!(body["data"]["user"]["status"], "active");
    Ok(())
}

#[tokio::test]
async fn token_keeps_role_it_was_issued_with() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, id) = server.active_account("switch@example.com", "pet_owner").await?;
    server.users.set_role(id.parse()?, Role::Physician).await;

    // Still a pet owner as far as the gate is concerned
    let res = server
        .client
        .get(server.url("/api/v1/pets"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn malformed_authorization_header_is_missing_credential() -> Result<()> {
    let server = TestServer::spawn().await?;

    for header in ["Basic abc", "Bearer", "Bearer ", "bearer abc"] {
        let res = server
            .client
            .get(server.url("/api/v1/auth/me"))
            .header("Authorization", header)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {:?}", header);
        assert_eq!(res.json::<Value>().await?["error"], "Access token required");
    }
    Ok(())
}

#[tokio::test]
async fn logout_is_audited() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (token, id) = server.active_account("bye@example.com", "insurance").await?;

    let res = server
        .client
        .post(server.url("/api/v1/auth/logout"))
        .bearer_auth(&token)
        .header("User-Agent", "integration-test")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let events = server.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "logout");
    assert_eq!(events[0].user_id, id);
    assert_eq!(events[0].endpoint, "/api/v1/auth/logout");
    assert_eq!(events[0].ip.as_deref(), Some("127.0.0.1"));
    assert_eq!(events[0].user_agent.as_deref(), Some("integration-test"));
    Ok(())
}
