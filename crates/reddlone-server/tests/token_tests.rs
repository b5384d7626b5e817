//! Token verification endpoint integration tests.

use common::secret::ExposeSecret;
use jsonwebtoken::Algorithm;
use server_test_utils::{TestServer, TestTokenBuilder, TEST_SECRET_KEY};

async fn verify(server: &TestServer, token: &str) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/api/v1/tokens/verify", server.url()))
        .bearer_auth(token)
        .send()
        .await?)
}

#[tokio::test]
async fn test_issued_token_verifies() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = server.tokens().issue("alice@example.com")?;

    let response = verify(&server, token.expose_secret()).await?;
    assert_eq!(response.status(), 204);

    Ok(())
}

#[tokio::test]
async fn test_same_key_builder_token_verifies() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = TestTokenBuilder::new().sign(TEST_SECRET_KEY);

    let response = verify(&server, &token).await?;
    assert_eq!(response.status(), 204);

    Ok(())
}

#[tokio::test]
async fn test_expired_token_returns_401() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .issued_at(0)
        .expires_in(-1)
        .sign(TEST_SECRET_KEY);

    let response = verify(&server, &token).await?;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    Ok(())
}

#[tokio::test]
async fn test_foreign_key_token_returns_401() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = TestTokenBuilder::new().sign("some-other-secret");

    let response = verify(&server, &token).await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_other_algorithms_return_401() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;

    let hs384 = TestTokenBuilder::new()
        .with_algorithm(Algorithm::HS384)
        .sign(TEST_SECRET_KEY);
    assert_eq!(verify(&server, &hs384).await?.status(), 401);

    let unsigned = TestTokenBuilder::new().unsigned();
    assert_eq!(verify(&server, &unsigned).await?.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_missing_bearer_returns_401() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/tokens/verify", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_oversized_token_returns_401() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;
    let token = format!("{}.{}.{}", "a".repeat(4096), "b".repeat(4096), "c");

    let response = verify(&server, &token).await?;
    assert_eq!(response.status(), 401);

    Ok(())
}
