use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::client::ApiClient;
use crate::session::Session;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of the auth endpoints. `token` is present on login/register,
/// `message` on informational responses such as validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn register(client: &ApiClient, req: &RegisterRequest) -> Result<Session> {
    info!(email = %req.email, "registering user");
    let resp: AuthResponse = client.post_json("/api/auth/register", req).await?;
    session_from_response(resp, &req.email, &req.first_name, &req.last_name)
}

pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<Session> {
    info!(%email, "logging in");
    let req = LoginRequest { email: email.to_string(), password: password.to_string() };
    let resp: AuthResponse = client.post_json("/api/auth/login", &req).await?;
    session_from_response(resp, email, "", "")
}

/// Check the bearer token currently attached to the client.
pub async fn validate(client: &ApiClient) -> Result<()> {
    let _: AuthResponse = client.get_json("/api/auth/validate").await?;
    Ok(())
}

/// Server-side logout. Local session state is cleared by the caller
/// regardless of whether this call succeeds.
pub async fn logout(client: &ApiClient) -> Result<()> {
    client.get_ok("/logout").await
}

/// Where to send a browser for the OAuth provider flow. Token issuance
/// happens entirely server-side; the client only points at it.
pub fn oauth_login_url(base: &Url) -> Result<Url> {
    base.join("/login").context("building OAuth login URL")
}

/// Build a session from an externally obtained ID token (OAuth flow done
/// in a browser, token pasted back).
pub fn session_from_token(token: String, email: String) -> Session {
    Session::new(token, email, String::new(), String::new())
}

fn session_from_response(
    resp: AuthResponse,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<Session> {
    let token = resp
        .token
        .filter(|t| !t.is_empty())
        .with_context(|| {
            format!(
                "auth endpoint returned no token{}",
                resp.message.map(|m| format!(": {m}")).unwrap_or_default()
            )
        })?;
    Ok(Session::new(
        token,
        email.to_string(),
        first_name.to_string(),
        last_name.to_string(),
    ))
}
