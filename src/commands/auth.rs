use crate::api::{ApiClient, NO_QUERY};
use crate::error::{GestionaleError, GestionaleResult};
use crate::state::{SessionState, UserProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub ragione_sociale: String,
    pub partita_iva: String,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default = "crate::models::default_true")]
    success: bool,
    token: Option<String>,
    user: Option<UserProfile>,
    message: Option<String>,
}

impl AuthResponse {
    fn into_session(self) -> GestionaleResult<SessionState> {
        if !self.success {
            return Err(GestionaleError::Auth(self.message.unwrap_or_default()));
        }
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GestionaleError::MissingData("token".to_string()))?;
        let user = self
            .user
            .ok_or_else(|| GestionaleError::MissingData("user".to_string()))?;
        Ok(SessionState::new(token, user))
    }
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: Option<String>,
    pub database: Option<String>,
}

fn require(value: &str, message: &str) -> GestionaleResult<()> {
    if value.trim().is_empty() {
        return Err(GestionaleError::Validation(message.to_string()));
    }
    Ok(())
}

pub async fn login(client: &ApiClient, email: &str, password: &str) -> GestionaleResult<SessionState> {
    require(email, "Inserisci email")?;
    require(password, "Inserisci password")?;

    let request = LoginRequest {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    let response: AuthResponse = client.post_json("/api/auth/login", NO_QUERY, &request).await?;
    let session = response.into_session()?;
    client.replace_session(session.clone())?;

    tracing::info!("Logged in as {}", request.email);
    Ok(session)
}

pub async fn register(client: &ApiClient, request: RegisterRequest) -> GestionaleResult<SessionState> {
    require(&request.email, "Inserisci email")?;
    require(&request.password, "Inserisci password")?;
    require(&request.ragione_sociale, "Inserisci la ragione sociale")?;
    require(&request.partita_iva, "Inserisci la partita IVA")?;

    let response: AuthResponse = client.post_json("/api/auth/register", NO_QUERY, &request).await?;
    let session = response.into_session()?;
    client.replace_session(session.clone())?;

    tracing::info!("Registered {}", request.email);
    Ok(session)
}

pub async fn me(client: &ApiClient) -> GestionaleResult<UserProfile> {
    if client.session()?.bearer().is_none() {
        return Err(GestionaleError::Auth("no active session".to_string()));
    }
    let response: MeResponse = client.get("/api/auth/me", NO_QUERY).await?;
    response
        .user
        .ok_or_else(|| GestionaleError::MissingData("user".to_string()))
}

/// The local session is cleared even when the backend call fails.
pub async fn logout(client: &ApiClient) -> GestionaleResult<()> {
    if client.session()?.bearer().is_some() {
        let result: GestionaleResult<serde_json::Value> =
            client.post_json("/api/auth/logout", NO_QUERY, &serde_json::json!({})).await;
        if let Err(e) = result {
            tracing::warn!("Logout call failed, clearing local session anyway: {}", e);
        }
    }
    client.replace_session(SessionState::default())
}

pub async fn health(client: &ApiClient) -> GestionaleResult<HealthStatus> {
    client.get("/health", NO_QUERY).await
}
