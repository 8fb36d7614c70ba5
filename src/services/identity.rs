use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Account provisioning with the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account, returning the provider-assigned user id.
    async fn create_user(&self, email: &str, password: &str, name: &str) -> Result<String, IdentityError>;
}

/// Identity provider reached through an HTTP admin endpoint.
pub struct HttpIdentityProvider {
    http: Client,
    endpoint: Option<String>,
    token: Option<String>,
}

#[derive(Serialize)]
struct CreateUserBody<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Deserialize)]
struct CreateUserReply {
    uid: String,
}

impl HttpIdentityProvider {
    pub fn new(endpoint: Option<String>, token: Option<String>) -> Result<Self, IdentityError> {
        let http = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { http, endpoint, token })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn create_user(&self, email: &str, password: &str, name: &str) -> Result<String, IdentityError> {
        let endpoint = self.endpoint.as_deref().ok_or(IdentityError::NotConfigured)?;

        let mut request = self.http.post(endpoint).json(&CreateUserBody {
            email,
            password,
            display_name: name,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::CONFLICT => Err(IdentityError::AlreadyExists(email.to_string())),
            status if !status.is_success() => Err(IdentityError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
            _ => Ok(response.json::<CreateUserReply>().await?.uid),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity provider not configured")]
    NotConfigured,

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity provider returned status {status}: {body}")]
    Status { status: u16, body: String },
}
