//! Account calls. Tokens are returned to the caller and never stored.

use loppis_common::listing::UserId;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::service::ListingService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub city: String,
}

/// Reply to `POST /auth/register`. The verification token is what
/// `verify_email` expects when no mail is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub msg: String,
    #[serde(default)]
    pub verification_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "bearer".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerification {
    pub email: String,
    pub token: String,
}

/// The account as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

impl ListingService {
    /// `POST /auth/register`.
    pub async fn register(&self, registration: &Registration) -> Result<RegistrationReceipt, ServiceError> {
        let path = "/auth/register";
        self.send_json(self.http().post(self.url(path)).json(registration), path)
            .await
    }

    /// `POST /auth/login`.
    pub async fn login(&self, credentials: &Credentials) -> Result<AccessToken, ServiceError> {
        let path = "/auth/login";
        self.send_json(self.http().post(self.url(path)).json(credentials), path)
            .await
    }

    /// `GET /auth/me` with bearer auth.
    pub async fn me(&self, token: &str) -> Result<UserProfile, ServiceError> {
        let path = "/auth/me";
        self.send_json(self.http().get(self.url(path)).bearer_auth(token), path)
            .await
    }

    /// `POST /auth/verify-email`. The response body is passed through as-is.
    pub async fn verify_email(&self, verification: &EmailVerification) -> Result<serde_json::Value, ServiceError> {
        let path = "/auth/verify-email";
        self.send_json(self.http().post(self.url(path)).json(verification), path)
            .await
    }
}
