//! Client-credentials token exchange for the sensor API
//!
//! A fresh token is requested for every reconciliation run. Tokens are never
//! cached or written anywhere.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::SensorConfig;

use super::error::AuthError;

/// A short-lived bearer token and the client it was issued to
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub client_id: String,
}

impl Credential {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange client id and secret for a bearer token
#[instrument(skip_all, fields(client_id = %config.client_id))]
pub async fn acquire(
    client: &reqwest::Client,
    config: &SensorConfig,
) -> Result<Credential, AuthError> {
    let request = TokenRequest {
        grant_type: "client_credentials",
        client_id: &config.client_id,
        client_secret: &config.client_secret,
    };

    let response = client.post(&config.auth_url).json(&request).send().await?;

    if !response.status().is_success() {
        return Err(AuthError::Status(response.status().as_u16()));
    }

    let body = response.text().await?;
    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|e| AuthError::Decode(e.to_string()))?;

    debug!("acquired access token");

    Ok(Credential {
        access_token: token.access_token,
        client_id: config.client_id.clone(),
    })
}
