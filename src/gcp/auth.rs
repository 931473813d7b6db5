//! # GCP Authentication
//!
//! Authentication with Google Cloud Platform using the OAuth 2.0 flow for
//! service accounts: a short-lived JWT asserting the service account's
//! identity is signed with its private key and exchanged at the Google token
//! endpoint for a bearer access token.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::gcp::HTTP;
use crate::gcp::types::{AccessToken, ServiceAccount};

/// The Google OAuth2 token endpoint.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// API scope requested for the access token.
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Claims in the JSON Web Token (JWT) used for authentication.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The issuer of the token (the service account's email address).
    iss: String,
    /// The scope of the requested permissions.
    scope: String,
    /// The audience for the token (the token endpoint URL).
    aud: String,
    /// The expiration time of the token (Unix timestamp).
    exp: u64,
    /// The time the token was issued (Unix timestamp).
    iat: u64,
}

/// Resolves the service-account key file location: the explicit path when
/// given, otherwise the `GOOGLE_APPLICATION_CREDENTIALS` environment variable.
pub fn credentials_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(std::env::var("GOOGLE_APPLICATION_CREDENTIALS")
            .context("no credentials path given and GOOGLE_APPLICATION_CREDENTIALS not set")?
            .into()),
    }
}

/// Loads a service-account key file (see [`credentials_path`]).
pub fn load_service_account(path: Option<&Path>) -> Result<ServiceAccount> {
    let path = credentials_path(path)?;
    let body = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read service account key {}", path.display()))?;
    let service_account: ServiceAccount =
        serde_json::from_str(&body).context("Invalid service account key file")?;
    Ok(service_account)
}

/// Fetches a GCP access token for the service account.
///
/// This performs the server-to-server OAuth 2.0 flow:
/// 1. Creates a JWT with claims asserting the service account's identity
///    and the requested API scope.
/// 2. Signs the JWT using the service account's private key (RS256).
/// 3. Sends the signed JWT to the Google OAuth2 token endpoint.
/// 4. Receives an access token in exchange.
///
/// # Returns
/// A `Result` containing the access token string if successful.
pub async fn access_token(service_account: &ServiceAccount) -> Result<String> {
    // 1. Create the JWT claims.
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();
    let exp = now + 3600; // Token is valid for 1 hour.

    let claims = Claims {
        iss: service_account.client_email.clone(),
        scope: CLOUD_PLATFORM_SCOPE.to_string(),
        aud: TOKEN_URL.to_string(),
        exp,
        iat: now,
    };

    // 2. Sign the JWT.
    let header = Header::new(Algorithm::RS256);
    let encoding_key = EncodingKey::from_rsa_pem(service_account.private_key.as_bytes())?;
    let jwt = encode(&header, &claims, &encoding_key)?;

    // 3. Exchange the JWT for an access token.
    let params = [
        ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
        ("assertion", jwt.as_str()),
    ];

    let response = HTTP.post(TOKEN_URL).form(&params).send().await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(anyhow::anyhow!(
            "Failed to get access token: {}",
            error_text
        ));
    }

    // 4. Parse the response and return the token.
    let token_response: AccessToken = response.json().await?;
    Ok(token_response.access_token)
}
