//! Service-account authorization (OAuth 2.0 JWT-bearer grant).
//!
//! The key file is the JSON downloaded from the cloud console. A short-lived
//! RS256 assertion is signed with its private key and exchanged at `token_uri`
//! for a bearer token.
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    token_type: String,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn issued(resp: TokenResponse, requested_at: DateTime<Utc>) -> Self {
        Self {
            token: resp.access_token,
            expires_at: requested_at + Duration::seconds(resp.expires_in),
        }
    }
}

pub fn load_key(path: &Path) -> Result<ServiceAccountKey> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading service account key {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing service account key {}", path.display()))
}

fn claims(key: &ServiceAccountKey, scopes: &[&str], now: DateTime<Utc>) -> Claims {
    Claims {
        iss: key.client_email.clone(),
        scope: scopes.join(" "),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
    }
}

/// Sign the JWT assertion presented to the token endpoint.
pub fn build_assertion(
    key: &ServiceAccountKey,
    scopes: &[&str],
    now: DateTime<Utc>,
) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let enc_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .context("service account private_key is not an RSA PEM key")?;
    encode(&header, &claims(key, scopes, now), &enc_key).context("encode JWT assertion")
}

/// Exchange a signed assertion for a bearer token. One attempt, no retry.
pub async fn fetch_access_token(
    http: &Client,
    key: &ServiceAccountKey,
    scopes: &[&str],
) -> Result<AccessToken> {
    let now = Utc::now();
    let assertion = build_assertion(key, scopes, now)?;

    debug!(
        client_email = %key.client_email,
        token_uri = %key.token_uri,
        scopes = scopes.len(),
        "sheets::auth: requesting access token"
    );

    let resp = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .context("sending token request")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("token endpoint rejected service account: {} - {}", status, body);
    }

    let token = resp
        .json::<TokenResponse>()
        .await
        .context("parsing token response")?;

    info!(
        token_type = %token.token_type,
        expires_in = token.expires_in,
        "sheets::auth: token acquired"
    );

    Ok(AccessToken::issued(token, now))
}
