//! Bearer token acquisition.
//!
//! Interactive runs use the OAuth 2.0 device authorization grant against the
//! Microsoft identity platform with a public client id. A pre-issued token can
//! be supplied instead, which skips the identity provider entirely.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::AccessToken;

/// Capability requested for every run.
pub const MAIL_READ_SCOPE: &str = "Mail.Read";

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire_token(&self, scopes: &[&str]) -> Result<AccessToken>;
}

/// A token obtained out of band.
#[derive(Debug, Clone)]
pub struct StaticToken(AccessToken);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(AccessToken::new(token))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn acquire_token(&self, _scopes: &[&str]) -> Result<AccessToken> {
        if self.0.secret().trim().is_empty() {
            return Err(Error::Auth("access token is empty".into()));
        }
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
    message: Option<String>,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeviceCodeFlow {
    client: reqwest::Client,
    authority: String,
    tenant: String,
    client_id: String,
}

impl DeviceCodeFlow {
    pub fn new(
        authority: impl Into<String>,
        tenant: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            authority: authority.into(),
            tenant: tenant.into(),
            client_id: client_id.into(),
        }
    }

    fn endpoint(&self, leaf: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/{}",
            self.authority.trim_end_matches('/'),
            self.tenant,
            leaf
        )
    }

    async fn request_device_code(&self, scope: &str) -> Result<DeviceCodeResponse> {
        let resp = self
            .client
            .post(self.endpoint("devicecode"))
            .form(&[("client_id", self.client_id.as_str()), ("scope", scope)])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("device code request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Auth(format!("read device code response: {e}")))?;
        if !status.is_success() {
            return Err(Error::Auth(describe_failure(status.as_u16(), &body)));
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::Auth(format!("decode device code response: {e}")))
    }

    /// One poll of the token endpoint. `Ok(None)` while the user has not finished.
    async fn poll_token(
        &self,
        device_code: &str,
        interval: &mut Duration,
    ) -> Result<Option<AccessToken>> {
        let resp = self
            .client
            .post(self.endpoint("token"))
            .form(&[
                ("grant_type", DEVICE_CODE_GRANT),
                ("client_id", self.client_id.as_str()),
                ("device_code", device_code),
            ])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("token request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Auth(format!("read token response: {e}")))?;

        if status.is_success() {
            let token: TokenResponse = serde_json::from_str(&body)
                .map_err(|e| Error::Auth(format!("decode token response: {e}")))?;
            return Ok(Some(AccessToken::new(token.access_token)));
        }

        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) if err.error == "authorization_pending" => Ok(None),
            Ok(err) if err.error == "slow_down" => {
                *interval += SLOW_DOWN_STEP;
                Ok(None)
            }
            _ => Err(Error::Auth(describe_failure(status.as_u16(), &body))),
        }
    }
}

#[async_trait]
impl TokenProvider for DeviceCodeFlow {
    async fn acquire_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let scope = scopes.join(" ");
        let code = self.request_device_code(&scope).await?;

        match &code.message {
            Some(message) => println!("{message}"),
            None => println!(
                "To sign in, open {} and enter the code {}",
                code.verification_uri, code.user_code
            ),
        }

        let deadline = Instant::now() + Duration::from_secs(code.expires_in);
        let mut interval = Duration::from_secs(code.interval);
        loop {
            if let Some(token) = self.poll_token(&code.device_code, &mut interval).await? {
                info!(scope = %scope, "Signed in");
                return Ok(token);
            }
            if Instant::now() + interval >= deadline {
                return Err(Error::Auth("device code expired before sign-in completed".into()));
            }
            debug!(wait_s = interval.as_secs(), "Waiting for device sign-in");
            sleep(interval).await;
        }
    }
}

fn describe_failure(status: u16, body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{} (HTTP {status}): {description}", err.error),
            None => format!("{} (HTTP {status})", err.error),
        },
        Err(_) => format!("identity provider returned HTTP {status}"),
    }
}
