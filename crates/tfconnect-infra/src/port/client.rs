//! Status reporting client for the upstream action API.
//!
//! Authenticates with client credentials, caches the access token, and
//! patches action runs with their final status. A 401 on a status patch
//! triggers one re-authentication and a single retry.
//!
//! Credentials and the access token are held as [`SecretString`] and are
//! only exposed when building request bodies and headers.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use tfconnect_core::report::StatusReporter;
use tfconnect_types::config::PortConfig;
use tfconnect_types::error::{ConfigError, ReportError};
use tfconnect_types::state::ActionStatus;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct RunStatusPatch {
    status: ActionStatus,
}

/// Outcome of one PATCH attempt.
enum PatchAttempt {
    Done,
    Unauthorized,
}

/// HTTP client for the upstream action API.
pub struct PortClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    client_id: String,
    client_secret: SecretString,
    token: RwLock<Option<SecretString>>,
}

// No Debug derive: keeps credentials and the cached token out of logs.

impl PortClient {
    /// Build a client from configuration; both credentials are required.
    pub fn new(config: &PortConfig) -> Result<Self, ConfigError> {
        let client_id = config
            .client_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(ConfigError::Missing("PORT_CLIENT_ID"))?;
        let client_secret = config
            .client_secret
            .clone()
            .filter(|s| !s.expose_secret().trim().is_empty())
            .ok_or(ConfigError::Missing("PORT_CLIENT_SECRET"))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tfconnect/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid {
                key: "port",
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let base_url = reqwest::Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::Invalid {
                key: "port.base_url",
                reason: format!("'{}' is not an absolute http(s) URL", config.base_url),
            })?;

        Ok(Self {
            http,
            base_url,
            client_id,
            client_secret,
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `base_url` extended by `segments`, each percent-encoded as one
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, ReportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ReportError::Transport(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// The client secret, for webhook signature verification.
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// Exchange the client credentials for an access token and cache it.
    pub async fn authenticate(&self) -> Result<(), ReportError> {
        let url = self.endpoint(&["v1", "auth", "access_token"])?;
        let body = AccessTokenRequest {
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret(),
        };

        let response = self
            .http
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Transport(format!("POST {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ReportError::Authentication(format!("HTTP {status}: {error_body}")));
        }

        let parsed: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| ReportError::Authentication(format!("bad token response: {e}")))?;

        *self.token.write().await = Some(SecretString::from(parsed.access_token));
        tracing::debug!(base_url = %self.base_url, "authenticated with status endpoint");
        Ok(())
    }

    /// Set the final status of an action run.
    pub async fn patch_run_status(
        &self,
        run_id: &str,
        status: ActionStatus,
    ) -> Result<(), ReportError> {
        if self.token.read().await.is_none() {
            self.authenticate().await?;
        }

        match self.try_patch(run_id, status).await? {
            PatchAttempt::Done => Ok(()),
            PatchAttempt::Unauthorized => {
                tracing::debug!(run_id = %run_id, "access token rejected, re-authenticating");
                self.authenticate().await?;
                match self.try_patch(run_id, status).await? {
                    PatchAttempt::Done => Ok(()),
                    PatchAttempt::Unauthorized => Err(ReportError::Authentication(
                        "access token rejected after refresh".to_string(),
                    )),
                }
            }
        }
    }

    async fn try_patch(&self, run_id: &str, status: ActionStatus) -> Result<PatchAttempt, ReportError> {
        let url = self.endpoint(&["v1", "actions", "runs", run_id])?;
        let token = self
            .token
            .read()
            .await
            .as_ref()
            .map(|t| t.expose_secret().to_string())
            .unwrap_or_default();

        let response = self
            .http
            .patch(url.clone())
            .bearer_auth(token)
            .json(&RunStatusPatch { status })
            .send()
            .await
            .map_err(|e| ReportError::Transport(format!("PATCH {url}: {e}")))?;

        let code = response.status();
        if code == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(PatchAttempt::Unauthorized);
        }
        if !code.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Rejected {
                status: code.as_u16(),
                body,
            });
        }
        Ok(PatchAttempt::Done)
    }
}

impl StatusReporter for PortClient {
    async fn report(&self, run_id: &str, status: ActionStatus) -> Result<(), ReportError> {
        self.patch_run_status(run_id, status).await
    }
}
