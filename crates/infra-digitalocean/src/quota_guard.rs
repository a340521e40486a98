// DigitalOcean quota guard
// reason: reqwest with per-request timeouts, the check sits on the submission path

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use tfdeploy_core::domain::Credential;
use tfdeploy_core::port::{QuotaDecision, QuotaError, QuotaGuard};

use crate::types::{AccountResponse, DropletsPage};

pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";

/// Upper bound on followed pagination links
pub const MAX_PAGES: usize = 100;

const PAGE_SIZE: u32 = 200;

/// Compares the account's droplet count against its droplet limit
pub struct DigitalOceanQuotaGuard {
    client: Client,
    base_url: String,
}

impl DigitalOceanQuotaGuard {
    /// Build a guard against `base_url` (the public API unless overridden in tests).
    ///
    /// `timeout` bounds both connecting and each whole request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QuotaError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| QuotaError::Network(format!("failed to build HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(&self.base_url)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        credential: &Credential,
    ) -> Result<T, QuotaError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| QuotaError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match status {
                StatusCode::UNAUTHORIZED => "token rejected".to_string(),
                _ => response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string()),
            };
            return Err(QuotaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                QuotaError::Malformed(e.without_url().to_string())
            } else {
                QuotaError::Network(e.without_url().to_string())
            }
        })
    }

    async fn droplet_limit(&self, credential: &Credential) -> Result<u64, QuotaError> {
        let url = format!("{}/v2/account", self.base_url);
        let body: AccountResponse = self.get_json(&url, credential).await?;
        Ok(body.account.droplet_limit)
    }

    /// Count droplets across every result page
    async fn droplet_count(&self, credential: &Credential) -> Result<u64, QuotaError> {
        let mut url = format!("{}/v2/droplets?per_page={}", self.base_url, PAGE_SIZE);
        let mut total = 0u64;

        for page in 1..=MAX_PAGES {
            let body: DropletsPage = self.get_json(&url, credential).await?;
            total += body.droplets.len() as u64;

            match body.next_url() {
                None => {
                    debug!(pages = %page, droplets = %total, "Droplet enumeration complete");
                    return Ok(total);
                }
                // The bearer token follows the link, so it must stay on our API host
                Some(next) if self.is_api_url(next) => url = next.to_string(),
                Some(_) => {
                    return Err(QuotaError::Malformed(
                        "pagination link points outside the API".to_string(),
                    ))
                }
            }
        }

        Err(QuotaError::Malformed(format!(
            "pagination exceeded {} pages",
            MAX_PAGES
        )))
    }
}

#[async_trait]
impl QuotaGuard for DigitalOceanQuotaGuard {
    async fn check(&self, credential: &Credential) -> Result<QuotaDecision, QuotaError> {
        let limit = self.droplet_limit(credential).await?;
        let usage = self.droplet_count(credential).await?;
        debug!(usage = %usage, limit = %limit, "Droplet quota fetched");
        Ok(QuotaDecision::evaluate(usage, limit))
    }
}
