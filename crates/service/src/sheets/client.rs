use std::time::Duration;

use async_trait::async_trait;
use models::{PriceCategory, PriceItem};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

use super::credentials::ServiceAccountCredentials;
use super::{category_range, PriceSource};
use crate::errors::PriceError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh the access token this long before Google expires it.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct BatchGetResponse {
    #[serde(rename = "valueRanges")]
    value_ranges: Option<Vec<ValueRange>>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Sheets v4 REST client authenticated as a service account.
///
/// The credentials blob is only parsed when a fetch needs a token, so a
/// missing blob surfaces as [`PriceError::Config`] on first use and before
/// any request leaves the process.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    credentials: Option<String>,
    token: Mutex<Option<AccessToken>>,
}

impl GoogleSheetsClient {
    pub fn new(
        api_base: &str,
        spreadsheet_id: &str,
        credentials: Option<String>,
        connect_timeout: Duration,
    ) -> Result<Self, PriceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(PriceError::upstream)?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            credentials,
            token: Mutex::new(None),
        })
    }

    /// `{api_base}/v4/spreadsheets/{id}/values:batchGet`, id encoded as one segment.
    fn batch_get_url(&self) -> Result<Url, PriceError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| PriceError::Config(format!("invalid sheets api_base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| PriceError::Config(format!("sheets api_base cannot be a base: {}", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values:batchGet"]);
        Ok(url)
    }

    async fn access_token(&self, creds: &ServiceAccountCredentials) -> Result<String, PriceError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let assertion = creds.assertion(chrono::Utc::now().timestamp())?;
        let resp = self
            .http
            .post(&creds.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PriceError::Upstream(format!("token request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PriceError::Upstream(format!("token endpoint returned {status}: {body}")));
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| PriceError::Upstream(format!("malformed token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        debug!(expires_in = token.expires_in, "obtained spreadsheet access token");
        let value = token.access_token.clone();
        *cached = Some(AccessToken { value: token.access_token, expires_at: Instant::now() + lifetime });
        Ok(value)
    }
}

#[async_trait]
impl PriceSource for GoogleSheetsClient {
    #[instrument(skip(self, categories), fields(spreadsheet_id = %self.spreadsheet_id, categories = categories.len()))]
    async fn fetch_categories(&self, categories: &[String]) -> Result<PriceCategory, PriceError> {
        let creds = ServiceAccountCredentials::parse(self.credentials.as_deref())?;
        let token = self.access_token(&creds).await?;

        let url = self.batch_get_url()?;
        let ranges: Vec<(&str, String)> = categories.iter().map(|c| ("ranges", category_range(c))).collect();
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&ranges)
            .send()
            .await
            .map_err(|e| PriceError::Upstream(format!("batchGet request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PriceError::Upstream(format!("batchGet returned {status}: {body}")));
        }
        let batch: BatchGetResponse = resp
            .json()
            .await
            .map_err(|e| PriceError::Upstream(format!("malformed batchGet response: {e}")))?;
        into_categories(categories, batch)
    }
}

/// Pair each returned value range with the category it was requested for.
fn into_categories(categories: &[String], batch: BatchGetResponse) -> Result<PriceCategory, PriceError> {
    let ranges = batch
        .value_ranges
        .ok_or_else(|| PriceError::Upstream("batchGet response has no valueRanges".into()))?;
    if ranges.len() != categories.len() {
        return Err(PriceError::Upstream(format!(
            "batchGet returned {} ranges for {} categories",
            ranges.len(),
            categories.len()
        )));
    }
    Ok(categories
        .iter()
        .zip(ranges)
        .map(|(name, range)| {
            let items = range.values.iter().map(|row| PriceItem::from_row(row)).collect();
            (name.clone(), items)
        })
        .collect())
}
