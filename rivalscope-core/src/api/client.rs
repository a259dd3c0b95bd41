//! HTTP client for the competitor-intelligence backend
//!
//! One method per backend endpoint, all async. Error mapping is uniform:
//! transport problems surface as [`Error::Http`], non-2xx responses as
//! [`Error::Api`] with the server's message, and well-formed responses that
//! fail to parse as [`Error::Json`]. Lookups return `Ok(None)` on 404.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::*;

/// HTTP client for the backend API
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;
        Self::with_base_url(&config.base_url(), config.timeout_secs)
    }

    /// Create a client pinned to an explicit base URL, bypassing the
    /// environment override. Trailing slashes are trimmed.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// The base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ============================================
    // Health
    // ============================================

    /// Check if the backend is reachable. Never errors: an unreachable
    /// backend is `Ok(false)`.
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/healthz", self.base_url);

        match self.http_client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    // ============================================
    // Watchlist
    // ============================================

    /// List every watched company
    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        let url = format!("{}/vendors", self.base_url);
        let response = self.http_client.get(&url).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Get a single company. Returns None if the backend doesn't know it.
    pub async fn get_company(&self, id: &str) -> Result<Option<Company>> {
        let url = format!("{}/vendors/{}", self.base_url, urlencoding::encode(id));
        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(Some(parse_json(response).await?))
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(api_error(response).await)
        }
    }

    /// Add a company to the watchlist
    pub async fn watch_company(&self, request: &WatchCompanyRequest) -> Result<Company> {
        let url = format!("{}/vendors/watch", self.base_url);
        let response = self.http_client.post(&url).json(request).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Update a watched company's fields
    pub async fn update_company(
        &self,
        id: &str,
        request: &UpdateCompanyRequest,
    ) -> Result<Company> {
        let url = format!("{}/vendors/{}", self.base_url, urlencoding::encode(id));
        let response = self.http_client.put(&url).json(request).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Search for companies to add, by free-text query
    pub async fn search_companies(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = format!("{}/companies/search", self.base_url);
        let request = SearchRequest { query };
        let response = self.http_client.post(&url).json(&request).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    // ============================================
    // Signals
    // ============================================

    /// List stored signals, optionally narrowed to one company
    pub async fn list_signals(&self, company_id: Option<&str>) -> Result<Vec<Signal>> {
        let url = match company_id {
            Some(id) => format!(
                "{}/signals?company_id={}",
                self.base_url,
                urlencoding::encode(id)
            ),
            None => format!("{}/signals", self.base_url),
        };
        let response = self.http_client.get(&url).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Run signal detection for one company. Expensive: the backend crawls.
    pub async fn detect_signals(&self, request: &SignalDetectRequest) -> Result<Vec<Signal>> {
        let url = format!("{}/signals/detect", self.base_url);
        let response = self.http_client.post(&url).json(request).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Mute a signal so it stops appearing in lists
    pub async fn mute_signal(&self, id: &str) -> Result<()> {
        let url = format!("{}/signals/{}/mute", self.base_url, urlencoding::encode(id));
        let response = self.http_client.post(&url).send().await?;

        if response.status().is_success() {
            let _: serde_json::Value = parse_json(response).await?;
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }

    /// Attach a follow-up task to a signal
    pub async fn create_follow_up(&self, id: &str, task_description: &str) -> Result<()> {
        let url = format!(
            "{}/signals/{}/follow-up",
            self.base_url,
            urlencoding::encode(id)
        );
        let request = FollowUpRequest { task_description };
        let response = self.http_client.post(&url).json(&request).send().await?;

        if response.status().is_success() {
            let _: serde_json::Value = parse_json(response).await?;
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }

    // ============================================
    // Detection runs
    // ============================================

    /// Run detection across the watchlist (or a subset). One backend call
    /// regardless of how many companies are covered.
    pub async fn run_watchlist(
        &self,
        company_ids: Option<&[String]>,
    ) -> Result<Vec<WatchlistRunResult>> {
        let url = format!("{}/run/watchlist", self.base_url);
        let request = RunWatchlistRequest { company_ids };
        let response = self.http_client.post(&url).json(&request).send().await?;

        if response.status().is_success() {
            let parsed: RunWatchlistResponse = parse_json(response).await?;
            Ok(parsed.results)
        } else {
            Err(api_error(response).await)
        }
    }

    // ============================================
    // Tear-sheets
    // ============================================

    /// Get the generated tear-sheet for a company. Returns None when the
    /// backend hasn't generated one yet.
    pub async fn get_tearsheet(&self, company_id: &str) -> Result<Option<TearSheet>> {
        let url = format!(
            "{}/tearsheet/{}",
            self.base_url,
            urlencoding::encode(company_id)
        );
        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(Some(parse_json(response).await?))
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Err(api_error(response).await)
        }
    }

    // ============================================
    // Reports
    // ============================================

    /// List generated reports, newest first
    pub async fn list_reports(&self) -> Result<Vec<Report>> {
        let url = format!("{}/reports", self.base_url);
        let response = self.http_client.get(&url).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Generate a weekly report covering the trailing seven days
    pub async fn generate_weekly_report(&self) -> Result<Report> {
        let url = format!("{}/reports/weekly", self.base_url);
        let period_end = Utc::now();
        let request = WeeklyReportRequest {
            period_start: period_end - chrono::Duration::days(7),
            period_end,
        };
        let response = self.http_client.post(&url).json(&request).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    // ============================================
    // Dashboard
    // ============================================

    /// Aggregated activity metrics per company, for the dashboard matrix
    pub async fn company_activity(&self) -> Result<Vec<ActivityRow>> {
        let url = format!("{}/companies/activity", self.base_url);
        let response = self.http_client.get(&url).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    // ============================================
    // Settings and sources
    // ============================================

    /// Fetch server-side settings
    pub async fn get_settings(&self) -> Result<ServerSettings> {
        let url = format!("{}/settings/configuration", self.base_url);
        let response = self.http_client.get(&url).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Save server-side settings; the backend echoes the stored blob
    pub async fn save_settings(&self, settings: &ServerSettings) -> Result<ServerSettings> {
        let url = format!("{}/settings/configuration", self.base_url);
        let response = self.http_client.post(&url).json(settings).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Fetch the crawler source configuration
    pub async fn get_sources(&self) -> Result<SourcesConfig> {
        let url = format!("{}/sources/configuration", self.base_url);
        let response = self.http_client.get(&url).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }

    /// Save the crawler source configuration
    pub async fn save_sources(&self, sources: &SourcesConfig) -> Result<SourcesConfig> {
        let url = format!("{}/sources/configuration", self.base_url);
        let response = self.http_client.post(&url).json(sources).send().await?;

        if response.status().is_success() {
            parse_json(response).await
        } else {
            Err(api_error(response).await)
        }
    }
}

/// Parse a successful response body, distinguishing transport failures
/// from shape mismatches.
async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown".to_string());
    Error::Api { status, message }
}

/// Request body for POST /companies/search
#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

/// Request body for POST /signals/{id}/follow-up
#[derive(Serialize)]
struct FollowUpRequest<'a> {
    task_description: &'a str,
}

/// Request body for POST /reports/weekly
#[derive(Serialize)]
struct WeeklyReportRequest {
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
}

/// Request body for POST /run/watchlist
#[derive(Serialize)]
struct RunWatchlistRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    company_ids: Option<&'a [String]>,
}

/// Response from POST /run/watchlist
#[derive(Deserialize)]
struct RunWatchlistResponse {
    results: Vec<WatchlistRunResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_invalid_url() {
        let config = ApiConfig {
            base_url: "localhost:8000".to_string(),
            timeout_secs: 30,
        };
        assert!(ApiClient::new(&config).is_err());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ApiClient::with_base_url("http://localhost:8000/", 30).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_with_default_config() {
        let config = ApiConfig::default();
        assert!(ApiClient::new(&config).is_ok());
    }
}
