//! SpringServe reporting API client

use adrev_common::{AdrevError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://video.springserve.com";

const AUTH_PATH: &str = "/api/v0/auth";
const REPORT_PATH: &str = "/api/v0/report";

/// One report row as returned by the API
pub type ReportRow = Map<String, Value>;

/// Body of a report request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: String,
    pub dimensions: Vec<String>,
}

impl ReportRequest {
    /// Daily report over `[start_date, end_date]`
    pub fn daily(start_date: NaiveDate, end_date: NaiveDate, dimensions: Vec<String>) -> Self {
        Self {
            start_date,
            end_date,
            interval: "day".to_string(),
            dimensions,
        }
    }
}

/// Anything that can answer a report request
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_report(&self, request: &ReportRequest) -> Result<Vec<ReportRow>>;
}

#[derive(Clone)]
pub struct SpringServeCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SpringServeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpringServeCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

/// HTTP client for the SpringServe API
///
/// Each report fetch authenticates first; tokens are not cached across runs.
#[derive(Debug, Clone)]
pub struct SpringServeClient {
    http: reqwest::Client,
    base_url: String,
    credentials: SpringServeCredentials,
}

impl SpringServeClient {
    pub fn new(base_url: impl Into<String>, credentials: SpringServeCredentials) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, credentials)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        credentials: SpringServeCredentials,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Exchange the configured credentials for an API token
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, AUTH_PATH))
            .json(&AuthRequest {
                email: &self.credentials.email,
                password: &self.credentials.password,
            })
            .send()
            .await
            .map_err(|e| AdrevError::transport(format!("SpringServe auth request failed: {}", e)))?;

        let response = error_for_status(response, "auth").await?;
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| AdrevError::decode(format!("SpringServe auth response: {}", e)))?;

        debug!("Authenticated with SpringServe");
        Ok(auth.token)
    }
}

#[async_trait]
impl ReportSource for SpringServeClient {
    #[instrument(skip(self, request), fields(start = %request.start_date, end = %request.end_date))]
    async fn fetch_report(&self, request: &ReportRequest) -> Result<Vec<ReportRow>> {
        let token = self.authenticate().await?;

        let response = self
            .http
            .post(format!("{}{}", self.base_url, REPORT_PATH))
            .header(reqwest::header::AUTHORIZATION, token)
            .json(request)
            .send()
            .await
            .map_err(|e| AdrevError::transport(format!("SpringServe report request failed: {}", e)))?;

        let response = error_for_status(response, "report").await?;
        let rows: Vec<ReportRow> = response
            .json()
            .await
            .map_err(|e| AdrevError::decode(format!("SpringServe report is not a row array: {}", e)))?;

        debug!(rows = rows.len(), "Fetched SpringServe report");
        Ok(rows)
    }
}

async fn error_for_status(response: reqwest::Response, call: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AdrevError::transport(format!(
        "SpringServe {} returned {}: {}",
        call, status, body
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_request_body() {
        let request = ReportRequest::daily(
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            vec!["supply_tag_id".into(), "venue_id".into()],
        );

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "start_date": "2024-03-08",
                "end_date": "2024-03-14",
                "interval": "day",
                "dimensions": ["supply_tag_id", "venue_id"],
            })
        );
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = SpringServeCredentials {
            email: "ops@adrev.example".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("ops@adrev.example"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SpringServeClient::new(
            "https://video.springserve.com/",
            SpringServeCredentials {
                email: String::new(),
                password: String::new(),
            },
        );
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }
}
