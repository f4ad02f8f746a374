use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::store::{Rows, SheetStore, SheetsError};
use crate::config::SheetsConfig;

/// `SheetStore` over the Google Sheets v4 `values` API.
///
/// Each call is a single HTTP request; nothing is cached between calls.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    base: Url,
    spreadsheet_id: String,
    access_token: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Rows,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig) -> Result<Self, SheetsError> {
        if config.spreadsheet_id.is_empty() {
            return Err(SheetsError::ConfigMissing("SHEETS_SPREADSHEET_ID"));
        }

        // Trailing slash so that joined segments extend the path instead of replacing it
        let base = Url::parse(&format!("{}/", config.api_base.trim_end_matches('/')))
            .map_err(|_| SheetsError::ConfigMissing("SHEETS_API_BASE"))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base,
            spreadsheet_id: config.spreadsheet_id.clone(),
            access_token: config.access_token.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// `{base}/spreadsheets/{id}/values/{range}{suffix}` with the range
    /// percent-encoded as a single path segment.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetsError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidRange(range.to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    fn spreadsheet_url(&self) -> Result<Url, SheetsError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::ConfigMissing("SHEETS_API_BASE"))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str()]);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SheetsError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body
                }
            });

        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// The API returns numbers and booleans unquoted when a cell holds one
fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn read(&self, range: &str) -> Result<Rows, SheetsError> {
        debug!("sheets read {}", range);
        let url = self.values_url(range, "")?;
        let response = self.send(self.http.get(url)).await?;
        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::Decode(e.to_string()))?;

        Ok(value_range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn write(&self, range: &str, rows: Rows) -> Result<(), SheetsError> {
        debug!("sheets write {} ({} rows)", range, rows.len());
        let url = self.values_url(range, "")?;
        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values: rows,
        };
        let request = self
            .http
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    async fn append(&self, range: &str, rows: Rows) -> Result<(), SheetsError> {
        debug!("sheets append {} ({} rows)", range, rows.len());
        let url = self.values_url(range, ":append")?;
        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values: rows,
        };
        let request = self
            .http
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    async fn clear(&self, range: &str) -> Result<(), SheetsError> {
        debug!("sheets clear {}", range);
        let url = self.values_url(range, ":clear")?;
        let request = self.http.post(url).json(&serde_json::json!({}));
        self.send(request).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), SheetsError> {
        let url = self.spreadsheet_url()?;
        let request = self.http.get(url).query(&[("fields", "spreadsheetId")]);
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SheetsClient {
        let config = SheetsConfig {
            spreadsheet_id: "abc123".to_string(),
            api_base: base.to_string(),
            ..SheetsConfig::default()
        };
        SheetsClient::new(&config).unwrap()
    }

    #[test]
    fn builds_values_urls() {
        let client = client("https://sheets.googleapis.com/v4");
        let url = client.values_url("Products!A2:F", "").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Products!A2:F"
        );

        let url = client.values_url("'My Tab'!A2:B", ":append").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'My%20Tab'!A2:B:append"
        );
    }

    #[test]
    fn requires_spreadsheet_id() {
        let config = SheetsConfig::default();
        assert!(matches!(
            SheetsClient::new(&config),
            Err(SheetsError::ConfigMissing("SHEETS_SPREADSHEET_ID"))
        ));
    }

    #[test]
    fn normalizes_cell_values() {
        assert_eq!(cell_to_string(serde_json::json!("x")), "x");
        assert_eq!(cell_to_string(serde_json::json!(3.5)), "3.5");
        assert_eq!(cell_to_string(serde_json::json!(true)), "true");
        assert_eq!(cell_to_string(Value::Null), "");
    }
}
