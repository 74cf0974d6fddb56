// src/cloud_handler.rs
use google_sheets4::api::ValueRange;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::data_types::{Row, TableData, TableSpec};
use crate::error::FetchError;
use crate::extract::extract_rows;

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Every read is capped to this range.
const CELL_RANGE: &str = "A1:Z200";

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Reads configured tables from the Google Sheets values API.
#[derive(Debug, Clone)]
pub struct CloudHandler {
    client: Client,
    base_url: String,
}

impl CloudHandler {
    pub fn new() -> Self {
        Self::with_base_url(SHEETS_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        CloudHandler {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches each table in `schema` order. The first failure aborts the
    /// whole call and nothing fetched so far is returned.
    pub async fn fetch_tables(
        &self,
        source_id: &str,
        credential: &str,
        schema: &[TableSpec],
    ) -> Result<TableData, FetchError> {
        let spreadsheet_id = extract_spreadsheet_id(source_id)?;
        let mut data = TableData::new();

        for spec in schema {
            let rows = self.fetch_table(spreadsheet_id, credential, spec).await?;
            log::info!("Fetched {} rows from sheet '{}'", rows.len(), spec.table_name);
            data.insert(spec.table_name.clone(), rows);
        }

        Ok(data)
    }

    async fn fetch_table(
        &self,
        spreadsheet_id: &str,
        credential: &str,
        spec: &TableSpec,
    ) -> Result<Vec<Row>, FetchError> {
        let url = self.range_url(spreadsheet_id, credential, &spec.table_name)?;
        log::debug!("Reading {}!{}", spec.table_name, CELL_RANGE);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| format!("Failed to fetch sheet: {}", spec.table_name));
            log::warn!(
                "Sheet '{}' returned {}: {}",
                spec.table_name,
                status.as_u16(),
                message
            );
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let range: ValueRange =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode {
                table: spec.table_name.clone(),
                message: e.to_string(),
            })?;

        match range.values {
            Some(values) if !values.is_empty() => Ok(extract_rows(&values, spec)),
            _ => Ok(Vec::new()),
        }
    }

    fn range_url(
        &self,
        spreadsheet_id: &str,
        credential: &str,
        table_name: &str,
    ) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidSource(format!("{}: {}", self.base_url, e)))?;
        let range = format!("{}!{}", table_name, CELL_RANGE);

        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidSource(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range.as_str()]);
        url.query_pairs_mut().append_pair("key", credential);

        Ok(url)
    }
}

impl Default for CloudHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts either a bare spreadsheet id or a full spreadsheet URL.
/// URLs typically look like: https://docs.google.com/spreadsheets/d/[SPREADSHEET_ID]/edit
pub fn extract_spreadsheet_id(source: &str) -> Result<&str, FetchError> {
    let source = source.trim();
    if !source.contains('/') {
        return if source.is_empty() {
            Err(FetchError::InvalidSource("empty spreadsheet id".to_string()))
        } else {
            Ok(source)
        };
    }

    let parts: Vec<&str> = source.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() && !parts[i + 1].is_empty() {
            return Ok(parts[i + 1]);
        }
    }

    Err(FetchError::InvalidSource(source.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::CellValue;
    use httpmock::prelude::*;
    use serde_json::json;

    fn values_path(table: &str) -> String {
        format!("/v4/spreadsheets/sheet123/values/{}!A1:Z200", table)
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        assert_eq!(extract_spreadsheet_id("sheet123").unwrap(), "sheet123");
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/sheet123/edit#gid=0")
                .unwrap(),
            "sheet123"
        );
        assert!(extract_spreadsheet_id("https://example.com/nothing").is_err());
        assert!(extract_spreadsheet_id("  ").is_err());
    }

    #[tokio::test]
    async fn test_fetch_tables_in_schema_order() {
        let server = MockServer::start_async().await;

        let portfolio = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(values_path("Portfolio"))
                    .query_param("key", "secret");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "range": "Portfolio!A1:Z200",
                        "majorDimension": "ROWS",
                        "values": [["Symbol", "Price"], ["AAPL", "185.92"], ["MSFT", "410.34"]]
                    }));
            })
            .await;

        let orders = server
            .mock_async(|when, then| {
                when.method(GET).path(values_path("Orders"));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "range": "Orders!A1:Z200", "majorDimension": "ROWS" }));
            })
            .await;

        let handler = CloudHandler::with_base_url(server.base_url());
        let schema = vec![
            TableSpec::new("Portfolio", &["Symbol"]),
            TableSpec::new("Orders", &[]),
        ];

        let data = handler.fetch_tables("sheet123", "secret", &schema).await.unwrap();

        portfolio.assert_async().await;
        orders.assert_async().await;
        assert_eq!(data["Portfolio"].len(), 2);
        assert_eq!(data["Portfolio"][1].get("Symbol"), Some(CellValue::from("MSFT")));
        assert_eq!(data["Portfolio"][1].get("Price"), None);
        assert!(data["Orders"].is_empty());
    }

    #[tokio::test]
    async fn test_error_message_comes_from_payload() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path(values_path("Orders"));
                then.status(404)
                    .header("content-type", "application/json")
                    .json_body(json!({ "error": { "message": "not found" } }));
            })
            .await;

        let handler = CloudHandler::with_base_url(server.base_url());
        let err = handler
            .fetch_tables("sheet123", "secret", &[TableSpec::new("Orders", &[])])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "not found");
    }

    #[tokio::test]
    async fn test_first_failure_aborts_remaining_tables() {
        let server = MockServer::start_async().await;

        let broken = server
            .mock_async(|when, then| {
                when.method(GET).path(values_path("Portfolio"));
                then.status(500).body("upstream exploded");
            })
            .await;

        let never = server
            .mock_async(|when, then| {
                when.method(GET).path(values_path("Orders"));
                then.status(200).json_body(json!({ "values": [["ID"], ["1"]] }));
            })
            .await;

        let handler = CloudHandler::with_base_url(server.base_url());
        let schema = vec![
            TableSpec::new("Portfolio", &[]),
            TableSpec::new("Orders", &[]),
        ];
        let err = handler.fetch_tables("sheet123", "secret", &schema).await.unwrap_err();

        broken.assert_async().await;
        never.assert_calls_async(0).await;
        assert_eq!(
            err,
            FetchError::Api {
                status: 500,
                message: "Failed to fetch sheet: Portfolio".into()
            }
        );
    }

    #[tokio::test]
    async fn test_failure_after_success_discards_fetched_tables() {
        let server = MockServer::start_async().await;

        let portfolio = server
            .mock_async(|when, then| {
                when.method(GET).path(values_path("Portfolio"));
                then.status(200).json_body(json!({ "values": [["Symbol"], ["AAPL"]] }));
            })
            .await;

        let orders = server
            .mock_async(|when, then| {
                when.method(GET).path(values_path("Orders"));
                then.status(403)
                    .json_body(json!({ "error": { "message": "The caller does not have permission" } }));
            })
            .await;

        let prices = server
            .mock_async(|when, then| {
                when.method(GET).path(values_path("PRICE_DAILY"));
                then.status(200).json_body(json!({ "values": [["Symbol"], ["AAPL"]] }));
            })
            .await;

        let handler = CloudHandler::with_base_url(server.base_url());
        let schema = vec![
            TableSpec::new("Portfolio", &[]),
            TableSpec::new("Orders", &[]),
            TableSpec::new("PRICE_DAILY", &[]),
        ];
        let err = handler.fetch_tables("sheet123", "secret", &schema).await.unwrap_err();

        portfolio.assert_async().await;
        orders.assert_async().await;
        prices.assert_calls_async(0).await;
        assert_eq!(err.to_string(), "The caller does not have permission");
    }

    #[tokio::test]
    async fn test_network_error_hides_credential() {
        // Nothing listens on the discard port.
        let handler = CloudHandler::with_base_url("http://127.0.0.1:9");
        let err = handler
            .fetch_tables("sheet123", "SUPERSECRETKEY", &[TableSpec::new("Orders", &[])])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Network(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{:?}", err).contains("SUPERSECRETKEY"));
    }

    #[tokio::test]
    async fn test_url_source_id_is_normalised() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(values_path("Orders"));
                then.status(200).json_body(json!({ "values": [["ID"], ["1001"]] }));
            })
            .await;

        let handler = CloudHandler::with_base_url(server.base_url());
        let data = handler
            .fetch_tables(
                "https://docs.google.com/spreadsheets/d/sheet123/edit",
                "secret",
                &[TableSpec::new("Orders", &[])],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(data["Orders"].len(), 1);
    }
}
