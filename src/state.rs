// src/state.rs
use chrono::Utc;

use crate::cloud_handler::CloudHandler;
use crate::data_types::{Settings, TableData, TableSpec, WatchlistEntry};
use crate::error::FetchError;
use crate::sample_data::SAMPLE_DATA;
use crate::store::Store;

/// The only table whose rows make up the watchlist.
pub const MASTER_TABLE: &str = "SYMBOLS_MASTER";
/// Column used as the watchlist entry id.
pub const IDENTITY_COLUMN: &str = "Symbol";

/// Snapshot of what one refresh needs to hit the network.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub source_id: String,
    pub credential: String,
    pub schema: Vec<TableSpec>,
}

/// One watchlist entry per master-table row, or `None` when the master
/// table is absent and the current watchlist should stay as it is.
pub fn derive_watchlist(data: &TableData, added_at: i64) -> Option<Vec<WatchlistEntry>> {
    let rows = data.get(MASTER_TABLE)?;

    Some(
        rows.iter()
            .map(|row| {
                let id = row
                    .get(IDENTITY_COLUMN)
                    .filter(|value| !value.is_blank())
                    .or_else(|| row.first_value())
                    .map(|value| value.to_string())
                    .unwrap_or_default();

                WatchlistEntry {
                    table_name: MASTER_TABLE.to_string(),
                    id,
                    data: row.clone(),
                    added_at,
                }
            })
            .collect(),
    )
}

/// Owns settings, fetched tables and the watchlist.
///
/// Table data is only ever swapped as a whole, and every swap re-derives
/// the watchlist. Refreshes are split into `begin_refresh` and
/// `finish_refresh` so the network call can run outside any borrow; a
/// superseded refresh is not cancelled and the last one to finish wins.
pub struct AppState {
    store: Store,
    settings: Settings,
    watchlist: Vec<WatchlistEntry>,
    table_data: TableData,
    loading: bool,
    error: Option<String>,
    using_fallback: bool,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        let settings = store.load_settings();
        let watchlist = store.load_watchlist();

        let mut state = AppState {
            store,
            settings,
            watchlist,
            table_data: TableData::new(),
            loading: false,
            error: None,
            using_fallback: true,
        };
        state.set_table_data(SAMPLE_DATA.clone());
        state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn watchlist(&self) -> &[WatchlistEntry] {
        &self.watchlist
    }

    pub fn table_data(&self) -> &TableData {
        &self.table_data
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback
    }

    pub fn is_connected(&self) -> bool {
        !self.using_fallback && self.error.is_none()
    }

    /// Replaces and persists the settings, then starts a refresh.
    pub fn apply_settings(&mut self, settings: Settings) -> Option<FetchRequest> {
        self.settings = settings;
        if let Err(e) = self.store.save_settings(&self.settings) {
            log::warn!("Could not persist settings: {}", e);
        }
        self.begin_refresh()
    }

    /// Returns what to fetch, or `None` when settings are incomplete and
    /// the sample data has already been put in place.
    pub fn begin_refresh(&mut self) -> Option<FetchRequest> {
        if !self.settings.is_complete() {
            log::info!("No sheet id or API key configured; showing sample data");
            self.error = None;
            self.using_fallback = true;
            self.set_table_data(SAMPLE_DATA.clone());
            self.loading = false;
            return None;
        }

        self.loading = true;
        self.error = None;
        Some(FetchRequest {
            source_id: self.settings.source_id.clone(),
            credential: self.settings.credential.clone(),
            schema: self.settings.schema.clone(),
        })
    }

    pub fn finish_refresh(&mut self, result: Result<TableData, FetchError>) {
        match result {
            Ok(data) => {
                self.using_fallback = false;
                self.set_table_data(data);
            }
            Err(e) => {
                log::warn!("Refresh failed, falling back to sample data: {}", e);
                self.error = Some(e.to_string());
                self.using_fallback = true;
                self.set_table_data(SAMPLE_DATA.clone());
            }
        }
        self.loading = false;
    }

    pub async fn refresh(&mut self, handler: &CloudHandler) {
        let Some(request) = self.begin_refresh() else {
            return;
        };
        let result = handler
            .fetch_tables(&request.source_id, &request.credential, &request.schema)
            .await;
        self.finish_refresh(result);
    }

    fn set_table_data(&mut self, data: TableData) {
        self.table_data = data;

        if let Some(watchlist) = derive_watchlist(&self.table_data, Utc::now().timestamp_millis()) {
            log::debug!("Watchlist re-derived with {} entries", watchlist.len());
            self.watchlist = watchlist;
            if let Err(e) = self.store.save_watchlist(&self.watchlist) {
                log::warn!("Could not persist watchlist: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{CellValue, Row};
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn row(cells: &[(&str, CellValue)]) -> Row {
        cells.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    fn configured(dir: &TempDir, schema: Vec<TableSpec>) -> AppState {
        let store = Store::new(dir.path());
        store
            .save_settings(&Settings {
                source_id: "sheet123".into(),
                credential: "secret".into(),
                schema,
            })
            .unwrap();
        AppState::new(store)
    }

    #[test]
    fn test_derive_watchlist_one_entry_per_master_row() {
        let mut data = TableData::new();
        data.insert(
            MASTER_TABLE.to_string(),
            vec![
                row(&[("Symbol", "NVDA".into()), ("Name", "NVIDIA".into())]),
                row(&[("Name", "No symbol".into()), ("Sector", "Tech".into())]),
                row(&[("Symbol", "".into()), ("Name", "Blank symbol".into())]),
            ],
        );

        let watchlist = derive_watchlist(&data, 42).unwrap();

        assert_eq!(watchlist.len(), 3);
        assert_eq!(watchlist[0].id, "NVDA");
        assert_eq!(watchlist[1].id, "No symbol");
        assert_eq!(watchlist[2].id, "");
        assert!(watchlist.iter().all(|e| e.table_name == MASTER_TABLE && e.added_at == 42));
        assert_eq!(watchlist[1].data, data[MASTER_TABLE][1]);
    }

    #[test]
    fn test_derive_watchlist_without_master_table() {
        let mut data = TableData::new();
        data.insert("Orders".to_string(), vec![row(&[("ID", "1".into())])]);
        assert!(derive_watchlist(&data, 0).is_none());
    }

    #[test]
    fn test_initial_state_uses_sample_data() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(Store::new(dir.path()));

        assert!(state.is_using_fallback());
        assert!(!state.is_connected());
        assert_eq!(state.table_data(), &*SAMPLE_DATA);
        assert_eq!(state.watchlist().len(), SAMPLE_DATA[MASTER_TABLE].len());
        assert_eq!(state.settings(), &Settings::default());
    }

    #[test]
    fn test_refresh_without_credentials_always_falls_back() {
        let dir = TempDir::new().unwrap();
        let mut state = AppState::new(Store::new(dir.path()));
        state.finish_refresh(Err(FetchError::Network("offline".into())));
        assert_eq!(state.error(), Some("Network error: offline"));

        assert!(state.begin_refresh().is_none());
        assert!(state.is_using_fallback());
        assert!(!state.is_loading());
        assert_eq!(state.error(), None);
        assert_eq!(state.table_data(), &*SAMPLE_DATA);
    }

    #[tokio::test]
    async fn test_refresh_success_replaces_data_and_watchlist() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/sheet123/values/SYMBOLS_MASTER!A1:Z200");
                then.status(200).json_body(json!({
                    "values": [["Symbol", "Name"], ["AMD", "Advanced Micro Devices"], ["INTC", "Intel"]]
                }));
            })
            .await;

        let dir = TempDir::new().unwrap();
        let mut state = configured(&dir, vec![TableSpec::new(MASTER_TABLE, &[])]);
        let handler = CloudHandler::with_base_url(server.base_url());

        state.refresh(&handler).await;

        assert!(!state.is_using_fallback());
        assert!(state.is_connected());
        assert!(!state.is_loading());
        assert_eq!(state.table_data().len(), 1);
        let ids: Vec<&str> = state.watchlist().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["AMD", "INTC"]);

        // Persisted watchlist matches the derived one.
        let persisted = Store::new(dir.path()).load_watchlist();
        assert_eq!(persisted, state.watchlist());

        // Same backend, same settings: same table data.
        let first = state.table_data().clone();
        state.refresh(&handler).await;
        assert_eq!(state.table_data(), &first);
    }

    #[tokio::test]
    async fn test_refresh_failure_sets_error_and_fallback() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/sheet123/values/Orders!A1:Z200");
                then.status(404)
                    .json_body(json!({ "error": { "message": "not found" } }));
            })
            .await;

        let dir = TempDir::new().unwrap();
        let mut state = configured(&dir, vec![TableSpec::new("Orders", &[])]);
        let handler = CloudHandler::with_base_url(server.base_url());

        state.refresh(&handler).await;

        assert_eq!(state.error(), Some("not found"));
        assert!(state.is_using_fallback());
        assert!(!state.is_loading());
        assert_eq!(state.table_data(), &*SAMPLE_DATA);
    }

    #[tokio::test]
    async fn test_partial_fetch_is_never_installed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/sheet123/values/SYMBOLS_MASTER!A1:Z200");
                then.status(200)
                    .json_body(json!({ "values": [["Symbol"], ["AMD"]] }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/sheet123/values/Orders!A1:Z200");
                then.status(500).body("backend unavailable");
            })
            .await;
        let never = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/sheet123/values/Portfolio!A1:Z200");
                then.status(200).json_body(json!({ "values": [["Symbol"], ["AMD"]] }));
            })
            .await;

        let dir = TempDir::new().unwrap();
        let mut state = configured(
            &dir,
            vec![
                TableSpec::new(MASTER_TABLE, &[]),
                TableSpec::new("Orders", &[]),
                TableSpec::new("Portfolio", &[]),
            ],
        );
        let handler = CloudHandler::with_base_url(server.base_url());

        state.refresh(&handler).await;

        never.assert_calls_async(0).await;
        assert_eq!(state.error(), Some("Failed to fetch sheet: Orders"));
        assert!(state.is_using_fallback());
        assert_eq!(state.table_data(), &*SAMPLE_DATA);
        assert_eq!(state.watchlist().len(), SAMPLE_DATA[MASTER_TABLE].len());
    }

    #[tokio::test]
    async fn test_refresh_error_hides_credential() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store
            .save_settings(&Settings {
                source_id: "sheet123".into(),
                credential: "SUPERSECRETKEY".into(),
                schema: vec![TableSpec::new("Orders", &[])],
            })
            .unwrap();
        let mut state = AppState::new(store);

        state.refresh(&CloudHandler::with_base_url("http://127.0.0.1:9")).await;

        let error = state.error().unwrap();
        assert!(error.starts_with("Network error"));
        assert!(!error.contains("SUPERSECRETKEY"));
    }

    #[test]
    fn test_watchlist_shrinks_with_master_table() {
        let dir = TempDir::new().unwrap();
        let mut state = AppState::new(Store::new(dir.path()));

        let mut wide = TableData::new();
        wide.insert(
            MASTER_TABLE.to_string(),
            ["AAPL", "MSFT", "NVDA", "TSLA"]
                .iter()
                .map(|s| row(&[("Symbol", (*s).into())]))
                .collect(),
        );
        state.finish_refresh(Ok(wide));
        assert_eq!(state.watchlist().len(), 4);

        let mut narrow = TableData::new();
        narrow.insert(MASTER_TABLE.to_string(), vec![row(&[("Symbol", "MSFT".into())])]);
        state.finish_refresh(Ok(narrow));

        assert_eq!(state.watchlist().len(), 1);
        assert_eq!(state.watchlist()[0].id, "MSFT");
        let persisted = Store::new(dir.path()).load_watchlist();
        assert_eq!(persisted, state.watchlist());
    }

    #[test]
    fn test_watchlist_kept_when_master_table_missing() {
        let dir = TempDir::new().unwrap();
        let mut state = AppState::new(Store::new(dir.path()));
        let before = state.watchlist().to_vec();

        let mut data = TableData::new();
        data.insert("Orders".to_string(), vec![row(&[("ID", "1".into())])]);
        state.finish_refresh(Ok(data));

        assert_eq!(state.watchlist(), before.as_slice());
        assert!(!state.is_using_fallback());
    }

    #[test]
    fn test_last_finished_refresh_wins() {
        let dir = TempDir::new().unwrap();
        let mut state = configured(&dir, vec![TableSpec::new("Orders", &[])]);

        let stale = state.begin_refresh();
        let fresh = state.begin_refresh();
        assert!(stale.is_some() && fresh.is_some());
        assert!(state.is_loading());

        let mut newer = TableData::new();
        newer.insert("Orders".to_string(), vec![row(&[("ID", "2".into())])]);
        let mut older = TableData::new();
        older.insert("Orders".to_string(), vec![row(&[("ID", "1".into())])]);

        state.finish_refresh(Ok(newer));
        state.finish_refresh(Ok(older.clone()));
        assert_eq!(state.table_data(), &older);
    }

    #[test]
    fn test_apply_settings_persists_and_requests_fetch() {
        let dir = TempDir::new().unwrap();
        let mut state = AppState::new(Store::new(dir.path()));
        let settings = Settings {
            source_id: "sheet123".into(),
            credential: "secret".into(),
            ..Settings::default()
        };

        let request = state.apply_settings(settings.clone()).unwrap();

        assert_eq!(request.source_id, "sheet123");
        assert_eq!(request.schema.len(), 6);
        assert!(state.is_loading());
        assert_eq!(Store::new(dir.path()).load_settings(), settings);
    }
}
