// src/data_types.rs
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One configured table: its name and the columns to keep.
/// An empty column list keeps every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl TableSpec {
    pub fn new(table_name: &str, columns: &[&str]) -> Self {
        TableSpec {
            table_name: table_name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Case-insensitive allow-list check.
    pub fn allows(&self, header: &str) -> bool {
        self.columns.is_empty()
            || self
                .columns
                .iter()
                .any(|col| col.to_lowercase() == header.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    /// Mirrors JavaScript truthiness: empty text and zero are blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(n) => *n == 0.0 || n.is_nan(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(n) => CellValue::Number(n),
                None => CellValue::Text(n.to_string()),
            },
            Value::Null => CellValue::empty(),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<CellValue> for Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// A keyed row backed by an insertion-ordered JSON object. Keys keep
/// header order; re-inserting a key keeps its position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn insert(&mut self, key: &str, value: CellValue) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<CellValue> {
        self.0.get(key).map(CellValue::from)
    }

    pub fn first_value(&self) -> Option<CellValue> {
        self.0.values().next().map(CellValue::from)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), CellValue::from(v)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (key, value) in iter {
            row.insert(key.as_ref(), value.into());
        }
        row
    }
}

/// Union of row keys in first-seen order.
pub fn collect_headers(rows: &[Row]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if !headers.iter().any(|h| h == key) {
            headers.push(key.to_string());
        }
    }
    headers
}

/// Table name to rows. Always replaced as a whole.
pub type TableData = BTreeMap<String, Vec<Row>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub source_id: String,
    pub credential: String,
    pub schema: Vec<TableSpec>,
}

impl Settings {
    pub fn is_complete(&self) -> bool {
        !self.source_id.is_empty() && !self.credential.is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source_id: String::new(),
            credential: String::new(),
            schema: vec![
                TableSpec::new("Portfolio", &["Symbol", "Price", "Change", "Volume"]),
                TableSpec::new("SYMBOLS_MASTER", &["Symbol", "Name", "Sector", "Market Cap"]),
                TableSpec::new(
                    "PRICE_DAILY",
                    &["Symbol", "open", "close", "Low", "High", "52w High"],
                ),
                TableSpec::new(
                    "RESULTS_QUARTERLY",
                    &["Symbol", "Period", "Revenue", "Profit", "Margin"],
                ),
                TableSpec::new(
                    "RESULTS_YEARLY",
                    &["Symbol", "Year", "Revenue", "Profit", "Margin"],
                ),
                TableSpec::new("Orders", &["ID", "Item", "Quantity", "Status"]),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub table_name: String,
    pub id: String,
    pub data: Row,
    /// Epoch milliseconds.
    pub added_at: i64,
}
