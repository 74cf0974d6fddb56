// src/csv_handler.rs
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;

use crate::data_types::{collect_headers, Row};

pub struct CSVHandler {}

impl CSVHandler {
    pub fn new() -> Self {
        CSVHandler {}
    }

    pub fn write_table<P: AsRef<Path>>(&self, path: P, rows: &[Row]) -> Result<(), csv::Error> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_rows(file, rows)?;
        log::info!("Exported {} rows to {}", rows.len(), path.as_ref().display());
        Ok(())
    }

    /// Header is the union of row keys in first-seen order; cells a row
    /// lacks are written empty.
    pub fn write_rows<W: Write>(&self, writer: W, rows: &[Row]) -> Result<(), csv::Error> {
        let headers = collect_headers(rows);
        let mut writer = WriterBuilder::new().from_writer(writer);

        writer.write_record(&headers)?;
        for row in rows {
            let record: Vec<String> = headers
                .iter()
                .map(|h| row.get(h).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for CSVHandler {
    fn default() -> Self {
        Self::new()
    }
}
