//! Tabular input and output.
//!
//! A [`Dataset`] is an ordered list of columns plus string rows. It is read
//! from a spreadsheet (first sheet, header row) or a CSV file and written
//! back as CSV with any columns added during the run appended at the end.

use crate::error::{HarvestError, HarvestResult};
use crate::types::{
    other_tenderer_column, LocationRecord, ProcessingOutcome, LOCATION_COLUMN, STATUS_COLUMN,
    SUCCESSFUL_TENDERER_COLUMN,
};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if *f == (*f as i64) as f64 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("{}", dt)),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<HashMap<String, String>>) -> Self {
        Self { columns, rows }
    }

    /// Read a spreadsheet or CSV file; it must have a `Location` column.
    pub fn load(path: &Path) -> HarvestResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let dataset = if ext == "csv" {
            Self::load_csv(path)?
        } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Self::load_spreadsheet(path)?
        } else {
            return Err(HarvestError::Dataset(format!(
                "unsupported input format: {}",
                path.display()
            )));
        };

        if !dataset.columns.iter().any(|c| c == LOCATION_COLUMN) {
            return Err(HarvestError::Dataset(format!(
                "{} has no '{LOCATION_COLUMN}' column",
                path.display()
            )));
        }
        tracing::info!(
            "loaded {} row(s), {} column(s) from {}",
            dataset.rows.len(),
            dataset.columns.len(),
            path.display()
        );
        Ok(dataset)
    }

    fn load_csv(path: &Path) -> HarvestResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let row = columns
                .iter()
                .cloned()
                .zip(record.iter().map(|f| f.trim().to_string()))
                .collect();
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    fn load_spreadsheet(path: &Path) -> HarvestResult<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| HarvestError::Dataset(format!("{} has no sheets", path.display())))??;

        let mut lines = range.rows();
        let columns: Vec<String> = match lines.next() {
            Some(header) => header.iter().map(cell_to_string).collect(),
            None => Vec::new(),
        };
        let rows = lines
            .map(|cells| {
                columns
                    .iter()
                    .cloned()
                    .zip(cells.iter().map(cell_to_string))
                    .collect()
            })
            .collect();
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Set a cell, appending the column if it is new.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        if let Some(cells) = self.rows.get_mut(row) {
            cells.insert(column.to_string(), value.into());
        }
    }

    /// One record per row, in order.
    pub fn records(&self) -> Vec<LocationRecord> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| LocationRecord {
                index,
                location: row.get(LOCATION_COLUMN).map(|s| s.trim().to_string()).unwrap_or_default(),
                raw_row: row.clone(),
            })
            .collect()
    }

    /// Write an outcome into the first row with the same location.
    ///
    /// Returns the row index, or `None` when no row matches.
    pub fn apply_outcome(&mut self, outcome: &ProcessingOutcome) -> Option<usize> {
        let row = self.rows.iter().position(|r| {
            r.get(LOCATION_COLUMN).map(|s| s.trim()) == Some(outcome.location.as_str())
        })?;

        self.set(row, STATUS_COLUMN, outcome.status_label());
        if outcome.successful_tenderer.is_some() || !outcome.other_tenderers.is_empty() {
            self.set(
                row,
                SUCCESSFUL_TENDERER_COLUMN,
                outcome.successful_tenderer.clone().unwrap_or_default(),
            );
        }
        for (i, name) in outcome.other_tenderers.iter().enumerate() {
            self.set(row, &other_tenderer_column(i + 1), name.clone());
        }
        Some(row)
    }

    /// Write the dataset as CSV, columns in order.
    pub fn write_csv(&self, path: &Path) -> HarvestResult<()> {
        let mut wtr = csv::WriterBuilder::new().from_path(path)?;
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            let record: Vec<&str> = self
                .columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
                .collect();
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
