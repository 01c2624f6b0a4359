use crate::source::sheet::{Cell, Sheet, SheetBatch};
use crate::source::SourceReader;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::NaiveDate;
use common::Result;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Multi-sheet `.xlsx` workbook source. Loads every sheet on each run and
/// filters in memory; there is no partial-file optimization.
pub struct XlsxWorkbook {
    sheets: Sheets<BufReader<File>>,
    timestamp_column: String,
}

impl XlsxWorkbook {
    pub fn open(path: impl AsRef<Path>, timestamp_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let sheets = open_workbook_auto(path)?;
        info!(path = %path.display(), "Opened source workbook");
        Ok(Self {
            sheets,
            timestamp_column: timestamp_column.to_string(),
        })
    }
}

impl SourceReader for XlsxWorkbook {
    fn load_for_date(&mut self, target: NaiveDate) -> Result<BTreeMap<String, SheetBatch>> {
        let names = self.sheets.sheet_names().to_owned();
        let mut batches = BTreeMap::new();

        for name in names {
            let range = self.sheets.worksheet_range(&name)?;
            let sheet = sheet_from_range(&name, &range);
            info!(
                sheet = %name,
                rows = sheet.rows.len(),
                "Loaded sheet"
            );
            let filtered = sheet.filter_for_date(&self.timestamp_column, target)?;
            batches.insert(name, filtered);
        }

        Ok(batches)
    }
}

/// First row becomes the header; every following row becomes cells. Header
/// cells are stringified whatever their type.
fn sheet_from_range(name: &str, range: &calamine::Range<Data>) -> Sheet {
    let mut rows = range.rows();

    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_name).collect(),
        None => Vec::new(),
    };

    let data_rows: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Sheet::new(name, columns, data_rows)
}

fn header_name(data: &Data) -> String {
    match data {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::DateTime(naive),
            None => Cell::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        // Error cells (#N/A and friends) carry no usable value.
        Data::Error(_) => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_conversion_preserves_primitive_values() {
        assert_eq!(cell_from_data(&Data::Int(42)), Cell::Int(42));
        assert_eq!(cell_from_data(&Data::Float(2.55)), Cell::Float(2.55));
        assert_eq!(
            cell_from_data(&Data::String("WHITE HANGING HEART".to_string())),
            Cell::Text("WHITE HANGING HEART".to_string())
        );
        assert_eq!(cell_from_data(&Data::Bool(true)), Cell::Bool(true));
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn iso_datetime_cells_stay_textual_for_later_parsing() {
        let cell = cell_from_data(&Data::DateTimeIso("2010-12-01T08:26:00".to_string()));
        assert_eq!(cell, Cell::Text("2010-12-01T08:26:00".to_string()));
    }
}
