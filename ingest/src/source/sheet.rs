use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime};
use common::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// One owned cell value from the source workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Calendar date carried by the cell, if it holds (or parses as) a
    /// timestamp. Non-temporal and unparseable cells carry no date.
    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => parse_datetime(s).map(|dt| dt.date()),
            _ => None,
        }
    }

    fn display(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

/// Parses the timestamp layouts seen in spreadsheet text cells.
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// One fully loaded sheet: a header row plus cell rows.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Rows whose `timestamp_column` falls on `target`, as a fresh columnar
    /// batch. The source sheet is never mutated.
    ///
    /// A sheet without the timestamp column yields an empty batch rather
    /// than an error, so partial-schema sheets cannot abort sibling sheets.
    pub fn filter_for_date(&self, timestamp_column: &str, target: NaiveDate) -> Result<SheetBatch> {
        let Some(ts_index) = self.columns.iter().position(|c| c == timestamp_column) else {
            warn!(
                sheet = %self.name,
                column = timestamp_column,
                "Sheet has no timestamp column, contributing an empty batch"
            );
            return Ok(SheetBatch::empty(&self.name));
        };

        let matching: Vec<&Vec<Cell>> = self
            .rows
            .iter()
            .filter(|row| {
                row.get(ts_index)
                    .and_then(Cell::as_date)
                    .is_some_and(|d| d == target)
            })
            .collect();

        if matching.is_empty() {
            debug!(sheet = %self.name, date = %target, "No rows for target date");
            return Ok(SheetBatch::empty(&self.name));
        }

        let batch = build_record_batch(&self.columns, &matching)?;
        Ok(SheetBatch::with_batch(&self.name, batch))
    }
}

/// The per-sheet result of filtering one run's target date.
#[derive(Debug, Clone)]
pub struct SheetBatch {
    name: String,
    batch: Option<RecordBatch>,
}

impl SheetBatch {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            batch: None,
        }
    }

    pub fn with_batch(name: &str, batch: RecordBatch) -> Self {
        let batch = (batch.num_rows() > 0).then_some(batch);
        Self {
            name: name.to_string(),
            batch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> Option<&RecordBatch> {
        self.batch.as_ref()
    }

    pub fn rows(&self) -> usize {
        self.batch.as_ref().map_or(0, |b| b.num_rows())
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_none()
    }
}

/// Column type decided at load time from the cells actually present.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Null,
    Int,
    Float,
    Bool,
    Timestamp,
    Text,
}

impl ColumnKind {
    fn merge(self, cell: &Cell) -> ColumnKind {
        let other = match cell {
            Cell::Empty => return self,
            Cell::Int(_) => ColumnKind::Int,
            Cell::Float(_) => ColumnKind::Float,
            Cell::Text(_) => ColumnKind::Text,
            Cell::Bool(_) => ColumnKind::Bool,
            Cell::DateTime(_) => ColumnKind::Timestamp,
        };

        match (self, other) {
            (ColumnKind::Null, kind) => kind,
            (kind, other) if kind == other => kind,
            (ColumnKind::Int, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Int) => {
                ColumnKind::Float
            }
            // Incompatible mix: fall back to the display form.
            _ => ColumnKind::Text,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            ColumnKind::Null | ColumnKind::Text => DataType::Utf8,
            ColumnKind::Int => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Bool => DataType::Boolean,
            ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, None),
        }
    }
}

fn build_record_batch(columns: &[String], rows: &[&Vec<Cell>]) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for (index, column) in columns.iter().enumerate() {
        let kind = rows
            .iter()
            .fold(ColumnKind::Null, |kind, row| match row.get(index) {
                Some(cell) => kind.merge(cell),
                None => kind,
            });

        let cell_at = |row: &&Vec<Cell>| row.get(index).cloned().unwrap_or(Cell::Empty);

        let array: ArrayRef = match kind {
            ColumnKind::Null | ColumnKind::Text => Arc::new(
                rows.iter()
                    .map(|row| cell_at(row).display())
                    .collect::<StringArray>(),
            ),
            ColumnKind::Int => Arc::new(
                rows.iter()
                    .map(|row| match cell_at(row) {
                        Cell::Int(i) => Some(i),
                        _ => None,
                    })
                    .collect::<Int64Array>(),
            ),
            ColumnKind::Float => Arc::new(
                rows.iter()
                    .map(|row| match cell_at(row) {
                        Cell::Int(i) => Some(i as f64),
                        Cell::Float(f) => Some(f),
                        _ => None,
                    })
                    .collect::<Float64Array>(),
            ),
            ColumnKind::Bool => Arc::new(
                rows.iter()
                    .map(|row| match cell_at(row) {
                        Cell::Bool(b) => Some(b),
                        _ => None,
                    })
                    .collect::<BooleanArray>(),
            ),
            ColumnKind::Timestamp => Arc::new(
                rows.iter()
                    .map(|row| match cell_at(row) {
                        Cell::DateTime(dt) => Some(dt.and_utc().timestamp_millis()),
                        _ => None,
                    })
                    .collect::<TimestampMillisecondArray>(),
            ),
        };

        fields.push(Field::new(column, kind.data_type(), true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    Ok(RecordBatch::try_new(schema, arrays)?)
}
