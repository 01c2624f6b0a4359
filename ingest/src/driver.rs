use crate::cursor::CursorStore;
use crate::encode::encode_batch;
use crate::source::SourceReader;
use chrono::{NaiveDate, Utc};
use common::storage::s3::ObjectStorage;
use common::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one ingestion run. An empty date is a normal completion,
/// reported distinctly from success-with-data.
#[derive(Debug)]
pub enum RunOutcome {
    Ingested(IngestReport),
    Empty { date: NaiveDate },
}

#[derive(Debug)]
pub struct IngestReport {
    pub date: NaiveDate,
    pub uploads: Vec<SheetUpload>,
    pub cursor_advanced: bool,
}

#[derive(Debug)]
pub struct SheetUpload {
    pub sheet: String,
    pub rows: usize,
    pub key: String,
}

/// Drives one run: resolve target date, load and filter the source, encode
/// and upload each non-empty sheet, then commit the cursor strictly last.
pub struct IngestDriver<R> {
    reader: R,
    sink: Arc<dyn ObjectStorage>,
    cursor: Box<dyn CursorStore>,
    key_prefix: String,
}

impl<R: SourceReader> IngestDriver<R> {
    pub fn new(
        reader: R,
        sink: Arc<dyn ObjectStorage>,
        cursor: Box<dyn CursorStore>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            sink,
            cursor,
            key_prefix: key_prefix.into(),
        }
    }

    pub async fn run(&mut self, explicit_date: Option<NaiveDate>) -> Result<RunOutcome> {
        let (date, from_cursor) = self.resolve_target_date(explicit_date).await?;
        info!(
            date = %date,
            from_cursor,
            bucket = self.sink.bucket(),
            "Resolved target date"
        );

        let sheets = self.reader.load_for_date(date)?;

        if sheets.values().all(|sheet| sheet.is_empty()) {
            info!(date = %date, "No data found for target date, cursor left unchanged");
            return Ok(RunOutcome::Empty { date });
        }

        let mut uploads = Vec::new();
        for (name, sheet) in &sheets {
            let Some(batch) = sheet.batch() else {
                debug!(sheet = %name, "Skipping sheet with no rows for the date");
                continue;
            };

            let payload = encode_batch(batch)?;
            let key = self.object_key(name, date);
            self.sink.put_object(&key, &payload).await?;
            info!(
                sheet = %name,
                rows = batch.num_rows(),
                bytes = payload.len(),
                key = %key,
                "Uploaded sheet batch"
            );

            uploads.push(SheetUpload {
                sheet: name.clone(),
                rows: batch.num_rows(),
                key,
            });
        }

        // Commit is strictly the last action; explicit-date runs are
        // out-of-band and never move the automatic cursor.
        if from_cursor {
            self.cursor.advance(date).await?;
        }

        Ok(RunOutcome::Ingested(IngestReport {
            date,
            uploads,
            cursor_advanced: from_cursor,
        }))
    }

    /// Explicit dates are used verbatim without touching the cursor;
    /// otherwise the target is the day after the committed cursor.
    async fn resolve_target_date(
        &self,
        explicit_date: Option<NaiveDate>,
    ) -> Result<(NaiveDate, bool)> {
        match explicit_date {
            Some(date) => Ok((date, false)),
            None => {
                let cursor = self.cursor.read().await?;
                let next = cursor.succ_opt().ok_or_else(|| {
                    Error::InvalidInput(format!("Cursor date {} has no successor", cursor))
                })?;
                Ok((next, true))
            }
        }
    }

    fn object_key(&self, sheet: &str, date: NaiveDate) -> String {
        let generation = Utc::now().format("%Y%m%d_%H%M%S%f");
        format!(
            "{}/{}_{}_{}.parquet",
            self.key_prefix,
            clean_sheet_name(sheet),
            date.format("%Y-%m-%d"),
            generation
        )
    }
}

/// Sheet names become object-name safe: lowercased, spaces and slashes
/// replaced.
fn clean_sheet_name(name: &str) -> String {
    name.trim().replace([' ', '/'], "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::FileCursorStore;
    use crate::encode::decode_batches;
    use crate::source::{Cell, Sheet, SheetBatch};
    use chrono::{NaiveDate, NaiveDateTime};
    use common::storage::memory::MemoryStorage;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// Filters preloaded sheets exactly like the workbook reader does.
    struct FakeSource {
        sheets: Vec<Sheet>,
    }

    impl SourceReader for FakeSource {
        fn load_for_date(&mut self, target: NaiveDate) -> Result<BTreeMap<String, SheetBatch>> {
            self.sheets
                .iter()
                .map(|sheet| {
                    sheet
                        .filter_for_date("InvoiceDate", target)
                        .map(|batch| (sheet.name.clone(), batch))
                })
                .collect()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stamp(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn retail_sheets() -> Vec<Sheet> {
        let columns = vec![
            "Invoice".to_string(),
            "InvoiceDate".to_string(),
            "Quantity".to_string(),
        ];
        vec![
            Sheet::new(
                "Year 2009-2010",
                columns.clone(),
                vec![
                    vec![
                        Cell::Text("536365".to_string()),
                        Cell::DateTime(stamp(2010, 12, 1, 8)),
                        Cell::Int(6),
                    ],
                    vec![
                        Cell::Text("536366".to_string()),
                        Cell::DateTime(stamp(2010, 12, 1, 9)),
                        Cell::Int(2),
                    ],
                    vec![
                        Cell::Text("536367".to_string()),
                        Cell::DateTime(stamp(2010, 12, 1, 10)),
                        Cell::Int(32),
                    ],
                ],
            ),
            Sheet::new(
                "Year 2010-2011",
                columns,
                vec![vec![
                    Cell::Text("581587".to_string()),
                    Cell::DateTime(stamp(2011, 12, 9, 12)),
                    Cell::Int(4),
                ]],
            ),
        ]
    }

    struct Harness {
        driver: IngestDriver<FakeSource>,
        sink: MemoryStorage,
        cursor_dir: TempDir,
    }

    impl Harness {
        fn new(sheets: Vec<Sheet>) -> Self {
            let sink = MemoryStorage::new("bronze");
            let cursor_dir = tempfile::tempdir().unwrap();
            let cursor = FileCursorStore::new(
                cursor_dir.path().join("cursor.txt"),
                day(2010, 11, 30),
            );
            let driver = IngestDriver::new(
                FakeSource { sheets },
                Arc::new(sink.clone()),
                Box::new(cursor),
                "online_retail_ii",
            );
            Self {
                driver,
                sink,
                cursor_dir,
            }
        }

        fn cursor(&self) -> FileCursorStore {
            FileCursorStore::new(self.cursor_dir.path().join("cursor.txt"), day(2010, 11, 30))
        }
    }

    #[tokio::test]
    async fn first_automatic_run_processes_the_day_after_the_epoch() {
        let mut harness = Harness::new(retail_sheets());

        let outcome = harness.driver.run(None).await.unwrap();

        // 3 rows in one sheet, 0 in the other: exactly one object uploaded.
        let RunOutcome::Ingested(report) = outcome else {
            panic!("expected an ingested outcome");
        };
        assert_eq!(report.date, day(2010, 12, 1));
        assert_eq!(report.uploads.len(), 1);
        assert_eq!(report.uploads[0].sheet, "Year 2009-2010");
        assert_eq!(report.uploads[0].rows, 3);
        assert!(report.cursor_advanced);

        assert_eq!(harness.sink.object_count(), 1);
        assert_eq!(harness.cursor().read().await.unwrap(), day(2010, 12, 1));
    }

    #[tokio::test]
    async fn empty_date_leaves_cursor_unchanged_and_writes_nothing() {
        let mut harness = Harness::new(retail_sheets());
        harness.cursor().advance(day(2011, 1, 1)).await.unwrap();

        // Nothing in either sheet for 2011-01-02.
        let outcome = harness.driver.run(None).await.unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Empty { date } if date == day(2011, 1, 2)
        ));
        assert_eq!(harness.sink.object_count(), 0);
        assert_eq!(harness.cursor().read().await.unwrap(), day(2011, 1, 1));
    }

    #[tokio::test]
    async fn explicit_date_never_moves_the_cursor() {
        let mut harness = Harness::new(retail_sheets());

        let outcome = harness.driver.run(Some(day(2011, 12, 9))).await.unwrap();

        let RunOutcome::Ingested(report) = outcome else {
            panic!("expected an ingested outcome");
        };
        assert_eq!(report.uploads.len(), 1);
        assert!(!report.cursor_advanced);

        // Cursor file was never created; reads still fall back to the epoch.
        assert_eq!(harness.cursor().read().await.unwrap(), day(2010, 11, 30));
    }

    #[tokio::test]
    async fn rerunning_the_same_explicit_date_is_additive() {
        let mut harness = Harness::new(retail_sheets());

        harness.driver.run(Some(day(2010, 12, 1))).await.unwrap();
        harness.driver.run(Some(day(2010, 12, 1))).await.unwrap();

        let keys = harness.sink.list_objects("online_retail_ii/").await.unwrap();
        assert_eq!(keys.len(), 2, "re-runs must not overwrite earlier objects");
    }

    #[tokio::test]
    async fn sheet_without_timestamp_column_does_not_abort_siblings() {
        let mut sheets = retail_sheets();
        sheets.push(Sheet::new(
            "Legend",
            vec!["Description".to_string()],
            vec![vec![Cell::Text("field descriptions".to_string())]],
        ));
        let mut harness = Harness::new(sheets);

        let outcome = harness.driver.run(None).await.unwrap();

        let RunOutcome::Ingested(report) = outcome else {
            panic!("expected an ingested outcome");
        };
        assert_eq!(report.uploads.len(), 1);
        assert_eq!(report.uploads[0].sheet, "Year 2009-2010");
    }

    #[tokio::test]
    async fn consecutive_automatic_runs_walk_forward_one_day_at_a_time() {
        let mut harness = Harness::new(retail_sheets());

        harness.driver.run(None).await.unwrap();
        // 2010-12-01 ingested; the next automatic run targets 2010-12-02,
        // which has no data and therefore must not advance the cursor.
        let outcome = harness.driver.run(None).await.unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::Empty { date } if date == day(2010, 12, 2)
        ));
        assert_eq!(harness.cursor().read().await.unwrap(), day(2010, 12, 1));
    }

    #[tokio::test]
    async fn uploaded_payloads_decode_back_to_the_filtered_rows() {
        let mut harness = Harness::new(retail_sheets());

        harness.driver.run(None).await.unwrap();

        let keys = harness.sink.list_objects("online_retail_ii/").await.unwrap();
        let payload = harness.sink.get_object(&keys[0]).await.unwrap();
        let batches = decode_batches(&payload).unwrap();

        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 3);
    }

    #[test]
    fn sheet_names_are_cleaned_for_object_keys() {
        assert_eq!(clean_sheet_name("Year 2009-2010"), "year_2009-2010");
        assert_eq!(clean_sheet_name("A/B Test"), "a_b_test");
    }
}
