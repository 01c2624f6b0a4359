pub mod cursor;
pub mod driver;
pub mod encode;
pub mod fetch;
pub mod source;

use chrono::NaiveDate;
use common::config::Settings;
use common::storage::s3::S3Storage;
use common::storage::{S3Config, S3Manager};
use common::{Error, Result};
use cursor::FileCursorStore;
use driver::{IngestDriver, RunOutcome};
use source::XlsxWorkbook;
use std::path::Path;
use std::sync::Arc;

/// Runs one incremental ingestion: filters the configured workbook to a
/// single day and uploads each non-empty sheet to the bronze bucket.
///
/// With no explicit date the target is the day after the committed cursor,
/// and the cursor advances on success; an explicit date is processed
/// out-of-band and leaves the cursor untouched.
pub async fn run_ingest_pipeline(
    config_path: &str,
    explicit_date: Option<NaiveDate>,
) -> Result<RunOutcome> {
    let settings = Settings::new(config_path)?;

    if !Path::new(&settings.source.path).exists() {
        return Err(Error::InvalidInput(format!(
            "Source workbook not found at {}",
            settings.source.path
        )));
    }

    let s3_manager = Arc::new(S3Manager::new(S3Config::from(&settings.minio)));
    s3_manager
        .create_bucket_if_missing(&settings.minio.bronze_bucket)
        .await?;

    let sink = Arc::new(S3Storage::new(s3_manager, &settings.minio.bronze_bucket).await?);
    let cursor = FileCursorStore::new(&settings.cursor.path, settings.cursor.epoch);
    let reader = XlsxWorkbook::open(&settings.source.path, &settings.source.timestamp_column)?;

    let mut driver = IngestDriver::new(reader, sink, Box::new(cursor), settings.source.key_prefix);
    driver.run(explicit_date).await
}
