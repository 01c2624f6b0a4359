use common::storage::s3::{ObjectStorage, S3Storage};
use common::storage::S3Manager;
use common::Result;
use std::sync::Arc;
use tracing::info;

/// Bucket and folder layout of the lakehouse. Folders are zero-byte marker
/// objects, the way the S3 console materializes them.
const LAKEHOUSE_LAYOUT: &[(&str, &[&str])] = &[
    (
        "bronze",
        &["orders/", "products/", "customers/", "fx_rates/", "archive/"],
    ),
    (
        "silver",
        &["orders/", "products/", "customers/", "analytics/", "staging/"],
    ),
    ("gold", &["reports/", "dashboards/", "metrics/", "exports/"]),
];

/// Creates the bronze/silver/gold buckets and their folder markers.
pub async fn setup_lakehouse_structure(s3_manager: &Arc<S3Manager>) -> Result<()> {
    for &(bucket, folders) in LAKEHOUSE_LAYOUT {
        s3_manager.create_bucket_if_missing(bucket).await?;

        let storage = S3Storage::new(s3_manager.clone(), bucket).await?;
        for &folder in folders {
            storage.put_object(folder, &[]).await?;
        }
        info!(bucket, folders = folders.len(), "Bucket structure ready");
    }

    Ok(())
}
