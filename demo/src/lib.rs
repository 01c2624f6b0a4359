pub mod generator;
pub mod layout;

use chrono::Utc;
use common::config::Settings;
use common::storage::s3::{ObjectStorage, S3Storage};
use common::storage::{ListOptions, S3Config, S3Manager};
use common::Result;
use generator::{EcommerceDataGenerator, Scale};
use ingest::encode::{decode_batches, encode_batch};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct UploadedTable {
    pub table: String,
    pub key: String,
    pub rows: usize,
    pub bytes: usize,
}

/// Written to `archive/` in the bronze bucket after every demo run, so the
/// seeded layer is self-describing.
#[derive(Debug, Serialize)]
struct UploadManifest<'a> {
    generated_at: String,
    scale: &'a str,
    tables: &'a [UploadedTable],
}

/// Runs the complete seeding demo: lakehouse structure, synthetic dataset,
/// bronze uploads, manifest, and a decode-back verification pass.
pub async fn run_demo_pipeline(config_path: &str, scale_override: Option<&str>) -> Result<()> {
    let settings = Settings::new(config_path)?;
    let scale: Scale = scale_override
        .unwrap_or(settings.demo.scale.as_str())
        .parse()?;

    let s3_manager = Arc::new(S3Manager::new(S3Config::from(&settings.minio)));
    layout::setup_lakehouse_structure(&s3_manager).await?;

    let bronze = S3Storage::new(s3_manager.clone(), &settings.minio.bronze_bucket).await?;

    let mut generator = EcommerceDataGenerator::new(settings.demo.seed);
    let dataset = generator.generate_all(scale)?;

    println!("\nGenerated dataset summary:");
    for (table, batch) in dataset.tables() {
        println!(
            "  - {}: {} rows, {} columns",
            table,
            batch.num_rows(),
            batch.num_columns()
        );
    }

    let uploads = upload_bronze_layer(&bronze, &dataset).await?;
    write_manifest(&bronze, scale, &uploads).await?;

    println!("\nUpload summary:");
    for upload in &uploads {
        println!(
            "  - {}: {} rows -> {}/{}",
            upload.table,
            upload.rows,
            bronze.bucket(),
            upload.key
        );
    }

    show_bronze_contents(&s3_manager, &bronze).await?;

    info!("Demo completed successfully");
    Ok(())
}

/// Creates the bucket/folder layout only; useful before wiring data in.
pub async fn run_setup_only(config_path: &str) -> Result<()> {
    let settings = Settings::new(config_path)?;
    let s3_manager = Arc::new(S3Manager::new(S3Config::from(&settings.minio)));
    layout::setup_lakehouse_structure(&s3_manager).await?;
    println!("Lakehouse structure ready at {}", settings.minio.endpoint);
    Ok(())
}

async fn upload_bronze_layer(
    bronze: &S3Storage,
    dataset: &generator::Dataset,
) -> Result<Vec<UploadedTable>> {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let mut uploads = Vec::new();

    for (table, batch) in dataset.tables() {
        let payload = encode_batch(batch)?;
        let key = format!("{}/{}_{}.parquet", table, table, stamp);
        bronze.put_object(&key, &payload).await?;
        info!(table, rows = batch.num_rows(), key = %key, "Uploaded table");

        uploads.push(UploadedTable {
            table: table.to_string(),
            key,
            rows: batch.num_rows(),
            bytes: payload.len(),
        });
    }

    Ok(uploads)
}

async fn write_manifest(bronze: &S3Storage, scale: Scale, uploads: &[UploadedTable]) -> Result<()> {
    let manifest = UploadManifest {
        generated_at: Utc::now().to_rfc3339(),
        scale: scale.as_str(),
        tables: uploads,
    };
    let manifest_json = serde_json::to_vec_pretty(&manifest)?;

    let key = format!("archive/manifest_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
    bronze.put_object(&key, &manifest_json).await?;
    info!(key = %key, "Wrote upload manifest");

    Ok(())
}

/// Lists the seeded layer and decodes one object back as a sanity check.
async fn show_bronze_contents(s3_manager: &Arc<S3Manager>, bronze: &S3Storage) -> Result<()> {
    let objects = bronze.list_objects("").await?;

    println!("\nBronze layer contents:");
    for key in objects.iter().take(20) {
        println!("  - {}/{}", bronze.bucket(), key);
    }
    if objects.len() > 20 {
        println!("  ... and {} more objects", objects.len() - 20);
    }

    let parquet_files = s3_manager
        .list_files(
            bronze.bucket(),
            ListOptions {
                extensions: Some(vec![".parquet".to_string()]),
                ..Default::default()
            },
        )
        .await?;

    if let Some(sample) = parquet_files.first() {
        let payload = bronze.get_object(sample).await?;
        let batches = decode_batches(&payload)?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        let columns = batches.first().map_or(0, |b| b.num_columns());
        println!(
            "\nVerified {}: decoded {} rows, {} columns",
            sample, rows, columns
        );
    }

    Ok(())
}
