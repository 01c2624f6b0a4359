use chrono::NaiveDate;
use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub minio: MinioConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MinioConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_bronze_bucket")]
    pub bronze_bucket: String,
    #[serde(default = "default_silver_bucket")]
    pub silver_bucket: String,
    #[serde(default = "default_gold_bucket")]
    pub gold_bucket: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Path to the multi-sheet workbook holding the dated source data.
    #[serde(default = "default_source_path")]
    pub path: String,
    /// Column every sheet is filtered on, by calendar date.
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
    /// Key prefix uploads are namespaced under in the bronze bucket.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CursorConfig {
    #[serde(default = "default_cursor_path")]
    pub path: String,
    /// Day before the first ingestable date; an absent cursor file reads as
    /// this value, so the first automatic run targets epoch + 1.
    #[serde(default = "default_cursor_epoch")]
    pub epoch: NaiveDate,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    #[serde(default = "default_demo_scale")]
    pub scale: String,
    #[serde(default = "default_demo_seed")]
    pub seed: u64,
}

fn default_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bronze_bucket() -> String {
    "bronze".to_string()
}

fn default_silver_bucket() -> String {
    "silver".to_string()
}

fn default_gold_bucket() -> String {
    "gold".to_string()
}

fn default_source_path() -> String {
    "data/online_retail_II.xlsx".to_string()
}

fn default_timestamp_column() -> String {
    "InvoiceDate".to_string()
}

fn default_key_prefix() -> String {
    "online_retail_ii".to_string()
}

fn default_cursor_path() -> String {
    "data/last_processed_date.txt".to_string()
}

fn default_cursor_epoch() -> NaiveDate {
    // The Online Retail II data starts on 2010-12-01.
    NaiveDate::from_ymd_opt(2010, 11, 30).expect("valid epoch date")
}

fn default_demo_scale() -> String {
    "small".to_string()
}

fn default_demo_seed() -> u64 {
    42
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            timestamp_column: default_timestamp_column(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            path: default_cursor_path(),
            epoch: default_cursor_epoch(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            scale: default_demo_scale(),
            seed: default_demo_seed(),
        }
    }
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("APP"));

        // Build the configuration
        let config = builder.build()?;

        // Try to deserialize the entire configuration
        let settings: Settings = config.try_deserialize()?;

        debug!(
            endpoint = %settings.minio.endpoint,
            bronze = %settings.minio.bronze_bucket,
            source = %settings.source.path,
            "Loaded settings"
        );

        Ok(settings)
    }
}
