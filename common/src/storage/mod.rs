pub mod memory;
pub mod s3;

use crate::Result;
use crate::config::MinioConfig;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

impl From<&MinioConfig> for S3Config {
    fn from(minio: &MinioConfig) -> Self {
        Self {
            endpoint: minio.endpoint.clone(),
            region: minio.region.clone(),
            access_key: minio.access_key.clone(),
            secret_key: minio.secret_key.clone(),
        }
    }
}

#[derive(Clone)]
pub struct S3Manager {
    pub config: S3Config,
    client_cache: Arc<dashmap::DashMap<String, Arc<S3Client>>>,
}

impl S3Manager {
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            client_cache: Arc::new(dashmap::DashMap::new()),
        }
    }

    pub async fn get_client(&self, bucket: &str) -> Result<Arc<S3Client>> {
        if let Some(client) = self.client_cache.get(bucket) {
            return Ok(client.clone());
        }

        let credentials = Credentials::new(
            &self.config.access_key,
            &self.config.secret_key,
            None,
            None,
            "static",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&self.config.endpoint)
            .region(Region::new(self.config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Arc::new(aws_sdk_s3::Client::from_conf(s3_config));
        self.client_cache.insert(bucket.to_string(), client.clone());
        Ok(client)
    }

    /// Checks whether a bucket exists and is accessible.
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let client = self.get_client(bucket).await?;

        match client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(err)) if err.err().is_not_found() => Ok(false),
            Err(e) => Err(crate::Error::Storage(format!(
                "Cannot access bucket '{}': {}",
                bucket, e
            ))),
        }
    }

    /// Creates the bucket unless it already exists.
    pub async fn create_bucket_if_missing(&self, bucket: &str) -> Result<()> {
        if self.bucket_exists(bucket).await? {
            info!(bucket, "Bucket already exists");
            return Ok(());
        }

        let client = self.get_client(bucket).await?;
        match client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!(bucket, "Created bucket");
                Ok(())
            }
            Err(SdkError::ServiceError(err))
                if err.err().is_bucket_already_owned_by_you()
                    || err.err().is_bucket_already_exists() =>
            {
                info!(bucket, "Bucket already exists");
                Ok(())
            }
            Err(e) => Err(crate::Error::Storage(format!(
                "Failed to create bucket '{}': {}",
                bucket, e
            ))),
        }
    }

    /// Lists files in a specified bucket with filtering options
    ///
    /// # Arguments
    /// * `bucket` - The bucket to list files from
    /// * `options` - Optional filtering and listing parameters
    pub async fn list_files(&self, bucket: &str, options: ListOptions) -> Result<Vec<String>> {
        let client = self.get_client(bucket).await?;
        let mut request = client.list_objects_v2().bucket(bucket);

        if let Some(ref prefix) = options.prefix {
            request = request.prefix(prefix);
        }

        if let Some(ref delimiter) = options.delimiter {
            request = request.delimiter(delimiter);
        }

        if let Some(max_keys) = options.max_keys {
            request = request.max_keys(max_keys);
        }

        let objects = request.send().await?;
        let mut files = Vec::new();
        let contents = objects.contents();
        if !contents.is_empty() {
            for object in contents {
                if let Some(key) = object.key() {
                    let should_include = match &options.extensions {
                        Some(extensions) => extensions.iter().any(|ext| key.ends_with(ext)),
                        None => true,
                    };

                    if should_include {
                        files.push(key.to_string());
                    }
                }
            }
        }

        Ok(files)
    }
}

#[derive(Default)]
pub struct ListOptions {
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub max_keys: Option<i32>,
    pub extensions: Option<Vec<String>>,
}
