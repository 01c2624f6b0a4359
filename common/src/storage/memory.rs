use crate::Result;
use crate::storage::s3::ObjectStorage;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory [`ObjectStorage`] with the same additive-key semantics as the
/// S3 implementation. Used by pipeline tests and local experiments.
#[derive(Clone)]
pub struct MemoryStorage {
    bucket: String,
    objects: std::sync::Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: std::sync::Arc::new(DashMap::new()),
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<()> {
        self.objects.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                crate::Error::Storage(format!(
                    "Object {} not found in bucket {}",
                    key, self.bucket
                ))
            })
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn check_object_exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.contains_key(key))
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
