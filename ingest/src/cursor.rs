use async_trait::async_trait;
use chrono::NaiveDate;
use common::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persisted "last successfully ingested date" checkpoint.
///
/// Single sequential writer by operational discipline; `advance` must only
/// be called after the ingestion for that date fully succeeded. A crash
/// between upload and advance reprocesses the same date on the next run,
/// which is safe because sink keys are additive.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Last committed date, or the epoch when no cursor exists yet.
    /// A missing backing file is a valid initial state, not an error.
    async fn read(&self) -> Result<NaiveDate>;

    /// Overwrites the stored cursor with `date`.
    async fn advance(&self, date: NaiveDate) -> Result<()>;
}

/// Cursor backed by a flat text file holding one ISO `YYYY-MM-DD` string.
pub struct FileCursorStore {
    path: PathBuf,
    epoch: NaiveDate,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>, epoch: NaiveDate) -> Self {
        Self {
            path: path.into(),
            epoch,
        }
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn read(&self) -> Result<NaiveDate> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let date = NaiveDate::parse_from_str(contents.trim(), "%Y-%m-%d").map_err(|e| {
                    Error::InvalidInput(format!(
                        "Malformed cursor file {}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
                debug!(cursor = %date, path = %self.path.display(), "Read cursor");
                Ok(date)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(epoch = %self.epoch, "No cursor file, starting from epoch");
                Ok(self.epoch)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn advance(&self, date: NaiveDate) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| *p != Path::new("")) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, format!("{}", date.format("%Y-%m-%d"))).await?;
        debug!(cursor = %date, path = %self.path.display(), "Advanced cursor");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2010, 11, 30).unwrap()
    }

    #[tokio::test]
    async fn missing_file_reads_as_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("cursor.txt"), epoch());

        assert_eq!(store.read().await.unwrap(), epoch());
    }

    #[tokio::test]
    async fn advance_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("cursor.txt"), epoch());
        let date = NaiveDate::from_ymd_opt(2010, 12, 1).unwrap();

        store.advance(date).await.unwrap();
        assert_eq!(store.read().await.unwrap(), date);

        let next = NaiveDate::from_ymd_opt(2010, 12, 2).unwrap();
        store.advance(next).await.unwrap();
        assert_eq!(store.read().await.unwrap(), next);
    }

    #[tokio::test]
    async fn advance_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/nested/cursor.txt");
        let store = FileCursorStore::new(&path, epoch());

        store
            .advance(NaiveDate::from_ymd_opt(2011, 1, 15).unwrap())
            .await
            .unwrap();

        let raw = std::fs::read_to_string(path).unwrap();
        assert_eq!(raw, "2011-01-15");
    }

    #[tokio::test]
    async fn malformed_cursor_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor.txt");
        std::fs::write(&path, "not-a-date").unwrap();
        let store = FileCursorStore::new(&path, epoch());

        assert!(matches!(
            store.read().await,
            Err(Error::InvalidInput(_))
        ));
    }
}
