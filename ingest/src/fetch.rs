use common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// UCI ML Repository archive for the Online Retail II dataset.
pub const DATASET_URL: &str = "https://archive.ics.uci.edu/static/public/502/online+retail+ii.zip";

/// Downloads the dataset archive, extracts the workbook into `data_dir`,
/// removes the archive, and returns the workbook path.
pub async fn fetch_dataset(data_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(data_dir).await?;

    info!(url = DATASET_URL, "Downloading dataset archive");
    let response = rquest::Client::new().get(DATASET_URL).send().await?;
    if !response.status().is_success() {
        return Err(Error::Other(format!(
            "Dataset download failed with status {}",
            response.status()
        )));
    }
    let body = response.bytes().await?;

    let zip_path = data_dir.join("online_retail_ii.zip");
    tokio::fs::write(&zip_path, &body).await?;
    info!(path = %zip_path.display(), bytes = body.len(), "Archive downloaded");

    let workbook = extract_workbook(&zip_path, data_dir)?;

    tokio::fs::remove_file(&zip_path).await?;
    info!(path = %workbook.display(), "Workbook ready");

    Ok(workbook)
}

/// Extracts the first `.xlsx` entry from the archive into `out_dir`.
fn extract_workbook(zip_path: &Path, out_dir: &Path) -> Result<PathBuf> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        if !name.ends_with(".xlsx") {
            continue;
        }

        let file_name = Path::new(&name)
            .file_name()
            .ok_or_else(|| Error::Other(format!("Unusable archive entry name: {}", name)))?;
        let out_path = out_dir.join(file_name);
        let mut out_file = std::fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out_file)?;
        return Ok(out_path);
    }

    Err(Error::Other(
        "No .xlsx entry found in the downloaded archive".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn extracts_the_workbook_entry_from_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("dataset.zip");

        let file = std::fs::File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("readme.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"see workbook").unwrap();
        writer
            .start_file("online_retail_II.xlsx", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"workbook-bytes").unwrap();
        writer.finish().unwrap();

        let out = extract_workbook(&zip_path, dir.path()).unwrap();

        assert_eq!(out.file_name().unwrap(), "online_retail_II.xlsx");
        assert_eq!(std::fs::read(out).unwrap(), b"workbook-bytes");
    }

    #[test]
    fn archive_without_a_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("dataset.zip");

        let file = std::fs::File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("readme.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nothing tabular").unwrap();
        writer.finish().unwrap();

        assert!(extract_workbook(&zip_path, dir.path()).is_err());
    }
}
