use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 本機檔案系統；相對路徑以 base_path 為根，絕對路徑原樣使用
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(Path::new(path))
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.resolve(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage
            .write_file("out/nested/metering_data.csv", b"postalCode\n")
            .await
            .unwrap();

        let data = storage.read_file("out/nested/metering_data.csv").await.unwrap();
        assert_eq!(data, b"postalCode\n");
    }

    #[tokio::test]
    async fn test_absolute_path_ignores_base() {
        let temp_dir = TempDir::new().unwrap();
        let absolute = temp_dir.path().join("input.csv");
        std::fs::write(&absolute, b"postalCode,streetNumber\n").unwrap();

        let storage = LocalStorage::new("/definitely/not/here");
        let data = storage.read_file(absolute.to_str().unwrap()).await.unwrap();

        assert_eq!(data, b"postalCode,streetNumber\n");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let err = storage.read_file("nope.csv").await.unwrap_err();
        assert!(matches!(err, crate::utils::error::EanError::IoError(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_writes_run_as_spawned_tasks() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let mut handles = Vec::new();
        for name in ["metering_data.csv", "missing_addresses.csv"] {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .write_file(&format!("output/{}", name), name.as_bytes())
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let data = storage.read_file("output/missing_addresses.csv").await.unwrap();
        assert_eq!(data, b"missing_addresses.csv");
    }
}
