//! Shared atomic-write helper for the file-backed JSON stores.
//!
//! Writers serialize the whole table and rename it into place so a reader
//! never observes a partial write; a `parking_lot::Mutex` serializes writers
//! per store instance (`spec.md` §5: "writes are transactional per batch").

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::domain::AppError;

pub struct JsonFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path, write_lock: Mutex::new(()) }
    }

    pub async fn read<T: DeserializeOwned + Default>(&self) -> Result<T, AppError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|err| AppError::Store(err.to_string())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(err) => Err(AppError::from(err)),
        }
    }

    pub async fn write<T: Serialize>(&self, value: &T) -> Result<(), AppError> {
        let _guard = self.write_lock.lock();
        let serialized = serde_json::to_string_pretty(value).map_err(|err| AppError::Store(err.to_string()))?;
        let tmp_path = tmp_path_for(&self.path);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&tmp_path, serialized).await?;
        fs::rename(&tmp_path, &self.path).await.map_err(AppError::from)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp"))
}
