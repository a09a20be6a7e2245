use crate::common::InternalError;
use crate::models::{DeviceCode, DeviceRecord};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub type Records = BTreeMap<DeviceCode, DeviceRecord>;

/// Device code → record persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, code: &DeviceCode) -> Option<DeviceRecord>;
    /// Replaces the whole record and returns what was stored.
    async fn put(&self, code: DeviceCode, record: DeviceRecord) -> anyhow::Result<DeviceRecord>;
    /// Returns whether a record existed.
    async fn delete(&self, code: &DeviceCode) -> anyhow::Result<bool>;
    /// All records, ordered by code.
    async fn list(&self) -> Vec<(DeviceCode, DeviceRecord)>;
}

/// Keeps the whole mapping in one JSON file, rewritten on every mutation.
///
/// Writes go to a sibling temp file which is synced and renamed over the
/// target, so the data file is always either the old or the new mapping.
pub struct FileRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRecordStore {
    /// Opens the store, seeding the example record when the file does not exist yet.
    pub async fn open(path: PathBuf) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|it| !it.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| InternalError::CreateDirectoryError {
                    path: parent.to_path_buf(),
                })?;
        }
        let store = Self {
            path,
            lock: Mutex::new(()),
        };
        let exists = fs::try_exists(&store.path)
            .await
            .with_context(|| InternalError::ReadFileError {
                path: store.path.clone(),
            })?;
        if !exists {
            let mut records = Records::new();
            records.insert(DeviceCode::example(), DeviceRecord::example());
            store.persist(&records).await?;
            tracing::info!("Seeded record store at {:?}", store.path);
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// A missing file is an empty mapping; anything unreadable is an error.
    async fn load(&self) -> anyhow::Result<Records> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Records::new()),
            Err(err) => {
                return Err(err).with_context(|| InternalError::ReadFileError {
                    path: self.path.clone(),
                });
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Records::new());
        }
        let raw: BTreeMap<String, DeviceRecord> = serde_json::from_slice(&bytes)
            .with_context(|| InternalError::ParseRecordsError {
                path: self.path.clone(),
            })?;
        Ok(normalize_keys(raw))
    }

    async fn load_or_empty(&self) -> Records {
        self.load().await.unwrap_or_else(|err| {
            tracing::warn!("Reading records failed, treating store as empty: {:#}", err);
            Records::new()
        })
    }

    async fn persist(&self, records: &Records) -> anyhow::Result<()> {
        let content = serde_json::to_vec_pretty(records).with_context(|| {
            InternalError::SerializeRecordsError {
                path: self.path.clone(),
            }
        })?;
        let temp_path = self.temp_path();
        let write_error = || InternalError::WriteFileError {
            path: temp_path.clone(),
        };
        let mut file = fs::File::create(&temp_path).await.with_context(write_error)?;
        file.write_all(&content).await.with_context(write_error)?;
        file.sync_all().await.with_context(write_error)?;
        drop(file);
        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| InternalError::RenameFileError {
                from_path: temp_path.clone(),
                to_path: self.path.clone(),
            })
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn get(&self, code: &DeviceCode) -> Option<DeviceRecord> {
        let _guard = self.lock.lock().await;
        self.load_or_empty().await.remove(code)
    }

    async fn put(&self, code: DeviceCode, record: DeviceRecord) -> anyhow::Result<DeviceRecord> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.insert(code, record.clone());
        self.persist(&records).await?;
        Ok(record)
    }

    async fn delete(&self, code: &DeviceCode) -> anyhow::Result<bool> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        if records.remove(code).is_none() {
            return Ok(false);
        }
        self.persist(&records).await?;
        Ok(true)
    }

    async fn list(&self) -> Vec<(DeviceCode, DeviceRecord)> {
        let _guard = self.lock.lock().await;
        self.load_or_empty().await.into_iter().collect()
    }
}

/// Hand-edited files may carry unnormalized keys. When several keys fold to
/// the same code, a key already in normal form wins, otherwise the
/// lexicographically first raw key does.
fn normalize_keys(raw: BTreeMap<String, DeviceRecord>) -> Records {
    let mut records = Records::new();
    let mut sources: BTreeMap<DeviceCode, String> = BTreeMap::new();
    for (key, record) in raw {
        let Some(code) = DeviceCode::parse(&key) else {
            tracing::warn!("Dropping record with blank device code {:?}", key);
            continue;
        };
        let Some(kept) = sources.get(&code).cloned() else {
            sources.insert(code.clone(), key);
            records.insert(code, record);
            continue;
        };
        let replace = key == code.as_str();
        tracing::warn!(
            device = %code,
            "Duplicate device code in records file, ignoring key {:?}",
            if replace { &kept } else { &key }
        );
        if replace {
            sources.insert(code.clone(), key);
            records.insert(code, record);
        }
    }
    records
}

/// Process-local store, used in tests and when no file is wanted.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<Records>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with the example record, the way a fresh data file does.
    pub fn seeded() -> Self {
        let mut records = Records::new();
        records.insert(DeviceCode::example(), DeviceRecord::example());
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, code: &DeviceCode) -> Option<DeviceRecord> {
        self.records.lock().await.get(code).cloned()
    }

    async fn put(&self, code: DeviceCode, record: DeviceRecord) -> anyhow::Result<DeviceRecord> {
        self.records.lock().await.insert(code, record.clone());
        Ok(record)
    }

    async fn delete(&self, code: &DeviceCode) -> anyhow::Result<bool> {
        Ok(self.records.lock().await.remove(code).is_some())
    }

    async fn list(&self) -> Vec<(DeviceCode, DeviceRecord)> {
        self.records
            .lock()
            .await
            .iter()
            .map(|(code, record)| (code.clone(), record.clone()))
            .collect()
    }
}
