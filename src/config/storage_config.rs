use crate::config::root_dir;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: String::from("data/activations.json"),
        }
    }
}

impl StorageConfig {
    pub const IN_MEMORY: &'static str = ":memory:";

    pub fn is_in_memory(&self) -> bool {
        self.data_file.trim() == Self::IN_MEMORY
    }

    /// Resolves `data_file` against the working directory when it is relative.
    pub fn parse_path(&self) -> PathBuf {
        let path = std::path::Path::new(&self.data_file).to_path_buf();
        if path.is_absolute() {
            path
        } else {
            root_dir().join(path)
        }
    }
}
