use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum InternalError {
    #[error("Failed to create directory {path:?}")]
    CreateDirectoryError { path: PathBuf },

    #[error("Failed to read file {path:?}")]
    ReadFileError { path: PathBuf },
    #[error("Failed to write to file {path:?}")]
    WriteFileError { path: PathBuf },

    #[error("Failed to rename file from {from_path:?} to {to_path:?}")]
    RenameFileError {
        from_path: PathBuf,
        to_path: PathBuf,
    },

    #[error("Failed to parse records from {path:?}")]
    ParseRecordsError { path: PathBuf },
    #[error("Failed to serialize records for {path:?}")]
    SerializeRecordsError { path: PathBuf },
}
