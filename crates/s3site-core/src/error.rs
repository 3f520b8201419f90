use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to walk directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// ソケット・FIFO・デバイスファイルなど、通常ファイルでもディレクトリでもないパス
    #[error("Unsupported special file (socket, FIFO, device file): {}", .0.display())]
    UnsupportedPath(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
