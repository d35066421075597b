//! File inputs and async content hashing.

use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use fhv_core::{sha256_digest, CoreError, DigestBuilder, FileDigest, READ_CHUNK};

/// Content handed to a workflow operation.
#[derive(Debug, Clone)]
pub enum FileInput {
    /// A file on disk, streamed in chunks.
    Path(PathBuf),
    /// Bytes already in memory, with the name to show for them.
    Bytes { name: String, data: Vec<u8> },
}

impl FileInput {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// The file name shown to the user: the final path component for files.
    pub fn display_name(&self) -> String {
        match self {
            Self::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string()),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    /// SHA-256 of the content.
    pub async fn digest(&self) -> Result<FileDigest, CoreError> {
        match self {
            Self::Path(p) => digest_file(p).await,
            Self::Bytes { data, .. } => Ok(sha256_digest(data)),
        }
    }
}

/// Stream `path` through SHA-256 without loading it whole.
pub async fn digest_file(path: &Path) -> Result<FileDigest, CoreError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut builder = DigestBuilder::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        builder.update(&buf[..n]);
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_and_bytes_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..(READ_CHUNK * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let from_file = FileInput::path(&path).digest().await.unwrap();
        let from_bytes = FileInput::bytes("big.bin", data).digest().await.unwrap();
        assert_eq!(from_file, from_bytes);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = FileInput::path("/definitely/not/here.txt").digest().await.unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn display_name_uses_last_component() {
        assert_eq!(FileInput::path("/tmp/docs/report.pdf").display_name(), "report.pdf");
        assert_eq!(FileInput::bytes("memo.txt", b"x".to_vec()).display_name(), "memo.txt");
    }
}
