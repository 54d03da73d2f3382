use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Copy chunk size for upload streaming: 16 KB
const COPY_CHUNK_SIZE: usize = 16 * 1024;

/// Byte store addressable by a generated object name. Local-disk semantics,
/// but the contract only requires atomic-enough create and reliable delete.
#[async_trait]
pub trait AudioStorage: Send + Sync {
    /// Stream the reader into the object, returning the number of bytes
    /// written. A partially written object is left in place on error; the
    /// caller is responsible for compensation via `delete`.
    async fn save_stream<'a>(
        &self,
        name: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64>;

    /// Authoritative byte size of a persisted object.
    async fn stat(&self, name: &str) -> Result<u64>;

    /// Open the object for streaming reads.
    async fn open_stream(&self, name: &str) -> Result<tokio::fs::File>;

    /// Remove the object. Removing a missing object is not an error.
    async fn delete(&self, name: &str) -> Result<()>;
}

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

#[async_trait]
impl AudioStorage for LocalStorage {
    async fn save_stream<'a>(
        &self,
        name: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<u64> {
        let path = self.object_path(name);
        let mut file = tokio::fs::File::create(&path).await?;

        let mut buffer = [0u8; COPY_CHUNK_SIZE];
        let mut total: u64 = 0;

        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n]).await?;
            total += n as u64;
        }
        file.flush().await?;

        Ok(total)
    }

    async fn stat(&self, name: &str) -> Result<u64> {
        let meta = tokio::fs::metadata(self.object_path(name)).await?;
        Ok(meta.len())
    }

    async fn open_stream(&self, name: &str) -> Result<tokio::fs::File> {
        let file = tokio::fs::File::open(self.object_path(name)).await?;
        Ok(file)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match tokio::fs::remove_file(self.object_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_stat_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let data = b"abcdef".to_vec();
        let written = storage
            .save_stream("obj.mp3", Box::new(std::io::Cursor::new(data)))
            .await
            .unwrap();
        assert_eq!(written, 6);
        assert_eq!(storage.stat("obj.mp3").await.unwrap(), 6);

        storage.delete("obj.mp3").await.unwrap();
        assert!(storage.stat("obj.mp3").await.is_err());

        // Deleting again is not an error
        storage.delete("obj.mp3").await.unwrap();
    }

    #[tokio::test]
    async fn test_open_stream_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage
            .save_stream("x.wav", Box::new(std::io::Cursor::new(vec![1u8; 40_000])))
            .await
            .unwrap();

        let mut file = storage.open_stream("x.wav").await.unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).await.unwrap();
        assert_eq!(out.len(), 40_000);
    }
}
