use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredDocument {
    pub path: PathBuf,
    pub size_bytes: usize,
}

/// Where retrieved document bytes end up once the service has rendered them.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn deliver(&self, bytes: Vec<u8>) -> Result<DeliveredDocument>;
}

pub struct MissingDocumentSink;

#[async_trait]
impl DocumentSink for MissingDocumentSink {
    async fn deliver(&self, _bytes: Vec<u8>) -> Result<DeliveredDocument> {
        Err(anyhow!("document sink is unavailable"))
    }
}

pub struct FileDocumentSink {
    dir: PathBuf,
    file_name: String,
}

impl FileDocumentSink {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn target_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

#[async_trait]
impl DocumentSink for FileDocumentSink {
    async fn deliver(&self, bytes: Vec<u8>) -> Result<DeliveredDocument> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create output directory '{}'", self.dir.display()))?;

        let path = self.target_path();
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write document to '{}'", path.display()))?;

        info!(path = %path.display(), size_bytes = bytes.len(), "document saved");
        Ok(DeliveredDocument {
            path,
            size_bytes: bytes.len(),
        })
    }
}
