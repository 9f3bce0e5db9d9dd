//! Staging of uploaded files on local disk.
//!
//! A [`StagedFile`] owns a temporary file for the lifetime of one request. It
//! is removed by [`StagedFile::discard`] or, on any other exit path, when the
//! value is dropped.

use std::path::Path;

use anyhow::Context;
use axum::extract::multipart::Field;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::ApiResult;

pub struct StagedFile {
    file: NamedTempFile,
    content_type: String,
    size: u64,
}

impl StagedFile {
    /// Streams a multipart field into a fresh temporary file under `dir`.
    pub async fn stage(mut field: Field<'_>, dir: &Path) -> ApiResult<Self> {
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());

        let file = create_in(dir)?;
        let mut out = tokio::fs::File::from_std(file.reopen().context("reopen staged file")?);
        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await? {
            out.write_all(&chunk).await.context("write staged file")?;
            size += chunk.len() as u64;
        }
        out.flush().await.context("flush staged file")?;

        debug!(path = %file.path().display(), size, %content_type, "upload staged");
        Ok(Self {
            file,
            content_type,
            size,
        })
    }

    /// Stages an in-memory buffer.
    #[cfg(test)]
    pub fn from_bytes(dir: &Path, data: &[u8], content_type: &str) -> anyhow::Result<Self> {
        use std::io::Write;

        let mut file = create_in(dir)?;
        file.write_all(data).context("write staged file")?;
        file.flush().context("flush staged file")?;
        Ok(Self {
            file,
            content_type: content_type.to_string(),
            size: data.len() as u64,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn read(&self) -> anyhow::Result<Bytes> {
        let data = tokio::fs::read(self.path())
            .await
            .with_context(|| format!("read staged file {}", self.path().display()))?;
        Ok(Bytes::from(data))
    }

    /// Deletes the staged file now. Failures are only logged.
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(error = %e, path = %path.display(), "failed to remove staged file");
        }
    }
}

fn create_in(dir: &Path) -> anyhow::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(dir)
        .with_context(|| format!("create staged file in {}", dir.display()))
}
