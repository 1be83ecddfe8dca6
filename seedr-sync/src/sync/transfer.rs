use std::{io, path::Path, time::Duration};

use futures_util::StreamExt;
use indicatif::ProgressBar;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::progress;

/// Ceiling for one whole transfer, sized for very large files on slow links.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60 * 60);

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("download returned status {0}")]
    Status(StatusCode),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("transfer interrupted after {written} bytes: {source}")]
    Interrupted {
        written: u64,
        #[source]
        source: reqwest::Error,
    },
    #[error("write failed after {written} bytes: {source}")]
    Write {
        written: u64,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// Whether the target file was created before the failure.
    pub fn left_partial_file(&self) -> bool {
        matches!(
            self,
            TransferError::Interrupted { .. } | TransferError::Write { .. }
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransferConfig {
    pub timeout: Duration,
    /// Remove the target when a transfer fails part way through.
    pub discard_partial: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            discard_partial: false,
        }
    }
}

#[derive(Clone)]
pub struct TransferClient {
    http: Client,
    discard_partial: bool,
}

impl TransferClient {
    pub fn new() -> Result<Self, TransferError> {
        Self::with_config(TransferConfig::default())
    }

    pub fn with_config(config: TransferConfig) -> Result<Self, TransferError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            discard_partial: config.discard_partial,
        })
    }

    /// Streams `href` into `target`, overwriting any existing file, and
    /// returns the number of bytes written. The target is only created once
    /// the server answers with a success status.
    pub async fn download_to_path(
        &self,
        href: &Url,
        target: &Path,
        bar: &ProgressBar,
    ) -> Result<u64, TransferError> {
        let response = self.http.get(href.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status(status));
        }
        if let Some(total) = response.content_length() {
            progress::set_total(bar, total);
        }

        let mut file = tokio::fs::File::create(target).await?;
        let result = stream_body(response, &mut file, bar).await;
        drop(file);

        if let Err(err) = &result {
            if self.discard_partial && err.left_partial_file() {
                // The failure is what gets reported; a leftover file is only cosmetic.
                let _ = tokio::fs::remove_file(target).await;
            }
        }
        result
    }
}

async fn stream_body(
    response: reqwest::Response,
    file: &mut tokio::fs::File,
    bar: &ProgressBar,
) -> Result<u64, TransferError> {
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| TransferError::Interrupted { written, source })?;
        file.write_all(&chunk)
            .await
            .map_err(|source| TransferError::Write { written, source })?;
        written += chunk.len() as u64;
        bar.inc(chunk.len() as u64);
    }

    file.flush()
        .await
        .map_err(|source| TransferError::Write { written, source })?;
    Ok(written)
}
