use crate::domain::ports::Downloader;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Thin reqwest wrapper used by the installer for link checks and downloads.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Downloader for HttpFetcher {
    /// Returns whether `link` answers a HEAD request with 200 OK.
    async fn verify_link(&self, link: &str) -> Result<bool> {
        let response = self.client.head(link).send().await?;
        tracing::debug!("HEAD {} -> {}", link, response.status());
        Ok(response.status() == StatusCode::OK)
    }

    /// Streams `link` into `dest`, returning the number of bytes written.
    async fn download(&self, link: &str, dest: &Path) -> Result<u64> {
        let mut response = self.client.get(link).send().await?.error_for_status()?;
        let mut file = File::create(dest).await?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}
