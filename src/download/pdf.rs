//! Streaming PDF download with signature check and atomic placement.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::error::DownloadError;
use crate::http::{HttpClient, HttpError};

/// Every PDF starts with these bytes.
pub const PDF_MAGIC: &[u8; 5] = b"%PDF-";

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReceipt {
    /// Final location of the PDF.
    pub path: PathBuf,
    /// Size of the written file.
    pub bytes_written: u64,
}

/// Downloads a PDF to a destination path.
///
/// The orchestrator depends on this trait so tests can substitute fakes.
#[async_trait]
pub trait PdfFetcher: Send + Sync {
    /// Downloads `url` to `destination`.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::AlreadyExists`] if `destination` exists and `force` is false
    /// - [`DownloadError::InvalidContent`] if the body is not a PDF
    /// - [`DownloadError::Http`] / [`DownloadError::Io`] for transport and disk failures
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        force: bool,
    ) -> Result<DownloadReceipt, DownloadError>;
}

/// Production [`PdfFetcher`] built on the shared [`HttpClient`].
///
/// The body is streamed into `<destination>.part` and renamed over the
/// destination only once it is complete and starts with `%PDF-`, so a failed
/// download never leaves a file behind.
#[derive(Debug, Clone)]
pub struct PdfDownloader {
    http: HttpClient,
}

impl PdfDownloader {
    /// Creates a downloader using `http` for requests.
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PdfFetcher for PdfDownloader {
    #[instrument(skip(self), fields(url = %url, dest = %destination.display()))]
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        force: bool,
    ) -> Result<DownloadReceipt, DownloadError> {
        let exists = tokio::fs::try_exists(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        if exists && !force {
            debug!("destination exists, not overwriting");
            return Err(DownloadError::already_exists(destination));
        }

        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let response = self
            .http
            .get(url, &[])
            .await
            .map_err(|e| DownloadError::http(url, e))?;

        let part_path = part_path(destination);
        let written = match stream_pdf(response, url, &part_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %part_path.display(), "cleaning up partial file after error");
                remove_quietly(&part_path).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part_path, destination).await {
            remove_quietly(&part_path).await;
            return Err(DownloadError::io(destination, e));
        }

        info!(bytes = written, path = %destination.display(), "PDF saved");
        Ok(DownloadReceipt {
            path: destination.to_path_buf(),
            bytes_written: written,
        })
    }
}

/// Returns whether the file at `path` starts with `%PDF-`.
///
/// # Errors
///
/// Returns the IO error if the file cannot be opened or read.
pub async fn has_pdf_magic(path: &Path) -> std::io::Result<bool> {
    let file = File::open(path).await?;
    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    file.take(PDF_MAGIC.len() as u64).read_to_end(&mut head).await?;
    Ok(head == PDF_MAGIC)
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to remove partial file");
    }
}

/// Streams the body into `part_path`, checking the signature as soon as the
/// first five bytes have arrived. Returns bytes written.
async fn stream_pdf(
    response: reqwest::Response,
    url: &str,
    part_path: &Path,
) -> Result<u64, DownloadError> {
    let file = File::create(part_path)
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut head: Vec<u8> = Vec::with_capacity(PDF_MAGIC.len());
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::http(url, HttpError::body(url, e)))?;

        if head.len() < PDF_MAGIC.len() {
            let needed = (PDF_MAGIC.len() - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..needed]);
            if head.len() == PDF_MAGIC.len() && head != PDF_MAGIC {
                return Err(DownloadError::invalid_content(
                    url,
                    format!("body starts with {:?}", String::from_utf8_lossy(&head)),
                ));
            }
        }

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(part_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    if head.is_empty() {
        return Err(DownloadError::invalid_content(url, "empty body"));
    }
    if head.len() < PDF_MAGIC.len() {
        return Err(DownloadError::invalid_content(
            url,
            format!("body too short ({bytes_written} bytes)"),
        ));
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;

    Ok(bytes_written)
}
