//! Cycle-level errors. Any of these aborts the current update cycle and sends
//! the scheduler down the backoff path; none of them terminate the process.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// Failures while fetching the registry into a temporary file.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("error creating temporary file: {0}")]
    TempFile(#[source] io::Error),

    #[error("error creating http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("error doing http request to {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("unexpected http status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("error reading response body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("error writing to temporary file: {0}")]
    Write(#[source] io::Error),
}

/// Failures while turning the downloaded CSV into the temporary metric file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("error opening OUI CSV file {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("error parsing OUI CSV file: {0}")]
    Csv(#[from] csv::Error),

    #[error("OUI CSV record on line {line} has {found} columns, expected at least 3")]
    MissingColumns { line: u64, found: usize },

    #[error("error opening temporary OUI metric file {}: {source}", path.display())]
    CreateOutput { path: PathBuf, source: io::Error },

    #[error("error writing to temporary OUI metric file {}: {source}", path.display())]
    WriteOutput { path: PathBuf, source: io::Error },

    #[error("parse worker did not complete: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
#[error("error renaming OUI metric file {} to {}: {source}", from.display(), to.display())]
pub struct PublishError {
    pub from: PathBuf,
    pub to: PathBuf,
    pub source: io::Error,
}
