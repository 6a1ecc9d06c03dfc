use reqwest::Client;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::Config;
use crate::error::DownloadError;

/// Download the OUI registry CSV into a fresh temporary file.
///
/// The returned [`TempPath`] deletes the file when dropped, so on any error
/// the partial download is already gone by the time the caller sees it.
pub async fn update(config: &Config) -> Result<TempPath, DownloadError> {
    let (file, path) = tempfile::Builder::new()
        .prefix("oui")
        .suffix(".csv")
        .tempfile_in(&config.download_dir)
        .map_err(DownloadError::TempFile)?
        .into_parts();
    let mut file = File::from_std(file);

    let client = Client::builder()
        .timeout(config.http_timeout)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(DownloadError::Client)?;

    let url = config.registry_url.as_str();
    debug!(url, path = %path.display(), "Downloading OUI database");

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|source| DownloadError::Request {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let mut bytes = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| DownloadError::Body {
            url: url.to_string(),
            source,
        })?
    {
        file.write_all(&chunk).await.map_err(DownloadError::Write)?;
        bytes += chunk.len() as u64;
    }
    file.flush().await.map_err(DownloadError::Write)?;

    debug!(bytes, "Downloaded OUI database");
    Ok(path)
}
