//! Bounded HTTP fetches with streaming SHA-256 computation.
//!
//! Every call carries an explicit timeout on top of the client's own
//! per-request limit; redirects are bounded by the client policy.

use std::time::Duration;

use assay_schema::Sha256Digest;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("{url} timed out after {}s", .after.as_secs())]
    Timeout { url: String, after: Duration },
}

async fn get_ok(client: &Client, url: &str) -> Result<reqwest::Response, DownloadError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(resp)
}

/// Download `url` and hash the body as it streams in.
///
/// The body is never buffered in full. Dropping the future (or hitting
/// `timeout`) aborts the transfer.
///
/// # Errors
///
/// Returns an error on transport failure, a non-success status, or timeout.
pub async fn hash_url(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Sha256Digest, DownloadError> {
    let work = async {
        let resp = get_ok(client, url).await?;
        let mut hasher = Sha256::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            hasher.update(&chunk?);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Ok::<_, DownloadError>(Sha256Digest::from(bytes))
    };

    tokio::time::timeout(timeout, work)
        .await
        .map_err(|_| DownloadError::Timeout {
            url: url.to_string(),
            after: timeout,
        })?
}

/// Fetch a small text document such as a checksum file.
///
/// # Errors
///
/// Returns an error on transport failure, a non-success status, or timeout.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<String, DownloadError> {
    let work = async { Ok::<_, DownloadError>(get_ok(client, url).await?.text().await?) };
    tokio::time::timeout(timeout, work)
        .await
        .map_err(|_| DownloadError::Timeout {
            url: url.to_string(),
            after: timeout,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn stalled_body(w: &mut dyn Write) -> std::io::Result<()> {
        std::thread::sleep(Duration::from_secs(1));
        w.write_all(b"late")
    }

    #[tokio::test]
    async fn test_hash_url_streams_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/tool.tar.gz")
            .with_status(200)
            .with_body("hello world")
            .create_async()
            .await;

        let url = format!("{}/tool.tar.gz", server.url());
        let digest = hash_url(&Client::new(), &url, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            digest.as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing.zip", server.url());
        let err = hash_url(&Client::new(), &url, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Status { status, .. } if status == StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/checksums.txt")
            .with_status(200)
            .with_body("abc  tool.tar.gz\n")
            .create_async()
            .await;

        let url = format!("{}/checksums.txt", server.url());
        let text = fetch_text(&Client::new(), &url, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text, "abc  tool.tar.gz\n");
    }

    #[tokio::test]
    async fn test_stalled_transfer_times_out() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/slow.tar.gz")
            .with_status(200)
            .with_chunked_body(stalled_body)
            .create_async()
            .await;

        let url = format!("{}/slow.tar.gz", server.url());
        let limit = Duration::from_millis(100);

        let err = hash_url(&Client::new(), &url, limit).await.unwrap_err();
        assert!(matches!(err, DownloadError::Timeout { after, .. } if after == limit));

        let err = fetch_text(&Client::new(), &url, limit).await.unwrap_err();
        assert!(matches!(err, DownloadError::Timeout { after, .. } if after == limit));
    }
}
