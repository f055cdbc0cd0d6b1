// src/fetch/mod.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::{path::PathBuf, time::Duration};
use tokio::{fs, time::sleep};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Where the sales CSV is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// `http://` or `https://` resource.
    Remote(Url),
    /// Local file, given as a bare path or a `file://` URL.
    File(PathBuf),
}

impl DataSource {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(anyhow!("empty data source"));
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(raw).with_context(|| format!("parsing data URL {}", raw))?;
            return Ok(DataSource::Remote(url));
        }
        if lower.starts_with("file://") {
            let url = Url::parse(raw).with_context(|| format!("parsing file URL {}", raw))?;
            let path = url
                .to_file_path()
                .map_err(|_| anyhow!("file URL has no local path: {}", raw))?;
            return Ok(DataSource::File(path));
        }

        Ok(DataSource::File(PathBuf::from(raw)))
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Remote(u) => write!(f, "{}", u),
            DataSource::File(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Retry settings for the remote fetch. `max_retries = 0` means a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }
}

/// HTTP client whose requests give up after `timeout`, so a stalled server
/// surfaces as an error (and a retry) instead of a hang.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("building HTTP client")
}

async fn get_text_core(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching text from {}", url);
    client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))
}

async fn get_text_with_retry(client: &Client, url: &Url, retry: RetryPolicy) -> Result<String> {
    let mut attempts = 0;
    loop {
        match get_text_core(client, url).await {
            Ok(t) => return Ok(t),
            Err(e) if attempts < retry.max_retries => {
                attempts += 1;
                let backoff = retry.backoff(attempts);
                warn!(%url, attempt = attempts, delay_ms = backoff.as_millis() as u64, error = %e, "Retrying");
                sleep(backoff).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Giving up on dataset fetch");
                return Err(e);
            }
        }
    }
}

/// Read the raw CSV text of the dataset.
#[instrument(level = "info", skip(client, source, retry), fields(source = %source))]
pub async fn fetch_dataset_text(
    client: &Client,
    source: &DataSource,
    retry: RetryPolicy,
) -> Result<String> {
    let text = match source {
        DataSource::Remote(url) => get_text_with_retry(client, url, retry).await?,
        DataSource::File(path) => fs::read_to_string(path)
            .await
            .with_context(|| format!("reading dataset file {}", path.display()))?,
    };
    info!(bytes = text.len(), "dataset fetched");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_sources() -> Result<()> {
        assert!(matches!(
            DataSource::parse("https://example.com/a.csv")?,
            DataSource::Remote(_)
        ));
        assert_eq!(
            DataSource::parse("data/sales.csv")?,
            DataSource::File(PathBuf::from("data/sales.csv"))
        );
        assert_eq!(
            DataSource::parse("file:///tmp/sales.csv")?,
            DataSource::File(PathBuf::from("/tmp/sales.csv"))
        );
        assert!(DataSource::parse("   ").is_err());
        Ok(())
    }

    #[test]
    fn backoff_doubles() {
        let retry = RetryPolicy {
            max_retries: 3,
            initial_backoff_ms: 100,
        };
        assert_eq!(retry.backoff(1), Duration::from_millis(100));
        assert_eq!(retry.backoff(2), Duration::from_millis(200));
        assert_eq!(retry.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn reads_local_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, "Year,Month\n1980,Jan\n")?;

        let source = DataSource::File(tmp.path().to_path_buf());
        let text = fetch_dataset_text(&Client::new(), &source, RetryPolicy::default()).await?;
        assert!(text.starts_with("Year,Month"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let source = DataSource::File(PathBuf::from("/definitely/not/here.csv"));
        let err = fetch_dataset_text(&Client::new(), &source, RetryPolicy::default())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("reading dataset file"));
    }

    #[tokio::test]
    async fn stalled_remote_times_out_and_retries() -> Result<()> {
        // accepts connections, never writes a byte
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepted = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((sock, _)) = listener.accept().await {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                held.push(sock);
            }
        });

        let client = build_client(Duration::from_millis(200))?;
        let url = Url::parse(&format!("http://{}/sales.csv", addr))?;
        let retry = RetryPolicy {
            max_retries: 2,
            initial_backoff_ms: 1,
        };
        let res = tokio::time::timeout(
            Duration::from_secs(5),
            fetch_dataset_text(&client, &DataSource::Remote(url), retry),
        )
        .await
        .expect("fetch should not hang");

        assert!(res.is_err());
        assert_eq!(accepted.load(std::sync::atomic::Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_remote_fails_after_retries() {
        let url = Url::parse("http://127.0.0.1:9/sales.csv").unwrap();
        let retry = RetryPolicy {
            max_retries: 1,
            initial_backoff_ms: 1,
        };
        let res = fetch_dataset_text(&Client::new(), &DataSource::Remote(url), retry).await;
        assert!(res.is_err());
    }
}
