//! Bounded streaming fetch of remote documents.
//!
//! ### Size ceiling
//! - A declared `Content-Length` above the ceiling fails before the body is read.
//! - The body is read chunk by chunk; the download aborts as soon as the next
//!   chunk would push the buffer past the ceiling, so memory stays bounded.
//!
//! ### Sources
//! - `http` / `https` via reqwest (redirects limited, rustls, compressed bodies decoded)
//! - `file` when enabled in configuration
//!
//! The whole fetch runs under a deadline. Dropping the future cancels it.

pub mod url;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tokio_util::io::ReaderStream;

pub use self::url::{UrlError, canonicalize};

use doccache_core::{AppConfig, Error};

/// Read size for local file sources.
pub const FILE_CHUNK_SIZE: usize = 4096;

/// Source of remote document bytes.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` in full, failing once more than `max_bytes` arrive.
    ///
    /// # Errors
    ///
    /// - `Error::UnreachableSource` when the source cannot be opened or read
    /// - `Error::ContentTooLarge` when the ceiling is exceeded
    async fn fetch(&self, url: &str, max_bytes: usize) -> Result<Bytes, Error>;
}

/// Accumulate a byte stream, aborting once it grows past `max_bytes`.
///
/// Exactly `max_bytes` bytes is accepted. The partial buffer is dropped on
/// every failure.
pub async fn read_bounded<S, E>(stream: S, max_bytes: usize) -> Result<Bytes, Error>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut buf = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::UnreachableSource(format!("read failed: {e}")))?;
        if buf.len() + chunk.len() > max_bytes {
            return Err(Error::ContentTooLarge { limit: max_bytes });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "doccache/0.1")
    pub user_agent: String,

    /// Deadline for the whole fetch (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Whether `file://` URLs are accepted (default: false)
    pub allow_file_urls: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "doccache/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            allow_file_urls: false,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
            allow_file_urls: config.allow_file_urls,
        }
    }
}

/// HTTP(S) and local-file fetcher.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::InvalidInput(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    async fn fetch_url(&self, url: &Url, max_bytes: usize) -> Result<Bytes, Error> {
        match url.scheme() {
            "file" => self.fetch_file(url, max_bytes).await,
            _ => self.fetch_http(url, max_bytes).await,
        }
    }

    async fn fetch_http(&self, url: &Url, max_bytes: usize) -> Result<Bytes, Error> {
        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::UnreachableSource(format!("network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnreachableSource(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len > max_bytes as u64
        {
            return Err(Error::ContentTooLarge { limit: max_bytes });
        }

        read_bounded(response.bytes_stream(), max_bytes).await
    }

    async fn fetch_file(&self, url: &Url, max_bytes: usize) -> Result<Bytes, Error> {
        let path = url
            .to_file_path()
            .map_err(|_| Error::UnreachableSource(format!("not a local path: {url}")))?;

        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| Error::UnreachableSource(format!("{}: {e}", path.display())))?;

        read_bounded(ReaderStream::with_capacity(file, FILE_CHUNK_SIZE), max_bytes).await
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url_str: &str, max_bytes: usize) -> Result<Bytes, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str, self.config.allow_file_urls)
            .map_err(|e| Error::UnreachableSource(e.to_string()))?;

        let bytes = tokio::time::timeout(self.config.timeout, self.fetch_url(&url, max_bytes))
            .await
            .map_err(|_| {
                Error::UnreachableSource(format!("timed out after {}ms", self.config.timeout.as_millis()))
            })??;

        tracing::debug!(url = %url, bytes = bytes.len(), fetch_ms = start.elapsed().as_millis() as u64, "fetched");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::convert::Infallible;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const MIB: usize = 1024 * 1024;

    fn chunks(sizes: &[usize]) -> impl Stream<Item = Result<Bytes, Infallible>> {
        let items: Vec<_> = sizes.iter().map(|&n| Ok(Bytes::from(vec![7u8; n]))).collect();
        stream::iter(items)
    }

    /// Serve a single raw HTTP/1.1 response on a local port and return its URL.
    async fn serve_once(head: String, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            // the client may hang up mid-body
            let _ = socket.write_all(&body).await;
            let _ = socket.read(&mut buf).await;
        });

        format!("http://{addr}/image.png")
    }

    fn chunked_body(total: usize, chunk: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(total + total / chunk * 16 + 8);
        let mut left = total;
        while left > 0 {
            let n = left.min(chunk);
            out.extend_from_slice(format!("{n:x}\r\n").as_bytes());
            out.extend(std::iter::repeat_n(0xFFu8, n));
            out.extend_from_slice(b"\r\n");
            left -= n;
        }
        out.extend_from_slice(b"0\r\n\r\n");
        out
    }

    fn chunked_head() -> String {
        "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n"
            .to_string()
    }

    fn http_fetcher() -> HttpFetcher {
        HttpFetcher::new(FetchConfig { timeout: Duration::from_secs(5), ..Default::default() }).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "doccache/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
        assert!(!config.allow_file_urls);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { timeout_ms: 1500, allow_file_urls: true, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert!(config.allow_file_urls);
    }

    #[tokio::test]
    async fn test_read_bounded_within_limit() {
        let bytes = read_bounded(chunks(&[4096, 4096, 100]), 10_000).await.unwrap();
        assert_eq!(bytes.len(), 8292);
    }

    #[tokio::test]
    async fn test_read_bounded_exact_limit() {
        let bytes = read_bounded(chunks(&[500, 500]), 1000).await.unwrap();
        assert_eq!(bytes.len(), 1000);
    }

    #[tokio::test]
    async fn test_read_bounded_one_past_limit() {
        let result = read_bounded(chunks(&[500, 501]), 1000).await;
        assert!(matches!(result, Err(Error::ContentTooLarge { limit: 1000 })));
    }

    #[tokio::test]
    async fn test_read_bounded_stops_early() {
        let mut pulled = 0usize;
        let source = stream::iter(std::iter::repeat_with(|| Ok::<_, Infallible>(Bytes::from(vec![0u8; 4096]))))
            .inspect(|_| pulled += 1);

        let result = read_bounded(source, 3 * 4096).await;
        assert!(matches!(result, Err(Error::ContentTooLarge { .. })));
        assert_eq!(pulled, 4);
    }

    #[tokio::test]
    async fn test_read_bounded_stream_error() {
        let items = vec![Ok(Bytes::from_static(b"abc")), Err("connection reset")];
        let result = read_bounded(stream::iter(items), 1000).await;
        assert!(matches!(result, Err(Error::UnreachableSource(msg)) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_fetcher_new() {
        assert!(HttpFetcher::new(FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let result = fetcher.fetch("", 1024).await;
        assert!(matches!(result, Err(Error::UnreachableSource(_))));

        let result = fetcher.fetch("file:///etc/hostname", 1024).await;
        assert!(matches!(result, Err(Error::UnreachableSource(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:1/image.png", 1024).await;
        assert!(matches!(result, Err(Error::UnreachableSource(_))));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1u8; 10_000]).unwrap();
        let url = Url::from_file_path(file.path()).unwrap();

        let fetcher = HttpFetcher::new(FetchConfig { allow_file_urls: true, ..Default::default() }).unwrap();
        let bytes = fetcher.fetch(url.as_str(), 10_000).await.unwrap();
        assert_eq!(bytes.len(), 10_000);

        let result = fetcher.fetch(url.as_str(), 9_999).await;
        assert!(matches!(result, Err(Error::ContentTooLarge { limit: 9_999 })));
    }

    #[tokio::test]
    async fn test_fetch_missing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("absent.png")).unwrap();

        let fetcher = HttpFetcher::new(FetchConfig { allow_file_urls: true, ..Default::default() }).unwrap();
        let result = fetcher.fetch(url.as_str(), 1024).await;
        assert!(matches!(result, Err(Error::UnreachableSource(_))));
    }

    #[tokio::test]
    async fn test_fetch_http_chunked_over_limit() {
        let url = serve_once(chunked_head(), chunked_body(2 * MIB, 64 * 1024)).await;

        let result = http_fetcher().fetch(&url, MIB).await;
        assert!(matches!(result, Err(Error::ContentTooLarge { limit }) if limit == MIB));
    }

    #[tokio::test]
    async fn test_fetch_http_chunked_one_past_limit() {
        let url = serve_once(chunked_head(), chunked_body(10_241, 4096)).await;

        let result = http_fetcher().fetch(&url, 10_240).await;
        assert!(matches!(result, Err(Error::ContentTooLarge { limit: 10_240 })));
    }

    #[tokio::test]
    async fn test_fetch_http_declared_length_over_limit() {
        // headers only: reading the body would stall until the deadline
        let head = format!("HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\n\r\n", 2 * MIB);
        let url = serve_once(head, Vec::new()).await;

        let result = http_fetcher().fetch(&url, MIB).await;
        assert!(matches!(result, Err(Error::ContentTooLarge { limit }) if limit == MIB));
    }

    #[tokio::test]
    async fn test_fetch_http_not_found() {
        let head = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string();
        let url = serve_once(head, Vec::new()).await;

        let result = http_fetcher().fetch(&url, MIB).await;
        assert!(matches!(result, Err(Error::UnreachableSource(ref msg)) if msg == "status 404"));
    }

    #[tokio::test]
    async fn test_fetch_http_exact_limit() {
        let body = vec![0xABu8; 10_240];
        let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 10240\r\nConnection: close\r\n\r\n"
            .to_string();
        let url = serve_once(head, body.clone()).await;

        let bytes = http_fetcher().fetch(&url, 10_240).await.unwrap();
        assert_eq!(bytes.as_ref(), body.as_slice());
    }
}
