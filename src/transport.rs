// Feed Transport
// reqwest GET turned into a buffered async reader; non-success status is an error

use crate::error::FetchError;
use bytes::Bytes;
use futures::stream::{BoxStream, TryStreamExt};
use reqwest::{header, Client, Response};
use std::io;
use std::time::Duration;
use tokio_util::io::StreamReader;
use tracing::debug;

/// Default timeout for feed requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent header sent with every request
const USER_AGENT: &str = concat!("patent-feed/", env!("CARGO_PKG_VERSION"));

/// Response body as an `AsyncBufRead`. Dropping it releases the connection.
pub type FeedReader = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

/// HTTP client shared by the feed, download and link helpers
#[derive(Debug, Clone)]
pub struct FeedClient {
    http_client: Client,
}

impl FeedClient {
    /// Create a client with the default timeout
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http_client })
    }

    /// GET `url`, failing on any non-success status
    ///
    /// # Errors
    /// * `FetchError::Request` - connection or protocol failure
    /// * `FetchError::Status` - server answered with a non-2xx status
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        debug!(url = %url, "GET");
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response)
    }

    /// Open `url` as a line source for the extractor
    pub async fn open(&self, url: &str) -> Result<FeedReader, FetchError> {
        let response = self.get(url).await?;
        Ok(into_reader(response))
    }
}

/// Adapt a response body into an `AsyncBufRead`
///
/// Body errors surface as `io::Error` from the reader, which the extractor
/// reports as a stream read failure.
pub fn into_reader(response: Response) -> FeedReader {
    let body: BoxStream<'static, io::Result<Bytes>> = Box::pin(
        response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
    );
    StreamReader::new(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(FeedClient::new().is_ok());
        assert!(FeedClient::with_timeout(Duration::from_millis(250)).is_ok());
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("patent-feed/"));
        assert!(USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            url: "http://example.com/feed.csv".to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        assert_eq!(err.to_string(), "getting http://example.com/feed.csv: Not Found");
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    }
}
