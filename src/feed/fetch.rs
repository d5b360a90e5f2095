// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use bytes::Bytes;

use crate::error::FeedError;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// How often and how patiently a feed fetch is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::ZERO,
        }
    }
}

/// Fetch raw feed bytes from a URL (without parsing)
pub async fn fetch_feed<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, FeedError> {
    client
        .get_bytes(url)
        .await
        .map_err(|e| FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        })
}

/// Fetch raw feed bytes, retrying failed attempts up to `policy.attempts` times
///
/// Every attempt is reported so the caller can show retry progress. When the
/// last attempt fails, the final error is wrapped in `RetriesExhausted`.
pub async fn fetch_feed_with_retry<C: HttpClient>(
    client: &C,
    url: &str,
    policy: &RetryPolicy,
    reporter: &SharedProgressReporter,
) -> Result<Bytes, FeedError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        reporter.report(ProgressEvent::FetchingFeed {
            url: url.to_string(),
            attempt,
            max_attempts: attempts,
        });

        match fetch_feed(client, url).await {
            Ok(bytes) => {
                tracing::debug!("Fetched {} bytes from {} on attempt {}", bytes.len(), url, attempt);
                return Ok(bytes);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!("Feed fetch attempt {}/{} failed: {}", attempt, attempts, e);
                reporter.report(ProgressEvent::FetchFailed {
                    attempt,
                    max_attempts: attempts,
                    error: e.to_string(),
                });
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!("Feed fetch attempt {}/{} failed: {}", attempt, attempts, e);
                return Err(FeedError::RetriesExhausted {
                    url: url.to_string(),
                    attempts,
                    source: Box::new(e),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockHttpClient;
    use crate::progress::NoopReporter;

    #[tokio::test]
    async fn fetch_returns_feed_bytes() {
        let client = MockHttpClient::with_feed("<rss/>");
        let bytes = fetch_feed(&client, "http://x.com/rss").await.unwrap();
        assert_eq!(&bytes[..], b"<rss/>");
    }

    #[tokio::test]
    async fn fetch_wraps_http_failure() {
        let client = MockHttpClient::failing_feed();
        match fetch_feed(&client, "http://x.com/rss").await {
            Err(FeedError::FetchFailed { url, .. }) => assert_eq!(url, "http://x.com/rss"),
            other => panic!("Expected FetchFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn retry_stops_after_first_success() {
        let client = MockHttpClient::with_feed("<rss/>");
        fetch_feed_with_retry(
            &client,
            "http://x.com/rss",
            &RetryPolicy::default(),
            &NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(client.feed_requests().len(), 1);
    }

    #[tokio::test]
    async fn retry_makes_exactly_ten_attempts_by_default() {
        let client = MockHttpClient::failing_feed();
        let result = fetch_feed_with_retry(
            &client,
            "http://x.com/rss",
            &RetryPolicy::default(),
            &NoopReporter::shared(),
        )
        .await;

        match result {
            Err(FeedError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 10),
            other => panic!("Expected RetriesExhausted, got {:?}", other),
        }
        assert_eq!(client.feed_requests().len(), 10);
    }

    #[tokio::test]
    async fn retry_honours_custom_attempt_count() {
        let client = MockHttpClient::failing_feed();
        let policy = RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(1),
        };

        let result =
            fetch_feed_with_retry(&client, "http://x.com/rss", &policy, &NoopReporter::shared())
                .await;

        assert!(result.is_err());
        assert_eq!(client.feed_requests().len(), 3);
    }
}
