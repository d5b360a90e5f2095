// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::HttpError;

/// A streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// HTTP response with status, content length, and body stream
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Length header value, if present
    pub content_length: Option<u64>,
    /// Response body as a stream of bytes
    pub body: ByteStream,
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch the entire response body as bytes. Non-success statuses are errors.
    async fn get_bytes(&self, url: &str) -> Result<Bytes, HttpError>;

    /// Get a streaming response for large downloads
    async fn get_stream(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new ReqwestClient with default settings (no request timeout)
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<Bytes, HttpError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?)
    }

    async fn get_stream(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();

        let body: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map(|result| result.map_err(HttpError::from)),
        );

        Ok(HttpResponse {
            status,
            content_length,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    /// Canned HTTP client: serves one feed document and one media payload,
    /// and records every URL it was asked for.
    pub(crate) struct MockHttpClient {
        feed_xml: Option<String>,
        audio_data: Vec<u8>,
        failing_media: HashSet<String>,
        interrupted_media: HashSet<String>,
        send_content_length: bool,
        feed_requests: Mutex<Vec<String>>,
        media_requests: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub(crate) fn with_feed(feed_xml: &str) -> Self {
            Self {
                feed_xml: Some(feed_xml.to_string()),
                audio_data: b"fake audio".to_vec(),
                failing_media: HashSet::new(),
                interrupted_media: HashSet::new(),
                send_content_length: true,
                feed_requests: Mutex::new(Vec::new()),
                media_requests: Mutex::new(Vec::new()),
            }
        }

        /// A client whose feed requests always answer 503
        pub(crate) fn failing_feed() -> Self {
            Self {
                feed_xml: None,
                ..Self::with_feed("")
            }
        }

        pub(crate) fn audio(mut self, data: &[u8]) -> Self {
            self.audio_data = data.to_vec();
            self
        }

        pub(crate) fn fail_media(mut self, url: &str) -> Self {
            self.failing_media.insert(url.to_string());
            self
        }

        /// Serve the first half of the payload for `url`, then a stream error
        pub(crate) fn interrupt_media(mut self, url: &str) -> Self {
            self.interrupted_media.insert(url.to_string());
            self
        }

        pub(crate) fn without_content_length(mut self) -> Self {
            self.send_content_length = false;
            self
        }

        pub(crate) fn feed_requests(&self) -> Vec<String> {
            self.feed_requests.lock().unwrap().clone()
        }

        pub(crate) fn media_requests(&self) -> Vec<String> {
            self.media_requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, url: &str) -> Result<Bytes, HttpError> {
            self.feed_requests.lock().unwrap().push(url.to_string());
            match &self.feed_xml {
                Some(xml) => Ok(Bytes::from(xml.clone())),
                None => Err(HttpError::Status(503)),
            }
        }

        async fn get_stream(&self, url: &str) -> Result<HttpResponse, HttpError> {
            self.media_requests.lock().unwrap().push(url.to_string());

            if self.failing_media.contains(url) {
                let body: ByteStream = Box::pin(futures::stream::empty());
                return Ok(HttpResponse {
                    status: 404,
                    content_length: None,
                    body,
                });
            }

            let data = self.audio_data.clone();
            let len = data.len() as u64;
            let body: ByteStream = if self.interrupted_media.contains(url) {
                let head = Bytes::from(data[..data.len() / 2].to_vec());
                Box::pin(futures::stream::iter(vec![
                    Ok(head),
                    Err(HttpError::Status(502)),
                ]))
            } else {
                Box::pin(futures::stream::once(async move { Ok(Bytes::from(data)) }))
            };

            Ok(HttpResponse {
                status: 200,
                content_length: self.send_content_length.then_some(len),
                body,
            })
        }
    }
}
