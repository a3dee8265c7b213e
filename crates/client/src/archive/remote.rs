//! Byte-range access to remote files over HTTP.

use async_trait::async_trait;
use bytes::Bytes;
use metagen_core::Error;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, StatusCode, Url};

use crate::fetch::retry::with_retry;
use crate::fetch::send;

/// Random access into a large remote file without downloading all of it.
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Human-readable location of the file, used in error messages.
    fn describe(&self) -> &str;

    /// Read the last `len` bytes (or the whole file when it is shorter)
    /// and return them together with the file's total size.
    async fn read_suffix(&self, len: u64) -> Result<(Bytes, u64), Error>;

    /// Read `len` bytes starting at `start`.
    async fn read_range(&self, start: u64, len: u64) -> Result<Bytes, Error>;
}

/// [`RangeSource`] backed by HTTP `Range` requests.
///
/// A server that ignores the `Range` header and answers `200` with the
/// full file is tolerated; the requested window is sliced out locally.
pub struct HttpRangeSource {
    http: Client,
    url: Url,
}

impl HttpRangeSource {
    pub fn new(http: Client, url: Url) -> Self {
        Self { http, url }
    }

    async fn ranged_get(&self, range: String) -> Result<reqwest::Response, Error> {
        let what = format!("GET '{}' ({range})", self.url);
        with_retry(&what, || {
            let request = self.http.get(self.url.clone()).header(header::RANGE, range.as_str());
            send(request, "GET", &self.url, false)
        })
        .await
    }

    async fn body(&self, response: reqwest::Response) -> Result<Bytes, Error> {
        response.bytes().await.map_err(|err| Error::Network {
            method: "GET",
            url: self.url.to_string(),
            reason: err.to_string(),
        })
    }

    fn total_size(&self, headers: &HeaderMap) -> Result<u64, Error> {
        headers
            .get(header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.rsplit('/').next())
            .and_then(|total| total.parse().ok())
            .ok_or_else(|| Error::Archive {
                url: self.url.to_string(),
                reason: "partial response without a usable Content-Range header".into(),
            })
    }
}

#[async_trait]
impl RangeSource for HttpRangeSource {
    fn describe(&self) -> &str {
        self.url.as_str()
    }

    async fn read_suffix(&self, len: u64) -> Result<(Bytes, u64), Error> {
        let response = self.ranged_get(format!("bytes=-{len}")).await?;
        if response.status() == StatusCode::PARTIAL_CONTENT {
            let total = self.total_size(response.headers())?;
            Ok((self.body(response).await?, total))
        } else {
            let body = self.body(response).await?;
            let total = body.len() as u64;
            let start = body.len().saturating_sub(len as usize);
            Ok((body.slice(start..), total))
        }
    }

    async fn read_range(&self, start: u64, len: u64) -> Result<Bytes, Error> {
        if len == 0 {
            return Ok(Bytes::new());
        }
        let end = start + len - 1;
        let response = self.ranged_get(format!("bytes={start}-{end}")).await?;
        if response.status() == StatusCode::PARTIAL_CONTENT {
            return self.body(response).await;
        }
        let body = self.body(response).await?;
        let range = start as usize..(start + len) as usize;
        if range.end > body.len() {
            return Err(Error::Archive {
                url: self.url.to_string(),
                reason: format!("requested range {start}..={end} past the end of a {} byte file", body.len()),
            });
        }
        Ok(body.slice(range))
    }
}
