//! Disk-cached HTTP client.
//!
//! Every fetch runs inside the cache's exclusive access window for its
//! key, so concurrent fetches of the same resource collapse into one
//! network round trip plus cache hits.

pub mod retry;
pub mod strategy;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use metagen_core::{CacheEntry, CacheUpdate, DiskCache, Error};
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::archive::{HttpRangeSource, RemoteArchive};
use retry::with_retry;
pub use strategy::{DigestAlgorithm, ExpectedDigest, FreshnessStrategy};

/// Settings for one [`CachedClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Value of the `User-Agent` header on every request.
    pub user_agent: String,
    /// Directory the client's cache namespace lives in.
    pub dir: PathBuf,
    /// Serve any cached body without revalidation, as if every strategy
    /// were [`FreshnessStrategy::Eternal`].
    pub assume_up_to_date: bool,
}

/// A fetched response, served from cache or freshly stored.
#[derive(Debug, Clone)]
pub struct Response {
    pub e_tag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub body: String,
}

impl Response {
    fn new(entry: &CacheEntry, body: String) -> Self {
        Self { e_tag: entry.e_tag.clone(), last_modified: entry.last_modified, body }
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Validators for a resource probed with `HEAD`, without its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub e_tag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One file wanted out of a remote archive.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    /// Path of the entry inside the archive.
    pub path: String,
    /// Cache key its content is stored under.
    pub key: String,
}

/// HTTP client whose responses are persisted in a [`DiskCache`].
#[derive(Clone)]
pub struct CachedClient {
    http: Client,
    cache: DiskCache,
    assume_up_to_date: bool,
}

impl CachedClient {
    pub fn new(options: ClientOptions) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&options.user_agent)
            .use_rustls_tls()
            .build()
            .map_err(|err| Error::ClientInit(err.to_string()))?;
        Ok(Self {
            http,
            cache: DiskCache::new(options.dir),
            assume_up_to_date: options.assume_up_to_date,
        })
    }

    /// Fetch `url`, caching the body under `key` and revalidating any
    /// cached body according to `strategy`.
    pub async fn get_cached(
        &self,
        url: &Url,
        key: &str,
        strategy: FreshnessStrategy,
    ) -> Result<Response, Error> {
        self.cache
            .with_entry(key, |entry| async move {
                let cached = entry.read().await?;

                if let Some(existing) = &cached
                    && let Some(body) = &existing.body
                {
                    if self.assume_up_to_date || strategy == FreshnessStrategy::Eternal {
                        tracing::debug!("serving '{key}' from cache without revalidation");
                        return Ok(Response::new(existing, body.value.clone()));
                    }
                    if let FreshnessStrategy::CompareLocalDigest { algorithm, expected } = &strategy {
                        if strategy::body_matches(body, *algorithm, expected)? {
                            tracing::debug!("cached '{key}' matches the expected digest");
                            return Ok(Response::new(existing, body.value.clone()));
                        }
                        tracing::debug!("cached '{key}' no longer matches the expected digest");
                    }
                }

                // The entity tag wins over the timestamp when both are
                // stored; sending both would be redundant.
                let revalidating = strategy == FreshnessStrategy::ConditionalRequest
                    && cached.as_ref().is_some_and(CacheEntry::has_body);

                let what = format!("GET '{url}'");
                let response = with_retry(&what, || {
                    let mut request = self.http.get(url.clone());
                    if revalidating
                        && let Some(existing) = &cached
                    {
                        if let Some(e_tag) = &existing.e_tag {
                            request = request.header(header::IF_NONE_MATCH, e_tag.as_str());
                        } else if let Some(last_modified) = existing.last_modified {
                            request = request.header(header::IF_MODIFIED_SINCE, http_date(last_modified));
                        }
                    }
                    send(request, "GET", url, revalidating)
                })
                .await?;

                if response.status() == StatusCode::NOT_MODIFIED {
                    // only reachable when we sent validators, which
                    // requires a cached body
                    if let Some(existing) = cached
                        && let Some(body) = existing.body.clone()
                    {
                        tracing::debug!("'{key}' not modified, serving cached body");
                        return Ok(Response::new(&existing, body.value));
                    }
                    return Err(Error::HttpStatus { method: "GET", url: url.to_string(), status: 304 });
                }

                let (e_tag, last_modified) = validators(response.headers(), url)?;
                let body = response.text().await.map_err(|err| Error::Network {
                    method: "GET",
                    url: url.to_string(),
                    reason: err.to_string(),
                })?;
                let merged = entry.write(CacheUpdate::with_body(e_tag, last_modified, body.clone())).await?;
                tracing::debug!("stored fresh body for '{key}'");
                Ok(Response::new(&merged, body))
            })
            .await
    }

    /// Probe `url` with `HEAD` and cache its validators under `key`.
    ///
    /// Any existing entry, even a metadata-only one, is served without
    /// touching the network: validators of already-probed resources are
    /// treated as immutable.
    pub async fn head_cached(&self, url: &Url, key: &str) -> Result<Metadata, Error> {
        self.cache
            .with_entry(key, |entry| async move {
                if let Some(existing) = entry.read().await? {
                    tracing::debug!("serving metadata for '{key}' from cache");
                    return Ok(Metadata { e_tag: existing.e_tag, last_modified: existing.last_modified });
                }

                let what = format!("HEAD '{url}'");
                let response =
                    with_retry(&what, || send(self.http.head(url.clone()), "HEAD", url, false)).await?;
                let (e_tag, last_modified) = validators(response.headers(), url)?;
                let merged = entry.write(CacheUpdate::validators(e_tag, last_modified)).await?;
                tracing::debug!("stored metadata for '{key}'");
                Ok(Metadata { e_tag: merged.e_tag, last_modified: merged.last_modified })
            })
            .await
    }

    /// Extract `files` from the zip archive at `url`, serving and filling
    /// the cache per entry. Results come back in input order; a path the
    /// archive does not contain yields `None` in its slot.
    ///
    /// The archive is only touched when at least one requested entry is
    /// missing from the cache, and reading stops as soon as every slot
    /// is filled.
    pub async fn unzip_cached(
        &self,
        url: &Url,
        files: &[ArchiveRequest],
    ) -> Result<Vec<Option<String>>, Error> {
        let keys: Vec<String> = files.iter().map(|f| f.key.clone()).collect();
        self.cache
            .with_entries(&keys, |refs| async move {
                let mut results: Vec<Option<String>> = vec![None; files.len()];
                for (slot, entry) in results.iter_mut().zip(&refs) {
                    if let Some(cached) = entry.read().await?
                        && let Some(body) = cached.body
                    {
                        *slot = Some(body.value);
                    }
                }
                if results.iter().all(Option::is_some) {
                    tracing::debug!("serving all {} entries of '{url}' from cache", files.len());
                    return Ok(results);
                }

                let archive = RemoteArchive::new(HttpRangeSource::new(self.http.clone(), url.clone()));
                for archive_entry in archive.entries().await? {
                    let Some(index) = files.iter().position(|f| f.path == archive_entry.name) else {
                        continue;
                    };
                    if results[index].is_some() {
                        continue;
                    }

                    let content = archive.read_entry(&archive_entry).await?;
                    refs[index]
                        .write(CacheUpdate { body: Some(content.clone()), ..CacheUpdate::default() })
                        .await?;
                    tracing::debug!("cached entry '{}' of '{url}'", archive_entry.name);
                    results[index] = Some(content);

                    if results.iter().all(Option::is_some) {
                        break;
                    }
                }
                Ok(results)
            })
            .await
    }
}

/// Issue one request and map the status per the failure taxonomy: any
/// transport error and any status outside 2xx (or 304 while
/// revalidating) is an error, including 204 since an empty body is
/// useless to every caller.
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    method: &'static str,
    url: &Url,
    allow_not_modified: bool,
) -> Result<reqwest::Response, Error> {
    let response = request.send().await.map_err(|err| Error::Network {
        method,
        url: url.to_string(),
        reason: err.to_string(),
    })?;

    let status = response.status();
    let acceptable = (status.is_success() && status != StatusCode::NO_CONTENT)
        || (allow_not_modified && status == StatusCode::NOT_MODIFIED);
    if !acceptable {
        return Err(Error::HttpStatus { method, url: url.to_string(), status: status.as_u16() });
    }
    Ok(response)
}

fn http_date(stamp: DateTime<Utc>) -> String {
    stamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn validators(headers: &HeaderMap, url: &Url) -> Result<(Option<String>, Option<DateTime<Utc>>), Error> {
    let e_tag = headers
        .get(header::ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let last_modified = headers
        .get(header::LAST_MODIFIED)
        .map(|value| {
            let raw = value.to_str().map_err(|err| {
                Error::Validation(format!("unreadable Last-Modified header from '{url}': {err}"))
            })?;
            DateTime::parse_from_rfc2822(raw)
                .map(|stamp| stamp.with_timezone(&Utc))
                .map_err(|_| {
                    Error::Validation(format!("unparseable Last-Modified header '{raw}' from '{url}'"))
                })
        })
        .transpose()?;
    Ok((e_tag, last_modified))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::path::Path;

    use chrono::TimeZone;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};
    use zip::CompressionMethod;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn client(dir: &Path) -> CachedClient {
        client_with(dir, false)
    }

    fn client_with(dir: &Path, assume_up_to_date: bool) -> CachedClient {
        CachedClient::new(ClientOptions {
            user_agent: "metagen-tests/0.0".into(),
            dir: dir.into(),
            assume_up_to_date,
        })
        .unwrap()
    }

    async fn seed(dir: &Path, key: &str, update: CacheUpdate) {
        DiskCache::new(dir)
            .with_entry(key, |entry| async move {
                entry.write(update).await?;
                Ok(())
            })
            .await
            .unwrap()
    }

    async fn stored_entry(dir: &Path, key: &str) -> Option<CacheEntry> {
        DiskCache::new(dir)
            .with_entry(key, |entry| async move { entry.read().await })
            .await
            .unwrap()
    }

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[tokio::test]
    async fn test_eternal_serves_cache_without_network() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), "k", CacheUpdate::with_body(None, None, "cached".into())).await;
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let response = client(dir.path())
            .get_cached(&url, "k", FreshnessStrategy::Eternal)
            .await
            .unwrap();

        assert_eq!(response.body, "cached");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assume_up_to_date_overrides_strategy() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), "k", CacheUpdate::with_body(None, None, "cached".into())).await;
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let response = client_with(dir.path(), true)
            .get_cached(&url, "k", FreshnessStrategy::ConditionalRequest)
            .await
            .unwrap();

        assert_eq!(response.body, "cached");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conditional_not_modified_serves_cached_body() {
        let dir = TempDir::new().unwrap();
        seed(
            dir.path(),
            "k",
            CacheUpdate::with_body(Some("\"v1\"".into()), Some(ts(2024, 1, 1, 0, 0, 0)), "old".into()),
        )
        .await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res"))
            .and(header("if-none-match", "\"v1\""))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let response = client(dir.path())
            .get_cached(&url, "k", FreshnessStrategy::ConditionalRequest)
            .await
            .unwrap();

        assert_eq!(response.body, "old");
        assert_eq!(response.e_tag.as_deref(), Some("\"v1\""));
        // the entity tag wins; the timestamp must not also be sent
        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("if-modified-since").is_none());
    }

    #[tokio::test]
    async fn test_conditional_uses_timestamp_without_etag() {
        let dir = TempDir::new().unwrap();
        seed(
            dir.path(),
            "k",
            CacheUpdate::with_body(None, Some(ts(2015, 10, 21, 7, 28, 0)), "old".into()),
        )
        .await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res"))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let response = client(dir.path())
            .get_cached(&url, "k", FreshnessStrategy::ConditionalRequest)
            .await
            .unwrap();
        assert_eq!(response.body, "old");

        let requests = server.received_requests().await.unwrap();
        let sent = requests[0].headers.get("if-modified-since").unwrap();
        assert_eq!(sent.to_str().unwrap(), "Wed, 21 Oct 2015 07:28:00 GMT");
        assert!(requests[0].headers.get("if-none-match").is_none());
    }

    #[tokio::test]
    async fn test_changed_resource_replaces_entry() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), "k", CacheUpdate::with_body(Some("\"v1\"".into()), None, "old".into())).await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("etag", "\"v2\"")
                    .insert_header("last-modified", "Fri, 02 Feb 2024 10:00:00 GMT")
                    .set_body_string("new"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let response = client(dir.path())
            .get_cached(&url, "k", FreshnessStrategy::ConditionalRequest)
            .await
            .unwrap();

        assert_eq!(response.body, "new");
        assert_eq!(response.e_tag.as_deref(), Some("\"v2\""));
        let entry = stored_entry(dir.path(), "k").await.unwrap();
        assert_eq!(entry.e_tag.as_deref(), Some("\"v2\""));
        assert_eq!(entry.last_modified, Some(ts(2024, 2, 2, 10, 0, 0)));
        assert_eq!(entry.body.unwrap().value, "new");
    }

    #[tokio::test]
    async fn test_first_fetch_sends_no_validators() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
            .expect(1)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let response = client(dir.path())
            .get_cached(&url, "k", FreshnessStrategy::ConditionalRequest)
            .await
            .unwrap();

        assert_eq!(response.body, "fresh");
        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("if-none-match").is_none());
        assert!(requests[0].headers.get("if-modified-since").is_none());
    }

    #[tokio::test]
    async fn test_matching_digest_skips_network() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), "k", CacheUpdate::with_body(None, None, "abc".into())).await;
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let strategy = FreshnessStrategy::CompareLocalDigest {
            algorithm: DigestAlgorithm::Sha1,
            expected: ExpectedDigest::Hex("a9993e364706816aba3e25717850c26c9cd0d89d".into()),
        };
        let response = client(dir.path()).get_cached(&url, "k", strategy).await.unwrap();

        assert_eq!(response.body, "abc");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_digest_refetches_unconditionally() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), "k", CacheUpdate::with_body(Some("\"v1\"".into()), None, "stale".into())).await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res"))
            .respond_with(ResponseTemplate::new(200).set_body_string("abc"))
            .expect(1)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let strategy = FreshnessStrategy::CompareLocalDigest {
            algorithm: DigestAlgorithm::Sha1,
            expected: ExpectedDigest::Hex("a9993e364706816aba3e25717850c26c9cd0d89d".into()),
        };
        let response = client(dir.path()).get_cached(&url, "k", strategy).await.unwrap();

        assert_eq!(response.body, "abc");
        // digest revalidation never sends conditional headers
        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("if-none-match").is_none());
        assert_eq!(stored_entry(dir.path(), "k").await.unwrap().body.unwrap().value, "abc");
    }

    #[tokio::test]
    async fn test_head_serves_any_existing_entry() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), "k", CacheUpdate::validators(None, Some(ts(2024, 3, 3, 0, 0, 0)))).await;
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let metadata = client(dir.path()).head_cached(&url, "k").await.unwrap();

        assert_eq!(metadata.last_modified, Some(ts(2024, 3, 3, 0, 0, 0)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_head_stores_validators_without_body() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/res"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("etag", "\"h1\"")
                    .insert_header("last-modified", "Mon, 01 Jan 2024 00:00:00 GMT"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let metadata = client(dir.path()).head_cached(&url, "k").await.unwrap();

        assert_eq!(metadata.e_tag.as_deref(), Some("\"h1\""));
        let entry = stored_entry(dir.path(), "k").await.unwrap();
        assert!(!entry.has_body());
        assert_eq!(entry.last_modified, Some(ts(2024, 1, 1, 0, 0, 0)));
    }

    #[tokio::test]
    async fn test_unparseable_last_modified_fails_without_retry() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("last-modified", "three days ago")
                    .set_body_string("x"),
            )
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let err = client(dir.path())
            .get_cached(&url, "k", FreshnessStrategy::ConditionalRequest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_errors_retry_until_exhausted() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let err = client(dir.path())
            .get_cached(&url, "k", FreshnessStrategy::ConditionalRequest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), retry::MAX_ATTEMPTS as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_content_is_an_error() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/res"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/res", server.uri())).unwrap();

        let err = client(dir.path())
            .get_cached(&url, "k", FreshnessStrategy::ConditionalRequest)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::HttpStatus { status: 204, .. }));
    }

    // --- archive extraction ---

    struct RangeResponder(Vec<u8>);

    impl wiremock::Respond for RangeResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let total = self.0.len();
            let raw = request
                .headers
                .get("range")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("");
            let window = raw.trim_start_matches("bytes=");
            let (start, end) = if let Some(suffix) = window.strip_prefix('-') {
                let len: usize = suffix.parse().unwrap();
                (total.saturating_sub(len), total - 1)
            } else {
                let (start, end) = window.split_once('-').unwrap();
                (start.parse().unwrap(), end.parse::<usize>().unwrap().min(total - 1))
            };
            ResponseTemplate::new(206)
                .insert_header("content-range", format!("bytes {start}-{end}/{total}").as_str())
                .set_body_bytes(self.0[start..=end].to_vec())
        }
    }

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn requests(paths: &[(&str, &str)]) -> Vec<ArchiveRequest> {
        paths
            .iter()
            .map(|(path, key)| ArchiveRequest { path: (*path).into(), key: (*key).into() })
            .collect()
    }

    #[tokio::test]
    async fn test_unzip_fully_cached_skips_network() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), "a", CacheUpdate::with_body(None, None, "alpha".into())).await;
        seed(dir.path(), "b", CacheUpdate::with_body(None, None, "beta".into())).await;
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/pkg.jar", server.uri())).unwrap();

        let results = client(dir.path())
            .unzip_cached(&url, &requests(&[("a.json", "a"), ("b.json", "b")]))
            .await
            .unwrap();

        assert_eq!(results, [Some("alpha".to_string()), Some("beta".to_string())]);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unzip_extracts_missing_entries_and_caches_them() {
        let dir = TempDir::new().unwrap();
        seed(dir.path(), "a", CacheUpdate::with_body(None, None, "cached alpha".into())).await;
        let archive = build_zip(&[("a.json", "zipped alpha"), ("b.json", "zipped beta")]);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg.jar"))
            .respond_with(RangeResponder(archive))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/pkg.jar", server.uri())).unwrap();

        let results = client(dir.path())
            .unzip_cached(&url, &requests(&[("b.json", "b"), ("a.json", "a")]))
            .await
            .unwrap();

        // input order, with the cached entry untouched
        assert_eq!(results, [Some("zipped beta".to_string()), Some("cached alpha".to_string())]);
        assert_eq!(stored_entry(dir.path(), "b").await.unwrap().body.unwrap().value, "zipped beta");
        assert_eq!(stored_entry(dir.path(), "a").await.unwrap().body.unwrap().value, "cached alpha");
    }

    #[tokio::test]
    async fn test_unzip_missing_path_yields_none() {
        let dir = TempDir::new().unwrap();
        let archive = build_zip(&[("a.json", "alpha")]);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg.jar"))
            .respond_with(RangeResponder(archive))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/pkg.jar", server.uri())).unwrap();

        let results = client(dir.path())
            .unzip_cached(&url, &requests(&[("a.json", "a"), ("missing.json", "m")]))
            .await
            .unwrap();

        assert_eq!(results, [Some("alpha".to_string()), None]);
        assert!(stored_entry(dir.path(), "m").await.is_none());
    }

    #[tokio::test]
    async fn test_unzip_stops_after_last_wanted_entry() {
        let dir = TempDir::new().unwrap();
        let archive = build_zip(&[("first.json", "one"), ("second.json", "two")]);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pkg.jar"))
            .respond_with(RangeResponder(archive))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/pkg.jar", server.uri())).unwrap();

        let results = client(dir.path())
            .unzip_cached(&url, &requests(&[("first.json", "f")]))
            .await
            .unwrap();

        assert_eq!(results, [Some("one".to_string())]);
        // suffix read, then the one entry's local header and data;
        // second.json's bytes are never requested
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }
}
