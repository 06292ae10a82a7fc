//! Bounded-timeout page fetching with phase timing.
//!
//! A fetch resolves the target through the shared `DnsBackend`, connects over
//! TCP, performs the TLS handshake for `https://` URLs, then runs one HTTP/1.1
//! exchange with `hyper`. Each phase is timestamped against the same start
//! instant, producing cumulative `PhaseTimings`.
//!
//! Two deadlines apply to every call:
//! - the connect deadline bounds DNS + TCP + TLS of one hop
//! - the total deadline bounds the whole fetch, redirects included

mod connect;
mod response;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use bytes::BytesMut;
use http_body_util::Empty;
use hyper::header::{ACCEPT, CONNECTION, HOST, LOCATION, USER_AGENT};
use hyper::Request;
use hyper_util::rt::TokioIo;
use log::debug;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use url::Url;

use crate::config::{NetworkConfig, MAX_REDIRECT_HOPS};
use crate::dns::DnsBackend;
use crate::error_handling::FetchError;
use crate::models::PhaseTimings;

/// Per-fetch settings derived from `NetworkConfig`.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Deadline for DNS + TCP + TLS of one hop
    pub connect_timeout: Duration,
    /// Deadline for the whole fetch
    pub total_timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Port for `http://` URLs without an explicit port
    pub http_port: u16,
    /// Port for `https://` URLs without an explicit port
    pub https_port: u16,
}

impl From<&NetworkConfig> for FetchOptions {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            total_timeout: config.total_timeout,
            user_agent: config.user_agent.clone(),
            http_port: config.http_port,
            https_port: config.https_port,
        }
    }
}

/// Outcome of a completed fetch. Non-2xx statuses are results too.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL of the last request made (after redirects)
    pub final_url: Url,
    /// HTTP status of the last response
    pub status: u16,
    /// Response body, truncated at `MAX_RESPONSE_BODY_SIZE`
    pub body: Bytes,
    /// Lowercased `charset` parameter of `Content-Type`, if declared
    pub encoding: Option<String>,
    /// Address of the last connection
    pub remote_ip: IpAddr,
    /// Cumulative phase offsets of the last hop, from the first request's start
    pub timings: PhaseTimings,
}

/// Fetches pages over HTTP/1.1 with per-call deadlines.
///
/// Cheap to share: the resolver and TLS connector are reference counted and
/// used read-only.
#[derive(Clone)]
pub struct Fetcher {
    dns: Arc<dyn DnsBackend>,
    tls: TlsConnector,
    options: FetchOptions,
}

impl Fetcher {
    /// Creates a fetcher over the given resolver and TLS connector.
    pub fn new(dns: Arc<dyn DnsBackend>, tls: TlsConnector, options: FetchOptions) -> Self {
        Self { dns, tls, options }
    }

    /// Fetches `url`, following at most `MAX_REDIRECT_HOPS` redirects.
    ///
    /// # Errors
    ///
    /// - `FetchError::Timeout` when the total or connect deadline expires
    /// - `FetchError::ConnectFailure` when the host does not resolve or refuses
    /// - `FetchError::ProtocolError` for TLS, HTTP or redirect failures
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::protocol(url, e))?;
        timeout(self.options.total_timeout, self.fetch_following_redirects(parsed))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                after: self.options.total_timeout,
            })?
    }

    async fn fetch_following_redirects(&self, mut url: Url) -> Result<FetchResult, FetchError> {
        let start = Instant::now();
        let mut hops = 0;
        loop {
            let hop = self.fetch_once(&url, start).await?;
            let location = hop
                .location
                .as_deref()
                .filter(|_| (300..400).contains(&hop.result.status));

            match location {
                Some(location) if hops < MAX_REDIRECT_HOPS => {
                    let next = url
                        .join(location)
                        .map_err(|e| FetchError::protocol(url.as_str(), format!("bad redirect target {location:?}: {e}")))?;
                    if !matches!(next.scheme(), "http" | "https") {
                        return Err(FetchError::protocol(
                            url.as_str(),
                            format!("redirect to unsupported scheme: {next}"),
                        ));
                    }
                    debug!("Following redirect {url} -> {next}");
                    url = next;
                    hops += 1;
                }
                _ => return Ok(hop.result),
            }
        }
    }

    async fn fetch_once(&self, url: &Url, start: Instant) -> Result<Hop, FetchError> {
        let connected = timeout(
            self.options.connect_timeout,
            connect::connect(url, &*self.dns, &self.tls, &self.options, start),
        )
        .await
        .map_err(|_| FetchError::Timeout {
            url: url.to_string(),
            after: self.options.connect_timeout,
        })??;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(connected.stream))
            .await
            .map_err(|e| FetchError::protocol(url.as_str(), e))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("HTTP connection closed with error: {e}");
            }
        });

        let request = Request::builder()
            .uri(&url[url::Position::BeforePath..])
            .header(HOST, connected.host_header)
            .header(USER_AGENT, self.options.user_agent.as_str())
            .header(ACCEPT, "*/*")
            .header(CONNECTION, "close")
            .body(Empty::<Bytes>::new())
            .map_err(|e| FetchError::protocol(url.as_str(), e))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| FetchError::protocol(url.as_str(), e))?;
        let head_at = start.elapsed();

        let status = response.status().as_u16();
        let encoding = response::charset(response.headers());
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response::read_body(response.into_body(), url.as_str(), start).await?;
        let ttfb_at = body.first_byte_at.unwrap_or(head_at);

        Ok(Hop {
            result: FetchResult {
                final_url: url.clone(),
                status,
                body: body.bytes,
                encoding,
                remote_ip: connected.remote_ip,
                timings: PhaseTimings::from_offsets(
                    connected.dns_at,
                    connected.tcp_at,
                    connected.tls_at,
                    ttfb_at,
                    body.finished_at,
                ),
            },
            location,
        })
    }
}

struct Hop {
    result: FetchResult,
    location: Option<String>,
}

/// Body bytes with arrival offsets.
struct BodyRead {
    bytes: Bytes,
    first_byte_at: Option<Duration>,
    finished_at: Duration,
}

impl BodyRead {
    fn new(buf: BytesMut, first_byte_at: Option<Duration>, finished_at: Duration) -> Self {
        Self {
            bytes: buf.freeze(),
            first_byte_at,
            finished_at,
        }
    }
}
