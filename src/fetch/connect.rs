//! Connection setup: DNS, TCP and TLS phases of one hop.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use log::debug;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use url::Url;

use super::FetchOptions;
use crate::dns::DnsBackend;
use crate::error_handling::FetchError;

/// Byte stream the HTTP exchange runs over, TLS or not.
pub(super) trait Io: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// An established connection and the offsets at which each phase finished.
pub(super) struct Connected {
    pub stream: Box<dyn Io>,
    pub remote_ip: IpAddr,
    pub host_header: String,
    pub dns_at: Duration,
    pub tcp_at: Duration,
    pub tls_at: Duration,
}

pub(super) async fn connect(
    url: &Url,
    dns: &dyn DnsBackend,
    tls: &TlsConnector,
    options: &FetchOptions,
    start: Instant,
) -> Result<Connected, FetchError> {
    let host = url
        .host_str()
        .ok_or_else(|| FetchError::protocol(url.as_str(), "URL has no host"))?;
    let (is_https, default_port, standard_port) = match url.scheme() {
        "http" => (false, options.http_port, 80),
        "https" => (true, options.https_port, 443),
        other => {
            return Err(FetchError::protocol(
                url.as_str(),
                format!("unsupported scheme {other}"),
            ))
        }
    };
    let port = url.port().unwrap_or(default_port);

    // IPv6 literals keep their brackets in host_str
    let lookup_host = host.trim_start_matches('[').trim_end_matches(']');
    let addresses = dns
        .lookup_ip(lookup_host)
        .await
        .map_err(|e| FetchError::connect(url.as_str(), e))?;
    let dns_at = start.elapsed();

    let (tcp, remote_ip) = connect_first_reachable(&addresses, port)
        .await
        .map_err(|e| FetchError::connect(url.as_str(), e))?;
    // Requests are written whole; do not wait on Nagle
    let _ = tcp.set_nodelay(true);
    let tcp_at = start.elapsed();

    let (stream, tls_at): (Box<dyn Io>, Duration) = if is_https {
        let server_name = ServerName::try_from(lookup_host.to_string())
            .map_err(|e| FetchError::protocol(url.as_str(), e))?;
        let tls_stream = tls
            .connect(server_name, tcp)
            .await
            .map_err(|e| FetchError::protocol(url.as_str(), format!("TLS handshake failed: {e}")))?;
        (Box::new(tls_stream), start.elapsed())
    } else {
        (Box::new(tcp), tcp_at)
    };

    let host_header = if port == standard_port {
        host.to_string()
    } else {
        format!("{host}:{port}")
    };

    Ok(Connected {
        stream,
        remote_ip,
        host_header,
        dns_at,
        tcp_at,
        tls_at,
    })
}

/// Tries each address in resolver order; the caller's deadline bounds the walk.
async fn connect_first_reachable(
    addresses: &[IpAddr],
    port: u16,
) -> Result<(TcpStream, IpAddr), String> {
    let mut last_error = None;
    for &ip in addresses {
        match TcpStream::connect(SocketAddr::new(ip, port)).await {
            Ok(tcp) => return Ok((tcp, ip)),
            Err(e) => {
                debug!("Connect to {ip}:{port} failed: {e}");
                last_error = Some(format!("{ip}:{port}: {e}"));
            }
        }
    }
    Err(last_error.unwrap_or_else(|| "no addresses".to_string()))
}
