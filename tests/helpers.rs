// Shared test helpers: a static resolver and Host-routed local HTTP(S) servers.
//
// Integration tests never touch the network. Every name resolves to 127.0.0.1
// (except `*.invalid`) and the local server picks the page by Host header.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdn_survey::dns::fqdn;
use cdn_survey::{DnsBackend, LookupError, NetworkConfig, SurveyContext};
use rcgen::{generate_simple_self_signed, CertifiedKey};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::{TlsAcceptor, TlsConnector};

/// Resolver stub answering from fixed tables.
#[derive(Default)]
pub struct StaticDns {
    /// Canonical-name overrides; other names canonicalize to themselves
    pub aliases: HashMap<String, String>,
    /// CNAME records keyed by FQDN
    pub cnames: HashMap<String, String>,
    /// TXT records keyed by query name
    pub txt: HashMap<String, Vec<String>>,
}

#[async_trait]
impl DnsBackend for StaticDns {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        if host.ends_with(".invalid") {
            return Err(LookupError::NotFound {
                name: host.to_string(),
                record: "A/AAAA",
            });
        }
        Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
    }

    async fn canonical_name(&self, host: &str) -> Result<String, LookupError> {
        if host.ends_with(".invalid") {
            return Err(LookupError::NotFound {
                name: host.to_string(),
                record: "canonical name",
            });
        }
        Ok(self
            .aliases
            .get(host)
            .cloned()
            .unwrap_or_else(|| fqdn(host)))
    }

    async fn cname(&self, name: &str) -> Result<Option<String>, LookupError> {
        Ok(self.cnames.get(name).cloned())
    }

    async fn txt(&self, name: &str) -> Result<Vec<String>, LookupError> {
        self.txt.get(name).cloned().ok_or_else(|| LookupError::NotFound {
            name: name.to_string(),
            record: "TXT",
        })
    }
}

/// Serves `pages[host]` as `text/html` for any path. Hosts starting with
/// `hang.` never answer; unknown hosts get a 404.
pub async fn spawn_site_server(pages: HashMap<String, String>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let port = listener.local_addr().expect("local addr").port();
    let pages = Arc::new(pages);

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(answer(socket, Arc::clone(&pages)));
        }
    });

    port
}

/// Same routing as `spawn_site_server`, behind TLS with a self-signed
/// certificate for `hosts`. Returns the port and a connector trusting it.
pub async fn spawn_tls_site_server(
    hosts: &[&str],
    pages: HashMap<String, String>,
) -> (u16, TlsConnector) {
    let CertifiedKey { cert, key_pair } =
        generate_simple_self_signed(hosts.iter().map(|h| h.to_string()).collect::<Vec<_>>())
            .expect("Failed to generate certificate");
    let cert_der: CertificateDer<'static> = cert.der().clone();
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let server_config = ServerConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert_der.clone()], key_der)
        .expect("server certificate");
    let acceptor = TlsAcceptor::from(Arc::new(server_config));

    let mut roots = RootCertStore::empty();
    roots.add(cert_der).expect("trust anchor");
    let mut client_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_root_certificates(roots)
        .with_no_client_auth();
    client_config.alpn_protocols = vec![b"http/1.1".to_vec()];

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let port = listener.local_addr().expect("local addr").port();
    let pages = Arc::new(pages);

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            let pages = Arc::clone(&pages);
            tokio::spawn(async move {
                if let Ok(stream) = acceptor.accept(socket).await {
                    answer(stream, pages).await;
                }
            });
        }
    });

    (port, TlsConnector::from(Arc::new(client_config)))
}

async fn answer<S>(mut socket: S, pages: Arc<HashMap<String, String>>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf).to_string();
    let host = request
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("host").then(|| value.trim().to_string())
        })
        .unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default().to_string();

    if host.starts_with("hang.") {
        tokio::time::sleep(Duration::from_secs(60)).await;
        return;
    }

    let reply = match pages.get(&host) {
        Some(body) => format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string(),
    };
    let _ = socket.write_all(reply.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Network settings pointing both schemes at the local server.
pub fn local_config(port: u16, total_timeout: Duration) -> NetworkConfig {
    NetworkConfig {
        max_concurrency: 4,
        connect_timeout: Duration::from_secs(2),
        total_timeout,
        user_agent: "cdn_survey-test".to_string(),
        http_port: port,
        https_port: port,
    }
}

/// Builds a survey context over `dns` and the local server.
pub fn local_context(port: u16, total_timeout: Duration, dns: StaticDns) -> Arc<SurveyContext> {
    Arc::new(
        SurveyContext::with_dns(&local_config(port, total_timeout), Arc::new(dns))
            .expect("Failed to build survey context"),
    )
}

/// Builds a survey context whose `https://` fetches trust `tls`.
pub fn local_tls_context(
    port: u16,
    total_timeout: Duration,
    dns: StaticDns,
    tls: TlsConnector,
) -> Arc<SurveyContext> {
    Arc::new(SurveyContext::with_dns_and_tls(
        &local_config(port, total_timeout),
        Arc::new(dns),
        tls,
    ))
}
