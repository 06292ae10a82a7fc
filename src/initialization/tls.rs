//! TLS connector initialization.

use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error_handling::InitializationError;

/// Builds the TLS connector used for `https://` fetches.
///
/// Uses the `ring` crypto provider explicitly, so no process-wide default
/// provider has to be installed, and trusts the Mozilla root store shipped in
/// `webpki-roots`. Only HTTP/1.1 is offered via ALPN because the fetcher
/// speaks HTTP/1.1.
///
/// # Errors
///
/// Returns `InitializationError::TlsConfigError` if the provider rejects the
/// default protocol versions.
pub fn init_tls_connector() -> Result<TlsConnector, InitializationError> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let mut config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(root_store)
            .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsConnector::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tls_connector() {
        assert!(init_tls_connector().is_ok());
    }
}
