use std::sync::Arc;

use hyper_rustls::ConfigBuilderExt as _;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls;

use super::Result;

pub(super) fn connector() -> Result<TlsConnector> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_webpki_roots()
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsConnector::from(Arc::new(config)))
}
