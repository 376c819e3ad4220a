//! Mutual-TLS server configuration.
//!
//! # Responsibilities
//! - Load local key and certificate chain
//! - Load the remote trust-anchor bundle for client verification
//! - Produce a server config that requires and verifies client certs
//!
//! Any unreadable or unparsable input is startup-fatal at the call
//! site; there is no partial or retried credential setup.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};

/// Error type for credential loading and TLS assembly.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("no certificates found in {0}")]
    NoCertificates(String),
    #[error("no private key found in {0}")]
    NoPrivateKey(String),
    #[error("invalid trust anchor in {path}: {source}")]
    TrustAnchor { path: String, source: rustls::Error },
    #[error("failed to build client verifier: {0}")]
    Verifier(#[from] rustls::server::VerifierBuilderError),
    #[error("invalid server certificate or key: {0}")]
    ServerConfig(#[from] rustls::Error),
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<_, _>>()
        .map_err(|source| TlsError::Read {
            path: path.display().to_string(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.display().to_string()));
    }
    Ok(certs)
}

fn read_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|source| TlsError::Read {
            path: path.display().to_string(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.display().to_string()))
}

/// Build a server-side TLS configuration that requires mutual
/// authentication.
///
/// `local_key` and `local_cert` identify this server; `remote_ca` is
/// the trust-anchor bundle client certificates must chain to.
pub async fn mutual_tls_config(
    local_key: &Path,
    local_cert: &Path,
    remote_ca: &Path,
) -> Result<RustlsConfig, TlsError> {
    let mut roots = RootCertStore::empty();
    for cert in read_certs(remote_ca)? {
        roots.add(cert).map_err(|source| TlsError::TrustAnchor {
            path: remote_ca.display().to_string(),
            source,
        })?;
    }

    let verifier = WebPkiClientVerifier::builder(Arc::new(roots)).build()?;

    let cert_chain = read_certs(local_cert)?;
    let key = read_private_key(local_key)?;

    let config = ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(cert_chain, key)?;

    tracing::info!(
        cert = %local_cert.display(),
        client_ca = %remote_ca.display(),
        "Mutual TLS configured"
    );

    Ok(RustlsConfig::from_config(Arc::new(config)))
}
