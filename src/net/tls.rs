//! TLS configuration and certificate loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no certificate found in {0:?}")]
    NoCertificates(PathBuf),
    #[error("no private key found in {0:?}")]
    NoPrivateKey(PathBuf),
}

/// Check that both PEM files hold what they should, so a bad deployment
/// fails before the cache check rather than on the first handshake.
pub async fn validate_pem_files(cert_path: &Path, key_path: &Path) -> Result<(), TlsError> {
    for path in [cert_path, key_path] {
        if !path.exists() {
            return Err(TlsError::NotFound(path.to_path_buf()));
        }
    }

    let cert_pem = tokio::fs::read(cert_path).await?;
    let certs = rustls_pemfile::certs(&mut cert_pem.as_slice()).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key_pem = tokio::fs::read(key_path).await?;
    if rustls_pemfile::private_key(&mut key_pem.as_slice())?.is_none() {
        return Err(TlsError::NoPrivateKey(key_path.to_path_buf()));
    }

    tracing::debug!(certificates = certs.len(), "TLS material validated");
    Ok(())
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    validate_pem_files(cert_path, key_path).await?;
    Ok(RustlsConfig::from_pem_file(cert_path, key_path).await?)
}
