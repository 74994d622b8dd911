//! TLS settings
//!
//! This module provides the operator-facing settings consumed by the
//! context initializers, the certificate registry entry, and the error type
//! shared by the TLS layer.

use std::path::{Path, PathBuf};

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    /// The trust anchor is already registered on the context
    #[error("Certificate already in store")]
    DuplicateAnchor,

    #[error("Failed to open certificate store: {message}")]
    StoreOpen {
        /// OS error code, when the failure came from the OS
        code: Option<i32>,
        message: String,
    },

    #[error("Unsupported store entry: {0}")]
    UnsupportedEntry(String),
}

/// Certificate/private-key pair from the certificate registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslCertificate {
    /// PEM file with the leaf certificate followed by any intermediates
    pub certificate_file: PathBuf,
    /// PEM file with the unencrypted private key
    pub private_key_file: PathBuf,
}

impl SslCertificate {
    pub fn new(certificate_file: impl Into<PathBuf>, private_key_file: impl Into<PathBuf>) -> Self {
        SslCertificate {
            certificate_file: certificate_file.into(),
            private_key_file: private_key_file.into(),
        }
    }
}

/// Operator TLS settings (immutable once built)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub(crate) verify_remote_certificate: bool,
    pub(crate) cipher_list: String,
    pub(crate) ca_directory: Option<PathBuf>,
}

impl Default for TlsSettings {
    fn default() -> Self {
        TlsSettings {
            verify_remote_certificate: true,
            cipher_list: String::new(),
            ca_directory: None,
        }
    }
}

impl TlsSettings {
    /// Create a settings builder with verification enabled and library default ciphers
    pub fn builder() -> TlsSettingsBuilder {
        TlsSettingsBuilder {
            settings: TlsSettings::default(),
        }
    }

    /// Whether outbound connections verify the remote certificate
    pub fn verify_remote_certificate(&self) -> bool {
        self.verify_remote_certificate
    }

    /// Raw operator cipher list, before normalization
    pub fn cipher_list(&self) -> &str {
        &self.cipher_list
    }

    /// Configured CA directory, whether or not it is usable
    pub fn ca_directory(&self) -> Option<&Path> {
        self.ca_directory.as_deref()
    }

    /// CA directory to verify against, if one is configured and holds files
    ///
    /// A configured directory that is missing or empty falls back to the
    /// trust store.
    pub fn ca_directory_in_use(&self) -> Option<&Path> {
        let dir = self.ca_directory.as_deref()?;
        let mut entries = std::fs::read_dir(dir).ok()?;
        if entries.any(|e| e.is_ok()) {
            Some(dir)
        } else {
            None
        }
    }
}

/// Settings builder
pub struct TlsSettingsBuilder {
    settings: TlsSettings,
}

impl TlsSettingsBuilder {
    /// Enable/disable remote certificate verification for outbound connections
    pub fn verify_remote_certificate(mut self, verify: bool) -> Self {
        self.settings.verify_remote_certificate = verify;
        self
    }

    /// Set the operator cipher list (empty keeps the library default)
    pub fn cipher_list(mut self, ciphers: impl Into<String>) -> Self {
        self.settings.cipher_list = ciphers.into();
        self
    }

    /// Set a directory of hashed CA certificates to verify against
    pub fn ca_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.ca_directory = Some(path.into());
        self
    }

    pub fn build(self) -> TlsSettings {
        self.settings
    }
}
