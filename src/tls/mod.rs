//! TLS context bootstrap
//!
//! This module prepares OpenSSL contexts for a mail transport daemon. It
//! configures contexts only; the TLS engine that consumes them lives
//! elsewhere.
//!
//! # Architecture
//!
//! 1. `TlsSettings` carries operator policy (verification, cipher list, CA directory)
//! 2. `TlsContext` is the capability the initializers configure; `OpenSslContext`
//!    implements it over `openssl::ssl::SslContextBuilder`
//! 3. `SslContextInitializer` drives server and client setup
//! 4. `trust_store` imports anchors from a `TrustStoreProvider`, PEM-encoding each
//!    entry through `pem`
//! 5. `cipher` applies the operator cipher list through the native handle
//!
//! # Examples
//!
//! ## Server
//!
//! ```no_run
//! use mailtls::report::LogReporter;
//! use mailtls::tls::{NativeTrustStore, OpenSslContext, SslCertificate, SslContextInitializer, TlsSettings};
//!
//! let settings = TlsSettings::builder().cipher_list("HIGH:!aNULL:!MD5").build();
//! let init = SslContextInitializer::new(&settings, &LogReporter, &NativeTrustStore);
//!
//! let certificate = SslCertificate::new("/etc/mail/server.pem", "/etc/mail/server.key");
//! let mut ctx = OpenSslContext::server().unwrap();
//! if init.init_server(&mut ctx, Some(&certificate), "0.0.0.0", 465) {
//!     let ssl_context = ctx.build();
//!     // hand ssl_context to the listener
//! }
//! ```
//!
//! ## Client
//!
//! ```no_run
//! use mailtls::report::LogReporter;
//! use mailtls::tls::{NativeTrustStore, OpenSslContext, SslContextInitializer, TlsSettings};
//!
//! let settings = TlsSettings::builder().verify_remote_certificate(true).build();
//! let init = SslContextInitializer::new(&settings, &LogReporter, &NativeTrustStore);
//!
//! let mut ctx = OpenSslContext::client().unwrap();
//! assert!(init.init_client(&mut ctx));
//! ```

pub mod cipher;
pub mod config;
pub mod context;
pub mod initializer;
pub mod pem;
pub mod trust_store;

pub use cipher::CipherOutcome;
pub use config::{SslCertificate, TlsError, TlsSettings, TlsSettingsBuilder};
pub use context::{ContextOptions, NativeHandle, OpenSslContext, TlsContext, VerifyMode};
pub use initializer::SslContextInitializer;
pub use pem::{EncodingType, PemKind};
pub use trust_store::{
    DirectoryTrustStore, EmptyTrustStore, ImportSummary, NativeTrustStore, RawCertificateEntry, TrustStore,
    TrustStoreProvider,
};

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;
