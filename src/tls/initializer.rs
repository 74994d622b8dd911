//! Server and client context initialization
//!
//! Both entry points configure one caller-owned context and answer only
//! success or failure. Fatal conditions are reported once, where they are
//! detected. On failure the caller must discard the context and not start
//! the endpoint.

use super::cipher;
use super::config::{SslCertificate, TlsError, TlsSettings};
use super::context::{ContextOptions, TlsContext, VerifyMode};
use super::trust_store::{self, TrustStoreProvider};
use crate::report::{
    Diagnostic, ErrorReporter, Severity, CLIENT_INIT_FAILED, PASSWORD_NOT_SUPPORTED, SERVER_INIT_FAILED,
};

const SERVER_ORIGIN: &str = "SslContextInitializer::init_server";
const CLIENT_ORIGIN: &str = "SslContextInitializer::init_client";

/// Prepares TLS contexts from operator settings
pub struct SslContextInitializer<'a> {
    settings: &'a TlsSettings,
    reporter: &'a dyn ErrorReporter,
    trust_store: &'a dyn TrustStoreProvider,
}

impl<'a> SslContextInitializer<'a> {
    pub fn new(
        settings: &'a TlsSettings,
        reporter: &'a dyn ErrorReporter,
        trust_store: &'a dyn TrustStoreProvider,
    ) -> Self {
        SslContextInitializer {
            settings,
            reporter,
            trust_store,
        }
    }

    /// Configure a context for accepting connections on `address:port`
    pub fn init_server(
        &self,
        ctx: &mut dyn TlsContext,
        certificate: Option<&SslCertificate>,
        address: &str,
        port: u16,
    ) -> bool {
        let Some(certificate) = certificate else {
            self.server_error(
                format!("Error initializing SSL. Certificate not set. Address: {}, Port: {}", address, port),
                None,
            );
            return false;
        };

        if let Err(e) = ctx.set_options(ContextOptions::BASELINE) {
            self.server_error(
                format!("Failed to set SSL context options. Address: {}, Port: {}", address, port),
                Some(&e),
            );
            return false;
        }

        let certificate_file = &certificate.certificate_file;
        if let Err(e) = ctx.use_certificate_file(certificate_file) {
            self.server_error(
                format!(
                    "Failed to load certificate file. Path: {}, Address: {}, Port: {}",
                    certificate_file.display(),
                    address,
                    port
                ),
                Some(&e),
            );
            return false;
        }

        if let Err(e) = ctx.use_certificate_chain_file(certificate_file) {
            self.server_error(
                format!(
                    "Failed to load certificate chain from certificate file. Path: {}, Address: {}, Port: {}",
                    certificate_file.display(),
                    address,
                    port
                ),
                Some(&e),
            );
            return false;
        }

        let reporter = self.reporter;
        let mut password = || {
            reporter.report(Diagnostic::new(
                Severity::High,
                PASSWORD_NOT_SUPPORTED,
                SERVER_ORIGIN,
                "The private key file has a password. Password-protected keys are not supported.",
            ));
            String::new()
        };

        let private_key_file = &certificate.private_key_file;
        match ctx.use_private_key_file(private_key_file, &mut password) {
            Ok(()) => {}
            Err(e @ (TlsError::OpenSsl(_) | TlsError::Io(_) | TlsError::Certificate(_))) => {
                self.server_error(
                    format!(
                        "Failed to load private key file. Path: {}, Address: {}, Port: {}",
                        private_key_file.display(),
                        address,
                        port
                    ),
                    Some(&e),
                );
                return false;
            }
            Err(e) => {
                self.server_error("Error initializing SSL".to_string(), Some(&e));
                return false;
            }
        }

        cipher::apply(ctx, self.settings.cipher_list(), self.reporter);

        log::debug!("server TLS context ready for {}:{}", address, port);
        true
    }

    /// Configure a context for outbound connections
    pub fn init_client(&self, ctx: &mut dyn TlsContext) -> bool {
        if let Err(e) = ctx.set_options(ContextOptions::BASELINE) {
            self.client_error("Failed to set default workarounds.", &e);
            return false;
        }

        if self.settings.verify_remote_certificate() {
            if let Err(e) = ctx.set_verify_mode(VerifyMode::RequirePeer) {
                self.client_error("Failed to enable peer verification.", &e);
                return false;
            }

            if let Some(dir) = self.settings.ca_directory_in_use() {
                if let Err(e) = ctx.add_verify_path(dir) {
                    self.client_error("Failed to add path to Certificate Authority files.", &e);
                    return false;
                }
                log::info!("peer certificate verification enabled, CA directory {}", dir.display());
            } else {
                // Open failures are reported by the importer
                if trust_store::import(ctx, self.trust_store, self.reporter).is_err() {
                    return false;
                }
                log::info!(
                    "peer certificate verification enabled, {} trust store",
                    self.trust_store.name()
                );
            }
        } else {
            if let Err(e) = ctx.set_verify_mode(VerifyMode::None) {
                log::warn!("failed to clear verify mode: {}", e);
            }
            log::warn!("peer certificate verification DISABLED for outbound TLS connections");
        }

        cipher::apply(ctx, self.settings.cipher_list(), self.reporter);

        true
    }

    fn server_error(&self, message: String, source: Option<&TlsError>) {
        let mut diagnostic = Diagnostic::new(Severity::High, SERVER_INIT_FAILED, SERVER_ORIGIN, message);
        if let Some(e) = source {
            diagnostic = diagnostic.with_source(e);
        }
        self.reporter.report(diagnostic);
    }

    fn client_error(&self, message: &str, source: &TlsError) {
        self.reporter.report(
            Diagnostic::new(Severity::Medium, CLIENT_INIT_FAILED, CLIENT_ORIGIN, message).with_source(source),
        );
    }
}
