//! Operator cipher policy
//!
//! The operator cipher list is free text. Carriage returns, line feeds and
//! spaces are stripped and surrounding whitespace is trimmed before it reaches
//! the crypto library. An empty result leaves the library default suite in
//! place.

use super::context::TlsContext;
use crate::report::{Diagnostic, ErrorReporter, Severity, CIPHER_LIST_FAILED};

/// Outcome of applying a cipher policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherOutcome {
    /// Nothing configured, library default kept
    Default,
    /// Normalized list accepted by the library
    Applied(String),
    /// Normalized list rejected, library default kept
    Rejected(String),
}

/// Strip carriage returns, line feeds and spaces
pub fn normalize(cipher_list: &str) -> String {
    cipher_list
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | ' '))
        .collect()
}

/// Apply the operator cipher list to the context's native handle
///
/// A rejected list is reported and never fails initialization.
pub fn apply(ctx: &mut dyn TlsContext, cipher_list: &str, reporter: &dyn ErrorReporter) -> CipherOutcome {
    let normalized = normalize(cipher_list);
    let ciphers = normalized.trim();
    if ciphers.is_empty() {
        log::debug!("no cipher list configured, keeping library default");
        return CipherOutcome::Default;
    }

    match ctx.native_handle().set_cipher_list(ciphers) {
        Ok(()) => {
            log::debug!("cipher list set to {}", ciphers);
            CipherOutcome::Applied(ciphers.to_string())
        }
        Err(e) => {
            reporter.report(
                Diagnostic::new(Severity::Medium, CIPHER_LIST_FAILED, "cipher::apply", "Failed to set SSL ciphers")
                    .with_source(e),
            );
            CipherOutcome::Rejected(ciphers.to_string())
        }
    }
}
