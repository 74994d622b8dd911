//! Diagnostic reporting
//!
//! Initialization failures are reported through an injected sink rather
//! than returned, so the two public entry points only answer success or
//! failure. Each condition is reported once, where it is detected.

use std::fmt;
use std::sync::Mutex;

/// Severity of a reported diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Server context could not be initialized
pub const SERVER_INIT_FAILED: u32 = 5113;
/// Private key file is protected by a password
pub const PASSWORD_NOT_SUPPORTED: u32 = 5143;
/// Client context could not be initialized
pub const CLIENT_INIT_FAILED: u32 = 5144;
/// Trust store could not be opened
pub const TRUST_STORE_OPEN_FAILED: u32 = 5504;
/// A trust anchor could not be registered
pub const TRUST_ANCHOR_FAILED: u32 = 5505;
/// Cipher list was rejected by the crypto library
pub const CIPHER_LIST_FAILED: u32 = 5511;

/// A single diagnostic report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: u32,
    /// Operation that detected the condition
    pub origin: &'static str,
    pub message: String,
    /// Text of the underlying library or OS error, if any
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: u32, origin: &'static str, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            code,
            origin,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying error
    pub fn with_source(mut self, source: impl fmt::Display) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.origin, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

/// Sink for diagnostics raised during context initialization
pub trait ErrorReporter {
    fn report(&self, diagnostic: Diagnostic);
}

/// Reporter that forwards diagnostics to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::High | Severity::Critical => {
                log::error!(target: "mailtls::report", "{} severity={}", diagnostic, diagnostic.severity.as_str())
            }
            Severity::Low | Severity::Medium => {
                log::warn!(target: "mailtls::report", "{} severity={}", diagnostic, diagnostic.severity.as_str())
            }
        }
    }
}

/// Reporter that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self.diagnostics.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of diagnostics carrying the given code
    pub fn count(&self, code: u32) -> usize {
        self.diagnostics().iter().filter(|d| d.code == code).count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics().is_empty()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match self.diagnostics.lock() {
            Ok(mut guard) => guard.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
