//! Trust-store import
//!
//! Client contexts that verify peers without an operator CA directory take
//! their trust anchors from a trust store. A provider opens the store and
//! returns a scoped handle. The handle is released when it is dropped, so
//! every exit path of the importer releases it.
//!
//! Each entry is PEM-encoded and registered on the context. Entries that are
//! already present are skipped silently. Other registration failures are
//! reported and the import moves on to the next entry.

use super::config::TlsError;
use super::context::TlsContext;
use super::pem::{self, EncodingType, PemKind};
use crate::report::{Diagnostic, ErrorReporter, Severity, TRUST_ANCHOR_FAILED, TRUST_STORE_OPEN_FAILED};
use openssl::x509::{X509Crl, X509};
use rustls_pki_types::pem::{self as pem_file, SectionKind};
use std::path::{Path, PathBuf};

/// One entry enumerated from a trust store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCertificateEntry {
    pub encoding: EncodingType,
    pub der: Vec<u8>,
    pub is_revocation_list: bool,
}

impl RawCertificateEntry {
    pub fn certificate(der: Vec<u8>) -> Self {
        RawCertificateEntry {
            encoding: EncodingType::X509_ASN,
            der,
            is_revocation_list: false,
        }
    }

    pub fn revocation_list(der: Vec<u8>) -> Self {
        RawCertificateEntry {
            encoding: EncodingType::X509_ASN,
            der,
            is_revocation_list: true,
        }
    }

    /// PEM record type for this entry
    pub fn kind(&self) -> PemKind {
        PemKind::resolve(self.encoding, self.is_revocation_list)
    }
}

/// An open trust store
///
/// Dropping the handle releases the store.
pub trait TrustStore {
    fn certificates(&mut self) -> Box<dyn Iterator<Item = RawCertificateEntry> + '_>;

    fn revocation_lists(&mut self) -> Box<dyn Iterator<Item = RawCertificateEntry> + '_>;
}

/// Source of trust anchors for client contexts
pub trait TrustStoreProvider {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Open the store
    ///
    /// Fails with `TlsError::StoreOpen` if the store cannot be opened at all.
    fn open(&self) -> Result<Box<dyn TrustStore + '_>, TlsError>;
}

/// Store contents loaded eagerly by a provider
struct LoadedStore {
    name: String,
    certificates: Vec<RawCertificateEntry>,
    revocation_lists: Vec<RawCertificateEntry>,
}

impl TrustStore for LoadedStore {
    fn certificates(&mut self) -> Box<dyn Iterator<Item = RawCertificateEntry> + '_> {
        Box::new(self.certificates.drain(..))
    }

    fn revocation_lists(&mut self) -> Box<dyn Iterator<Item = RawCertificateEntry> + '_> {
        Box::new(self.revocation_lists.drain(..))
    }
}

impl Drop for LoadedStore {
    fn drop(&mut self) {
        log::trace!("released {} trust store", self.name);
    }
}

/// Operating system root store
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeTrustStore;

impl TrustStoreProvider for NativeTrustStore {
    fn name(&self) -> &str {
        "native"
    }

    fn open(&self) -> Result<Box<dyn TrustStore + '_>, TlsError> {
        let result = rustls_native_certs::load_native_certs();

        for err in &result.errors {
            log::warn!("error loading native certificate: {}", err);
        }

        if result.certs.is_empty() {
            if let Some(err) = result.errors.first() {
                let code = match &err.kind {
                    rustls_native_certs::ErrorKind::Io { inner, .. } => inner.raw_os_error(),
                    _ => None,
                };
                return Err(TlsError::StoreOpen {
                    code,
                    message: err.to_string(),
                });
            }
        }

        let certificates = result
            .certs
            .into_iter()
            .map(|cert| RawCertificateEntry::certificate(cert.to_vec()))
            .collect();

        Ok(Box::new(LoadedStore {
            name: self.name().to_string(),
            certificates,
            revocation_lists: Vec::new(),
        }))
    }
}

/// Directory of PEM files holding certificates and revocation lists
#[derive(Debug, Clone)]
pub struct DirectoryTrustStore {
    dir: PathBuf,
}

impl DirectoryTrustStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryTrustStore { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn scan_file(path: &Path, store: &mut LoadedStore) -> Result<(), TlsError> {
        let contents = std::fs::read(path)?;

        for mut section in pem_sections(&contents) {
            let (kind, der) = match pem_file::from_buf(&mut section) {
                Ok(Some(found)) => found,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("skipping malformed PEM section in {}: {:?}", path.display(), e);
                    continue;
                }
            };

            let entry = match kind {
                SectionKind::Certificate => X509::from_der(&der).map(|_| RawCertificateEntry::certificate(der)),
                SectionKind::Crl => X509Crl::from_der(&der).map(|_| RawCertificateEntry::revocation_list(der)),
                _ => continue,
            };

            match entry {
                Ok(entry) if entry.is_revocation_list => store.revocation_lists.push(entry),
                Ok(entry) => store.certificates.push(entry),
                Err(e) => log::warn!("skipping malformed {:?} in {}: {}", kind, path.display(), e),
            }
        }
        Ok(())
    }
}

impl TrustStoreProvider for DirectoryTrustStore {
    fn name(&self) -> &str {
        "directory"
    }

    fn open(&self) -> Result<Box<dyn TrustStore + '_>, TlsError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| TlsError::StoreOpen {
            code: e.raw_os_error(),
            message: format!("{}: {}", self.dir.display(), e),
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut store = LoadedStore {
            name: format!("directory {}", self.dir.display()),
            certificates: Vec::new(),
            revocation_lists: Vec::new(),
        };

        for file in &files {
            if let Err(e) = Self::scan_file(file, &mut store) {
                log::warn!("skipping unreadable trust file {}: {}", file.display(), e);
            }
        }

        Ok(Box::new(store))
    }
}

/// Provider with no entries
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyTrustStore;

impl TrustStoreProvider for EmptyTrustStore {
    fn name(&self) -> &str {
        "empty"
    }

    fn open(&self) -> Result<Box<dyn TrustStore + '_>, TlsError> {
        Ok(Box::new(LoadedStore {
            name: self.name().to_string(),
            certificates: Vec::new(),
            revocation_lists: Vec::new(),
        }))
    }
}

/// Cut PEM file contents before every `-----BEGIN ` line
///
/// Each piece holds at most one section start, so a section left open by a
/// truncated block cannot swallow the sections after it.
fn pem_sections(contents: &[u8]) -> Vec<&[u8]> {
    let mut starts = vec![0];
    let mut offset = 0;
    for line in contents.split_inclusive(|&b| b == b'\n') {
        if offset > 0 && line.starts_with(b"-----BEGIN ") {
            starts.push(offset);
        }
        offset += line.len();
    }
    starts.push(contents.len());

    starts.windows(2).map(|w| &contents[w[0]..w[1]]).collect()
}

/// Counts from a completed import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Certificate entries enumerated
    pub certificates: usize,
    /// Revocation-list entries enumerated
    pub revocation_lists: usize,
    /// Entries newly registered
    pub added: usize,
    /// Entries skipped because they were already registered
    pub duplicates: usize,
    /// Entries whose registration failed
    pub failed: usize,
}

/// Register every entry of the provider's store on the context
///
/// Only a store that cannot be opened fails the import.
pub fn import(
    ctx: &mut dyn TlsContext,
    provider: &dyn TrustStoreProvider,
    reporter: &dyn ErrorReporter,
) -> Result<ImportSummary, TlsError> {
    log::debug!("loading certificates from {} trust store", provider.name());

    let mut store = match provider.open() {
        Ok(store) => store,
        Err(e) => {
            let code = match &e {
                TlsError::StoreOpen { code: Some(code), .. } => code.to_string(),
                _ => "unknown".to_string(),
            };
            reporter.report(
                Diagnostic::new(
                    Severity::Medium,
                    TRUST_STORE_OPEN_FAILED,
                    "trust_store::import",
                    format!("Failed to open {} certificate store. OS error: {}", provider.name(), code),
                )
                .with_source(&e),
            );
            return Err(e);
        }
    };

    let mut summary = ImportSummary::default();

    for entry in store.certificates() {
        summary.certificates += 1;
        add_entry(ctx, &entry, reporter, &mut summary);
    }

    for entry in store.revocation_lists() {
        summary.revocation_lists += 1;
        add_entry(ctx, &entry, reporter, &mut summary);
    }

    log::debug!(
        "{} certificates were loaded from the {} trust store ({} added, {} already present, {} failed)",
        summary.certificates + summary.revocation_lists,
        provider.name(),
        summary.added,
        summary.duplicates,
        summary.failed
    );

    Ok(summary)
}

fn add_entry(
    ctx: &mut dyn TlsContext,
    entry: &RawCertificateEntry,
    reporter: &dyn ErrorReporter,
    summary: &mut ImportSummary,
) {
    let kind = entry.kind();
    let encoded = pem::encode(&entry.der, kind);

    match ctx.add_certificate_authority(kind, encoded.as_bytes()) {
        Ok(()) => summary.added += 1,
        Err(TlsError::DuplicateAnchor) => summary.duplicates += 1,
        Err(e) => {
            summary.failed += 1;
            reporter.report(
                Diagnostic::new(
                    Severity::Medium,
                    TRUST_ANCHOR_FAILED,
                    "trust_store::add_entry",
                    format!("Failed to add CA {}.", kind.label()),
                )
                .with_source(e),
            );
        }
    }
}
