//! Shared test doubles and fixtures for integration tests

#![allow(dead_code)]

use mailtls::tls::{
    ContextOptions, NativeHandle, PemKind, RawCertificateEntry, TlsContext, TlsError, TrustStore, TrustStoreProvider,
    VerifyMode,
};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::symm::Cipher;
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const ROOT_PEM: &str = include_str!("../fixtures/relay-root.pem");
pub const ROOT_CRL_PEM: &str = include_str!("../fixtures/relay-root.crl.pem");
pub const ROOT_P7B: &str = include_str!("../fixtures/relay-root.p7b");

/// Operation recorded by `RecordingContext`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetOptions(ContextOptions),
    UseCertificateFile(PathBuf),
    UseCertificateChainFile(PathBuf),
    UsePrivateKeyFile(PathBuf),
    SetVerifyMode(VerifyMode),
    AddVerifyPath(PathBuf),
    AddCertificateAuthority(PemKind),
}

/// Step a `RecordingContext` should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Options,
    CertificateFile,
    ChainFile,
    PrivateKey,
    VerifyMode,
    VerifyPath,
}

#[derive(Debug, Default)]
pub struct RecordingNative {
    pub cipher_lists: Vec<String>,
    pub reject: bool,
}

impl NativeHandle for RecordingNative {
    fn set_cipher_list(&mut self, ciphers: &str) -> Result<(), TlsError> {
        self.cipher_lists.push(ciphers.to_string());
        if self.reject {
            return Err(TlsError::InvalidConfig(format!("no cipher match: {}", ciphers)));
        }
        Ok(())
    }
}

/// Context double that records every call
#[derive(Debug, Default)]
pub struct RecordingContext {
    pub calls: Vec<Call>,
    pub native: RecordingNative,
    pub fail_on: Option<FailOn>,
    /// Private key behaves as password-protected
    pub encrypted_key: bool,
    /// PEM blocks reported as already present
    pub present: Vec<String>,
    /// PEM blocks rejected outright
    pub rejected: Vec<String>,
    /// PEM blocks registered
    pub anchors: Vec<String>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(step: FailOn) -> Self {
        RecordingContext {
            fail_on: Some(step),
            ..Self::default()
        }
    }

    fn check(&self, step: FailOn) -> Result<(), TlsError> {
        if self.fail_on == Some(step) {
            return Err(TlsError::InvalidConfig(format!("{:?} failed", step)));
        }
        Ok(())
    }

    pub fn verify_modes(&self) -> Vec<VerifyMode> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SetVerifyMode(mode) => Some(*mode),
                _ => None,
            })
            .collect()
    }

    pub fn trust_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::AddVerifyPath(_) | Call::AddCertificateAuthority(_)))
            .count()
    }
}

impl TlsContext for RecordingContext {
    fn set_options(&mut self, options: ContextOptions) -> Result<(), TlsError> {
        self.calls.push(Call::SetOptions(options));
        self.check(FailOn::Options)
    }

    fn use_certificate_file(&mut self, path: &Path) -> Result<(), TlsError> {
        self.calls.push(Call::UseCertificateFile(path.to_path_buf()));
        self.check(FailOn::CertificateFile)
    }

    fn use_certificate_chain_file(&mut self, path: &Path) -> Result<(), TlsError> {
        self.calls.push(Call::UseCertificateChainFile(path.to_path_buf()));
        self.check(FailOn::ChainFile)
    }

    fn use_private_key_file(&mut self, path: &Path, password: &mut dyn FnMut() -> String) -> Result<(), TlsError> {
        self.calls.push(Call::UsePrivateKeyFile(path.to_path_buf()));
        if self.encrypted_key {
            let secret = password();
            return Err(TlsError::Certificate(format!("bad decrypt with {}-byte password", secret.len())));
        }
        self.check(FailOn::PrivateKey)
    }

    fn set_verify_mode(&mut self, mode: VerifyMode) -> Result<(), TlsError> {
        self.calls.push(Call::SetVerifyMode(mode));
        self.check(FailOn::VerifyMode)
    }

    fn add_verify_path(&mut self, dir: &Path) -> Result<(), TlsError> {
        self.calls.push(Call::AddVerifyPath(dir.to_path_buf()));
        self.check(FailOn::VerifyPath)
    }

    fn add_certificate_authority(&mut self, kind: PemKind, pem: &[u8]) -> Result<(), TlsError> {
        self.calls.push(Call::AddCertificateAuthority(kind));
        let pem = String::from_utf8_lossy(pem).into_owned();

        if self.rejected.contains(&pem) {
            return Err(TlsError::Certificate("malformed entry".to_string()));
        }
        if self.present.contains(&pem) || self.anchors.contains(&pem) {
            return Err(TlsError::DuplicateAnchor);
        }
        self.anchors.push(pem);
        Ok(())
    }

    fn native_handle(&mut self) -> &mut dyn NativeHandle {
        &mut self.native
    }
}

/// In-memory trust store that counts opens and releases
#[derive(Debug, Default)]
pub struct FakeTrustStore {
    pub certificates: Vec<RawCertificateEntry>,
    pub revocation_lists: Vec<RawCertificateEntry>,
    /// Fail to open with this OS error code
    pub open_error: Option<i32>,
    pub opened: Rc<Cell<usize>>,
    pub released: Rc<Cell<usize>>,
}

impl FakeTrustStore {
    pub fn with_entries(certificates: usize, revocation_lists: usize) -> Self {
        FakeTrustStore {
            certificates: (0..certificates)
                .map(|i| RawCertificateEntry::certificate(vec![0x30, 0x82, i as u8, 0x01]))
                .collect(),
            revocation_lists: (0..revocation_lists)
                .map(|i| RawCertificateEntry::revocation_list(vec![0x30, 0x81, i as u8, 0x02]))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing(code: i32) -> Self {
        FakeTrustStore {
            open_error: Some(code),
            ..Self::default()
        }
    }
}

struct FakeHandle {
    certificates: Vec<RawCertificateEntry>,
    revocation_lists: Vec<RawCertificateEntry>,
    released: Rc<Cell<usize>>,
}

impl TrustStore for FakeHandle {
    fn certificates(&mut self) -> Box<dyn Iterator<Item = RawCertificateEntry> + '_> {
        Box::new(self.certificates.drain(..))
    }

    fn revocation_lists(&mut self) -> Box<dyn Iterator<Item = RawCertificateEntry> + '_> {
        Box::new(self.revocation_lists.drain(..))
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

impl TrustStoreProvider for FakeTrustStore {
    fn name(&self) -> &str {
        "fake"
    }

    fn open(&self) -> Result<Box<dyn TrustStore + '_>, TlsError> {
        if let Some(code) = self.open_error {
            return Err(TlsError::StoreOpen {
                code: Some(code),
                message: "access denied".to_string(),
            });
        }
        self.opened.set(self.opened.get() + 1);
        Ok(Box::new(FakeHandle {
            certificates: self.certificates.clone(),
            revocation_lists: self.revocation_lists.clone(),
            released: Rc::clone(&self.released),
        }))
    }
}

/// Self-signed certificate for `localhost` usable as its own trust anchor
pub fn self_signed(cn: &str) -> (X509, PKey<Private>) {
    let rsa = Rsa::generate(2048).unwrap();
    let key = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();

    let constraints = BasicConstraints::new().critical().ca().build().unwrap();
    builder.append_extension(constraints).unwrap();
    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();

    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (builder.build(), key)
}

/// Write certificate and key PEM files into `dir`
pub fn write_pair(dir: &Path, cert: &X509, key: &PKey<Private>) -> (PathBuf, PathBuf) {
    let cert_path = dir.join("server.pem");
    let key_path = dir.join("server.key");
    std::fs::write(&cert_path, cert.to_pem().unwrap()).unwrap();
    std::fs::write(&key_path, key.private_key_to_pem_pkcs8().unwrap()).unwrap();
    (cert_path, key_path)
}

/// Write a password-protected copy of `key` into `dir`
pub fn write_encrypted_key(dir: &Path, key: &PKey<Private>) -> PathBuf {
    let path = dir.join("encrypted.key");
    let pem = key
        .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), b"correct horse")
        .unwrap();
    std::fs::write(&path, pem).unwrap();
    path
}

/// Write `cert` into `dir` under its OpenSSL subject hash name
pub fn write_hashed(dir: &Path, cert: &X509) -> PathBuf {
    let path = dir.join(format!("{:08x}.0", cert.subject_name_hash()));
    std::fs::write(&path, cert.to_pem().unwrap()).unwrap();
    path
}
