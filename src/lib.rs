//! mailtls - TLS context bootstrap for a mail transport daemon
//!
//! This crate prepares OpenSSL contexts for the two roles of a mail
//! transport daemon: accepting inbound connections with a certificate/key
//! pair, and opening outbound connections with a peer-verification policy
//! and trust anchors. It does not perform TLS itself.

pub mod report;
pub mod tls;
