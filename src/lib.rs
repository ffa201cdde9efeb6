//! local-license - HTTPS license responder with SNI certificate selection.

pub mod cert;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod serve;
pub mod sni;
