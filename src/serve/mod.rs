//! HTTP serving over TLS or plaintext.

pub mod handler;
pub mod server;

pub use server::{prepare_transport, run, serve, Transport};
