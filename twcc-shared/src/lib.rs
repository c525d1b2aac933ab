#![warn(rust_2018_idioms)]

#[cfg(feature = "marshal")]
pub mod marshal;

pub mod error;
pub mod time;
pub(crate) mod transport;

pub use transport::{TransportContext, TransportMessage, TransportProtocol};
