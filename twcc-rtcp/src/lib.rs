#![warn(rust_2018_idioms)]

//! RTCP packets needed to report on media flow: sender reports (RFC 3550)
//! and transport-wide congestion control feedback
//! (draft-holmer-rmcat-transport-wide-cc-extensions-01).

pub mod header;
pub mod packet;
pub mod reception_report;
pub mod sender_report;
pub mod transport_feedbacks;
mod util;

pub use packet::Packet;
