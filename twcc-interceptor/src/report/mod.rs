//! RTCP Sender Reports for outgoing streams.
//!
//! - [`sender_stream::SenderStream`]: per-stream packet/octet counters and
//!   RTP timestamp extrapolation.
//! - [`sender::SenderReportInterceptor`]: feeds outgoing RTP into the
//!   per-stream statistics and writes a Sender Report per stream on every
//!   interval.

pub mod sender;
pub mod sender_stream;
