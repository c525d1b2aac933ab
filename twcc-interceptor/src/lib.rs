//! Sans-IO interceptors for transport-wide congestion control feedback.
//!
//! The crate is built around the [`sansio::Protocol`] trait. Interceptors
//! wrap one another and see every RTP/RTCP packet that flows through the
//! chain; the innermost one is usually a [`NoopInterceptor`].
//!
//! # Available Interceptors
//!
//! | Interceptor | Description |
//! |-------------|-------------|
//! | [`TwccReceiverInterceptor`] | Records arrival times of inbound packets and periodically emits TransportLayerCC feedback |
//! | [`SenderReportInterceptor`] | Counts outbound packets per local stream and periodically emits RTCP Sender Reports |
//! | [`NoopInterceptor`] | Pass-through terminal for interceptor chains |
//!
//! The feedback machinery is also usable without a chain: [`Recorder`] is a
//! thread-safe, self-contained arrival recorder whose
//! [`build_feedback`](Recorder::build_feedback) drains everything recorded
//! since the previous call into one or more size-bounded reports.
//!
//! # No Direction Concept
//!
//! All operations flow from the outermost interceptor to the innermost one:
//! ```text
//! handle_read:    Outer → Inner
//! handle_write:   Outer → Inner
//! handle_timeout: Outer → Inner
//! poll_*:         Outer → Inner
//! ```
//! Whether a packet is inbound or outbound is a matter of which method it
//! arrives through, not of the order in which layers see it.
//!
//! # Quick Start
//!
//! ```ignore
//! use twcc_interceptor::{Registry, SenderReportBuilder, TwccReceiverBuilder};
//! use std::time::Duration;
//!
//! let mut chain = Registry::new()
//!     .with(SenderReportBuilder::new()
//!         .with_interval(Duration::from_secs(1))
//!         .build())
//!     .with(TwccReceiverBuilder::new()
//!         .with_interval(Duration::from_millis(100))
//!         .with_max_feedback_size(1200)
//!         .build())
//!     .build();
//! ```

#![warn(rust_2018_idioms)]

use bytes::Bytes;
use shared::TransportMessage;
use std::time::Instant;

mod noop;
mod registry;

pub(crate) mod report;
pub(crate) mod stream_info;
pub(crate) mod twcc;

pub use noop::NoopInterceptor;
pub use registry::Registry;
pub use report::{
    sender::{SenderReportBuilder, SenderReportInterceptor},
    sender_stream::SenderStream,
};
pub use stream_info::{RTCPFeedback, RTPHeaderExtension, StreamInfo};
pub use twcc::{
    TRANSPORT_CC_URI,
    arrival_ledger::{ArrivalLedger, PacketArrival},
    feedback::{DEFAULT_MAX_FEEDBACK_SIZE, MIN_FEEDBACK_SIZE, assemble},
    receiver::{TwccReceiverBuilder, TwccReceiverInterceptor},
    recorder::Recorder,
    sequence::SequenceExtender,
};

/// An RTP packet whose header has already been decoded upstream.
///
/// Only the fields the interceptors in this crate consume are kept; the
/// transport-wide sequence number is present when the packet carried the
/// transport-cc header extension.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MediaPacket {
    pub ssrc: u32,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub transport_sequence: Option<u16>,
    pub payload: Bytes,
}

/// RTP/RTCP Packet
///
/// An enum representing either an RTP or RTCP packet that can be processed
/// by interceptors in the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// RTP packet carrying media
    Rtp(MediaPacket),
    /// RTCP packets for feedback and statistics
    Rtcp(Vec<Box<dyn rtcp::Packet>>),
}

/// Tagged packet with transport metadata.
///
/// This is the message type passed through interceptor chains.
pub type TaggedPacket = TransportMessage<Packet>;

/// Trait for RTP/RTCP interceptors with fixed Protocol type parameters.
///
/// `Interceptor` requires implementors to also implement
/// [`sansio::Protocol`] with:
/// - `Rin`, `Win`, `Rout`, `Wout` = [`TaggedPacket`]
/// - `Ein`, `Eout` = `()`
/// - `Time` = [`Instant`]
/// - `Error` = [`shared::error::Error`]
///
/// and adds stream binding plus [`with()`](Interceptor::with) for chaining.
pub trait Interceptor:
    sansio::Protocol<
        TaggedPacket,
        TaggedPacket,
        (),
        Rout = TaggedPacket,
        Wout = TaggedPacket,
        Eout = (),
        Time = Instant,
        Error = shared::error::Error,
    > + Sized
{
    /// Wrap this interceptor with another layer.
    fn with<O, F>(self, f: F) -> O
    where
        F: FnOnce(Self) -> O,
        O: Interceptor,
    {
        f(self)
    }

    /// bind_local_stream is called once per outgoing stream before any of its packets are written.
    fn bind_local_stream(&mut self, info: &StreamInfo);

    /// unbind_local_stream is called when the outgoing stream is removed.
    fn unbind_local_stream(&mut self, info: &StreamInfo);

    /// bind_remote_stream is called once per incoming stream before any of its packets are read.
    fn bind_remote_stream(&mut self, info: &StreamInfo);

    /// unbind_remote_stream is called when the incoming stream is removed.
    fn unbind_remote_stream(&mut self, info: &StreamInfo);
}
