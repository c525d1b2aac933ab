//! TWCC Receiver Interceptor - tracks incoming packets and generates feedback.

use super::feedback::DEFAULT_MAX_FEEDBACK_SIZE;
use super::recorder::Recorder;
use super::stream_supports_twcc;
use crate::stream_info::StreamInfo;
use crate::{Interceptor, Packet, TaggedPacket};
use log::trace;
use shared::TransportContext;
use shared::error::Error;
use std::collections::{HashSet, VecDeque};
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Default interval for sending TWCC feedback.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Builder for the TwccReceiverInterceptor.
///
/// # Example
///
/// ```ignore
/// use twcc_interceptor::{Registry, TwccReceiverBuilder};
/// use std::time::Duration;
///
/// let chain = Registry::new()
///     .with(TwccReceiverBuilder::new()
///         .with_interval(Duration::from_millis(100))
///         .build())
///     .build();
/// ```
pub struct TwccReceiverBuilder<P> {
    /// Interval between feedback reports.
    interval: Duration,
    /// Upper bound on the encoded size of one report.
    max_feedback_size: usize,
    /// SSRC the feedback is sent from; random when unset.
    sender_ssrc: Option<u32>,
    _phantom: PhantomData<P>,
}

impl<P> Default for TwccReceiverBuilder<P> {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_feedback_size: DEFAULT_MAX_FEEDBACK_SIZE,
            sender_ssrc: None,
            _phantom: PhantomData,
        }
    }
}

impl<P> TwccReceiverBuilder<P> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interval between feedback reports.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the maximum encoded size of a single feedback report.
    pub fn with_max_feedback_size(mut self, max_feedback_size: usize) -> Self {
        self.max_feedback_size = max_feedback_size;
        self
    }

    /// Set the SSRC the feedback is sent from.
    pub fn with_sender_ssrc(mut self, sender_ssrc: u32) -> Self {
        self.sender_ssrc = Some(sender_ssrc);
        self
    }

    /// Build the interceptor factory function.
    pub fn build(self) -> impl FnOnce(P) -> TwccReceiverInterceptor<P> {
        move |inner| TwccReceiverInterceptor {
            inner,
            interval: self.interval,
            max_feedback_size: self.max_feedback_size,
            sender_ssrc: self.sender_ssrc,
            start_time: None,
            recorder: None,
            streams: HashSet::new(),
            write_queue: VecDeque::new(),
            next_timeout: None,
        }
    }
}

/// Interceptor that tracks incoming RTP packets and generates TWCC feedback.
///
/// Packets of bound remote streams that negotiated the transport-cc header
/// extension are recorded with their arrival time, measured from the first
/// recorded packet. Every `interval` the arrivals are drained into
/// TransportLayerCC reports, each written as its own RTCP packet.
pub struct TwccReceiverInterceptor<P> {
    inner: P,

    interval: Duration,
    max_feedback_size: usize,
    sender_ssrc: Option<u32>,

    /// Start time for calculating arrival times.
    start_time: Option<Instant>,

    /// Created on the first recorded packet.
    recorder: Option<Recorder>,

    /// SSRCs of remote streams with transport-cc.
    streams: HashSet<u32>,

    /// Queue for feedback packets.
    write_queue: VecDeque<TaggedPacket>,

    /// Next timeout for sending feedback.
    next_timeout: Option<Instant>,
}

impl<P> TwccReceiverInterceptor<P> {
    fn generate_feedback(&mut self, now: Instant) {
        let Some(recorder) = self.recorder.as_ref() else {
            return;
        };

        for pkt in recorder.build_feedback_packet() {
            self.write_queue.push_back(TaggedPacket {
                now,
                transport: TransportContext::default(),
                message: Packet::Rtcp(vec![pkt]),
            });
        }
    }
}

impl<P: Interceptor> sansio::Protocol<TaggedPacket, TaggedPacket, ()>
    for TwccReceiverInterceptor<P>
{
    type Rout = TaggedPacket;
    type Wout = TaggedPacket;
    type Eout = ();
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: TaggedPacket) -> Result<(), Self::Error> {
        if let Packet::Rtp(ref media) = msg.message
            && self.streams.contains(&media.ssrc)
            && let Some(transport_sequence) = media.transport_sequence
        {
            if self.recorder.is_none() {
                let sender_ssrc = self.sender_ssrc.unwrap_or_else(rand::random);
                trace!("twcc feedback for ssrc {} sent as {}", media.ssrc, sender_ssrc);
                self.recorder = Some(Recorder::with_max_feedback_size(
                    sender_ssrc,
                    self.max_feedback_size,
                ));
                self.start_time = Some(msg.now);
                self.next_timeout = Some(msg.now + self.interval);
            }

            let arrival_time = self
                .start_time
                .map(|start| msg.now.saturating_duration_since(start).as_micros() as i64)
                .unwrap_or(0);

            if let Some(recorder) = self.recorder.as_ref() {
                recorder.record(media.ssrc, transport_sequence, arrival_time);
            }
        }

        self.inner.handle_read(msg)
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.inner.poll_read()
    }

    fn handle_write(&mut self, msg: TaggedPacket) -> Result<(), Self::Error> {
        self.inner.handle_write(msg)
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        if let Some(pkt) = self.write_queue.pop_front() {
            return Some(pkt);
        }
        self.inner.poll_write()
    }

    fn handle_timeout(&mut self, now: Self::Time) -> Result<(), Self::Error> {
        if let Some(timeout) = self.next_timeout
            && now >= timeout
        {
            self.generate_feedback(now);
            self.next_timeout = Some(now + self.interval);
        }
        self.inner.handle_timeout(now)
    }

    fn poll_timeout(&mut self) -> Option<Self::Time> {
        let inner_timeout = self.inner.poll_timeout();

        match (self.next_timeout, inner_timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.write_queue.clear();
        self.next_timeout = None;
        self.inner.close()
    }
}

impl<P: Interceptor> Interceptor for TwccReceiverInterceptor<P> {
    fn bind_local_stream(&mut self, info: &StreamInfo) {
        self.inner.bind_local_stream(info);
    }

    fn unbind_local_stream(&mut self, info: &StreamInfo) {
        self.inner.unbind_local_stream(info);
    }

    fn bind_remote_stream(&mut self, info: &StreamInfo) {
        // an id of 0 is not a valid extension id
        if let Some(hdr_ext_id) = stream_supports_twcc(info)
            && hdr_ext_id != 0
        {
            self.streams.insert(info.ssrc);
        }
        self.inner.bind_remote_stream(info);
    }

    fn unbind_remote_stream(&mut self, info: &StreamInfo) {
        self.streams.remove(&info.ssrc);
        self.inner.unbind_remote_stream(info);
    }
}
