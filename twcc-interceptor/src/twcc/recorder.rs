//! TWCC Recorder - tracks packet arrival times and builds feedback packets.

use super::arrival_ledger::{ArrivalLedger, PacketArrival};
use super::feedback::{DEFAULT_MAX_FEEDBACK_SIZE, assemble};
use super::sequence::SequenceExtender;
use log::{debug, trace, warn};
use rtcp::transport_feedbacks::transport_layer_cc::TransportLayerCc;
use std::sync::{Mutex, MutexGuard};

struct State {
    media_ssrc: u32,
    extender: SequenceExtender,
    ledger: ArrivalLedger,
    fb_pkt_count: u8,
}

/// Records incoming packet arrivals for one feedback sender and turns them
/// into TransportLayerCC reports.
///
/// `record` and `build_feedback` take `&self` and may be called from
/// different threads; each holds the recorder's lock for its whole run.
pub struct Recorder {
    sender_ssrc: u32,
    max_feedback_size: usize,
    state: Mutex<State>,
}

impl Recorder {
    /// Create a new Recorder with the given sender SSRC.
    pub fn new(sender_ssrc: u32) -> Self {
        Self::with_max_feedback_size(sender_ssrc, DEFAULT_MAX_FEEDBACK_SIZE)
    }

    /// Create a Recorder whose reports are at most `max_feedback_size` bytes.
    pub fn with_max_feedback_size(sender_ssrc: u32, max_feedback_size: usize) -> Self {
        Self {
            sender_ssrc,
            max_feedback_size,
            state: Mutex::new(State {
                media_ssrc: 0,
                extender: SequenceExtender::new(),
                ledger: ArrivalLedger::new(),
                fb_pkt_count: 0,
            }),
        }
    }

    pub fn sender_ssrc(&self) -> u32 {
        self.sender_ssrc
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("twcc recorder lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Record a packet arrival; `arrival_time` is in microseconds.
    pub fn record(&self, media_ssrc: u32, sequence_number: u16, arrival_time: i64) {
        let mut state = self.lock();
        state.media_ssrc = media_ssrc;
        let cycles = state.extender.cycles();
        let extended_sequence = state.extender.extend(sequence_number);
        if state.extender.cycles() != cycles {
            trace!(
                "transport sequence of ssrc {} wrapped at {}, cycles {:#x}",
                media_ssrc,
                sequence_number,
                state.extender.cycles()
            );
        }
        state
            .ledger
            .insert(PacketArrival::new(extended_sequence, arrival_time));
    }

    /// Returns the number of arrivals waiting for the next feedback.
    pub fn packets_held(&self) -> usize {
        self.lock().ledger.len()
    }

    /// Drain every recorded arrival into feedback reports.
    ///
    /// Fewer than two arrivals produce no report; they are dropped all the
    /// same.
    pub fn build_feedback(&self) -> Vec<TransportLayerCc> {
        let mut state = self.lock();
        let arrivals = state.ledger.drain_sorted();
        let media_ssrc = state.media_ssrc;

        let reports = assemble(
            &arrivals,
            self.sender_ssrc,
            media_ssrc,
            &mut state.fb_pkt_count,
            self.max_feedback_size,
        );
        if !reports.is_empty() {
            debug!(
                "built {} twcc feedback(s) for {} arrivals of ssrc {}",
                reports.len(),
                arrivals.len(),
                media_ssrc
            );
        }
        reports
    }

    /// Build TWCC feedback packets for all recorded arrivals.
    pub fn build_feedback_packet(&self) -> Vec<Box<dyn rtcp::Packet>> {
        self.build_feedback()
            .into_iter()
            .map(|tlcc| Box::new(tlcc) as Box<dyn rtcp::Packet>)
            .collect()
    }
}
