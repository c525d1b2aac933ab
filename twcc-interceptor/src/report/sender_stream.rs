use log::warn;
use rtcp::sender_report::SenderReport;
use shared::time::SystemInstant;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

struct State {
    /// Track if first packet has been processed
    started: bool,

    /// Last sequence number accepted as the latest packet
    last_rtp_sn: u16,

    /// RTP timestamp of the latest packet and when it was seen
    last_rtp_time_rtp: u32,
    last_rtp_time_time: Instant,

    counters: Counters,
}

/// Statistics of one outgoing stream, enough to produce its sender reports.
///
/// The RTP timestamp of the most recent in-order packet is extrapolated with
/// the clock rate to the instant a report is generated. Packet and octet
/// counts include every packet, in order or not.
pub struct SenderStream {
    ssrc: u32,
    clock_rate: f64,

    /// Whether to always use the latest packet, even if out-of-order.
    use_latest_packet: bool,

    time_baseline: SystemInstant,

    state: Mutex<State>,
}

impl SenderStream {
    pub fn new(ssrc: u32, clock_rate: u32, use_latest_packet: bool) -> Self {
        Self::with_time_baseline(ssrc, clock_rate, use_latest_packet, SystemInstant::now())
    }

    pub(crate) fn with_time_baseline(
        ssrc: u32,
        clock_rate: u32,
        use_latest_packet: bool,
        time_baseline: SystemInstant,
    ) -> Self {
        SenderStream {
            ssrc,
            clock_rate: clock_rate as f64,
            use_latest_packet,
            time_baseline,
            state: Mutex::new(State {
                started: false,
                last_rtp_sn: 0,
                last_rtp_time_rtp: 0,
                last_rtp_time_time: Instant::now(),
                counters: Default::default(),
            }),
        }
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("sender stream {} lock poisoned, recovering", self.ssrc);
            e.into_inner()
        })
    }

    /// Account for an outgoing RTP packet.
    pub fn process_rtp(
        &self,
        now: Instant,
        sequence_number: u16,
        rtp_timestamp: u32,
        payload_len: usize,
    ) {
        let mut state = self.lock();

        // ahead of the last accepted one in 16-bit serial arithmetic
        let in_order = (sequence_number.wrapping_sub(state.last_rtp_sn) as i16) > 0;
        if !state.started || self.use_latest_packet || in_order {
            state.started = true;
            state.last_rtp_sn = sequence_number;
            state.last_rtp_time_rtp = rtp_timestamp;
            state.last_rtp_time_time = now;
        }

        state.counters.increment_packets();
        state.counters.count_octets(payload_len);
    }

    pub fn generate_report(&self, now: Instant) -> SenderReport {
        let state = self.lock();
        SenderReport {
            ssrc: self.ssrc,
            ntp_time: self.time_baseline.ntp(now),
            rtp_time: state.last_rtp_time_rtp.wrapping_add(
                (now.saturating_duration_since(state.last_rtp_time_time)
                    .as_secs_f64()
                    * self.clock_rate) as u32,
            ),
            packet_count: state.counters.packet_count(),
            octet_count: state.counters.octet_count(),
            ..Default::default()
        }
    }
}

/// Wrapping counters used for generating [`SenderReport`]
#[derive(Default)]
pub(crate) struct Counters {
    packets: u32,
    octets: u32,
}

impl Counters {
    pub(crate) fn increment_packets(&mut self) {
        self.packets = self.packets.wrapping_add(1);
    }

    pub(crate) fn count_octets(&mut self, octets: usize) {
        // account for a payload size of at most `u32::MAX`
        // and log a message if larger
        self.octets = self
            .octets
            .wrapping_add(octets.try_into().unwrap_or_else(|_| {
                warn!("packet payload larger than 32 bits");
                u32::MAX
            }));
    }

    pub(crate) fn packet_count(&self) -> u32 {
        self.packets
    }

    pub(crate) fn octet_count(&self) -> u32 {
        self.octets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stream(use_latest_packet: bool) -> (SenderStream, Instant) {
        let now = Instant::now();
        let baseline = SystemInstant::new(now, Duration::from_secs(1_700_000_000));
        (
            SenderStream::with_time_baseline(1234, 90_000, use_latest_packet, baseline),
            now,
        )
    }

    #[test]
    fn test_counters_wrap() {
        let mut counters = Counters {
            packets: u32::MAX,
            octets: u32::MAX - 1,
        };
        counters.increment_packets();
        counters.count_octets(3);
        assert_eq!(counters.packet_count(), 0);
        assert_eq!(counters.octet_count(), 1);
    }

    #[test]
    fn test_report_extrapolates_rtp_time() {
        let (stream, start) = stream(false);
        stream.process_rtp(start, 10, 3_000, 100);

        let report = stream.generate_report(start + Duration::from_millis(500));
        assert_eq!(report.ssrc, 1234);
        assert_eq!(report.rtp_time, 3_000 + 45_000);
        assert_eq!(report.packet_count, 1);
        assert_eq!(report.octet_count, 100);
        assert_eq!(
            report.ntp_time,
            SystemInstant::unix2ntp(Duration::from_millis(1_700_000_000_500))
        );
    }

    #[test]
    fn test_out_of_order_packet_is_counted_only() {
        let (stream, start) = stream(false);
        stream.process_rtp(start, 10, 3_000, 100);
        stream.process_rtp(start + Duration::from_millis(20), 9, 1_200, 50);

        let report = stream.generate_report(start + Duration::from_millis(20));
        // extrapolated from sequence 10
        assert_eq!(report.rtp_time, 3_000 + 1_800);
        assert_eq!(report.packet_count, 2);
        assert_eq!(report.octet_count, 150);
    }

    #[test]
    fn test_use_latest_packet_accepts_out_of_order() {
        let (stream, start) = stream(true);
        stream.process_rtp(start, 10, 3_000, 100);
        stream.process_rtp(start + Duration::from_millis(20), 9, 1_200, 50);

        let report = stream.generate_report(start + Duration::from_millis(20));
        assert_eq!(report.rtp_time, 1_200);
    }

    #[test]
    fn test_sequence_wrap_is_in_order() {
        let (stream, start) = stream(false);
        stream.process_rtp(start, 65535, 100, 10);
        stream.process_rtp(start, 0, 200, 10);

        let report = stream.generate_report(start);
        assert_eq!(report.rtp_time, 200);
    }

    #[test]
    fn test_first_packet_always_accepted() {
        // 0x8000 behind the initial zero is negative as i16
        let (stream, start) = stream(false);
        stream.process_rtp(start, 0x8000, 777, 10);

        let report = stream.generate_report(start);
        assert_eq!(report.rtp_time, 777);
    }
}
