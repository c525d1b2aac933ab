//! Assembly of TransportLayerCC reports from sorted packet arrivals.

use super::arrival_ledger::PacketArrival;
use log::{trace, warn};
use rtcp::header::HEADER_LENGTH;
use rtcp::transport_feedbacks::transport_layer_cc::{
    MAX_ONE_BIT_SYMBOLS, MAX_RUN_LENGTH, MAX_TWO_BIT_SYMBOLS, PACKET_CHUNK_OFFSET,
    PACKET_STATUS_CHUNK_LENGTH, PacketStatusChunk, RecvDelta, RunLengthChunk, StatusChunkTypeTcc,
    StatusVectorChunk, SymbolSizeTypeTcc, SymbolTypeTcc, TYPE_TCC_DELTA_SCALE_FACTOR,
    TransportLayerCc,
};

/// Upper bound on the encoded size of one report, in bytes.
pub const DEFAULT_MAX_FEEDBACK_SIZE: usize = 1200;

/// Smallest size bound that is honoured: a report holding a single packet
/// with a large delta. Smaller bounds are raised to this.
pub const MIN_FEEDBACK_SIZE: usize =
    HEADER_LENGTH + PACKET_CHUNK_OFFSET + PACKET_STATUS_CHUNK_LENGTH + 2;

/// Unit of the reference time field, in microseconds.
const REFERENCE_TIME_UNIT_US: i64 = 64_000;

/// Splits `arrivals` into TransportLayerCC reports no larger than `max_size`
/// bytes once encoded.
///
/// Fewer than two arrivals produce nothing and leave `fb_pkt_count` alone.
/// Otherwise every arrival lands in exactly one report, reports cover
/// contiguous slices of the input in order, and each report takes the
/// current `fb_pkt_count` before incrementing it.
///
/// A report is closed when the next arrival does not fit, either because its
/// receive delta overflows 16 bits, the status count would overflow, or the
/// encoded size would exceed `max_size`. The next report starts from that
/// same arrival.
pub fn assemble(
    arrivals: &[PacketArrival],
    sender_ssrc: u32,
    media_ssrc: u32,
    fb_pkt_count: &mut u8,
    max_size: usize,
) -> Vec<TransportLayerCc> {
    if arrivals.len() < 2 {
        return vec![];
    }
    let max_size = max_size.max(MIN_FEEDBACK_SIZE);

    let mut reports = vec![];
    let mut fb = Feedback::start(sender_ssrc, media_ssrc, fb_pkt_count, max_size, arrivals[0]);

    for arrival in arrivals {
        if fb.add_received(arrival.extended_sequence, arrival.arrival_time) {
            continue;
        }

        trace!(
            "feedback {} closed at {} statuses, next starts at {}",
            fb.fb_pkt_count, fb.sequence_number_count, arrival.extended_sequence
        );
        reports.push(fb.get_rtcp());

        fb = Feedback::start(sender_ssrc, media_ssrc, fb_pkt_count, max_size, *arrival);
        if !fb.add_received(arrival.extended_sequence, arrival.arrival_time) {
            warn!(
                "arrival {} does not fit an empty feedback of {} bytes",
                arrival.extended_sequence, max_size
            );
        }
    }
    reports.push(fb.get_rtcp());

    reports
}

/// A single TransportLayerCC report being filled.
struct Feedback {
    sender_ssrc: u32,
    media_ssrc: u32,
    fb_pkt_count: u8,
    max_size: usize,
    base_sequence_number: u16,
    ref_timestamp_64ms: i64,
    last_timestamp_us: i64,
    next_sequence_number: u32,
    sequence_number_count: u16,
    delta_bytes: usize,
    last_chunk: Chunk,
    chunks: Vec<PacketStatusChunk>,
    deltas: Vec<RecvDelta>,
}

impl Feedback {
    fn new(sender_ssrc: u32, media_ssrc: u32, fb_pkt_count: u8, max_size: usize) -> Self {
        Self {
            sender_ssrc,
            media_ssrc,
            fb_pkt_count,
            max_size,
            base_sequence_number: 0,
            ref_timestamp_64ms: 0,
            last_timestamp_us: 0,
            next_sequence_number: 0,
            sequence_number_count: 0,
            delta_bytes: 0,
            last_chunk: Chunk::new(),
            chunks: vec![],
            deltas: vec![],
        }
    }

    /// New report based at `first`, taking the next feedback packet count.
    fn start(
        sender_ssrc: u32,
        media_ssrc: u32,
        fb_pkt_count: &mut u8,
        max_size: usize,
        first: PacketArrival,
    ) -> Self {
        let mut fb = Feedback::new(sender_ssrc, media_ssrc, *fb_pkt_count, max_size);
        *fb_pkt_count = fb_pkt_count.wrapping_add(1);
        fb.set_base(first.extended_sequence, first.arrival_time);
        fb
    }

    fn set_base(&mut self, extended_sequence: u32, time_us: i64) {
        self.base_sequence_number = extended_sequence as u16;
        self.next_sequence_number = extended_sequence;
        self.ref_timestamp_64ms = time_us / REFERENCE_TIME_UNIT_US;
        self.last_timestamp_us = self.ref_timestamp_64ms * REFERENCE_TIME_UNIT_US;
    }

    /// Size of the report if it were closed now, padding included.
    fn encoded_size(&self) -> usize {
        let chunks = self.chunks.len() + self.last_chunk.pending();
        let l = HEADER_LENGTH
            + PACKET_CHUNK_OFFSET
            + chunks * PACKET_STATUS_CHUNK_LENGTH
            + self.delta_bytes;
        l + (4 - l % 4) % 4
    }

    fn push_symbol(&mut self, symbol: SymbolTypeTcc) {
        if !self.last_chunk.can_add(symbol) {
            self.chunks.push(self.last_chunk.encode());
        }
        self.last_chunk.add(symbol);
    }

    /// Adds a received packet, marking the packets skipped since the previous
    /// one as not received. Returns false, leaving the report untouched, when
    /// the packet does not fit.
    fn add_received(&mut self, extended_sequence: u32, timestamp_us: i64) -> bool {
        let Some(delta_us) = timestamp_us.checked_sub(self.last_timestamp_us) else {
            return false;
        };
        let delta_250us = if delta_us >= 0 {
            delta_us.saturating_add(TYPE_TCC_DELTA_SCALE_FACTOR / 2) / TYPE_TCC_DELTA_SCALE_FACTOR
        } else {
            delta_us.saturating_sub(TYPE_TCC_DELTA_SCALE_FACTOR / 2) / TYPE_TCC_DELTA_SCALE_FACTOR
        };

        // delta doesn't fit into 16 bit, need to create new packet
        if delta_250us < i16::MIN as i64 || delta_250us > i16::MAX as i64 {
            return false;
        }
        let delta_us_rounded = delta_250us * TYPE_TCC_DELTA_SCALE_FACTOR;

        let missing = extended_sequence.wrapping_sub(self.next_sequence_number) as usize;
        if self.sequence_number_count as usize + missing + 1 > u16::MAX as usize {
            return false;
        }

        let symbol = if (0..=0xff).contains(&delta_250us) {
            SymbolTypeTcc::PacketReceivedSmallDelta
        } else {
            SymbolTypeTcc::PacketReceivedLargeDelta
        };

        let checkpoint = (self.last_chunk, self.chunks.len());
        for _ in 0..missing {
            self.push_symbol(SymbolTypeTcc::PacketNotReceived);
        }
        self.push_symbol(symbol);
        self.delta_bytes += symbol.delta_size();

        if self.encoded_size() > self.max_size {
            self.delta_bytes -= symbol.delta_size();
            self.last_chunk = checkpoint.0;
            self.chunks.truncate(checkpoint.1);
            return false;
        }

        self.deltas.push(RecvDelta {
            type_tcc_packet: symbol,
            delta: delta_us_rounded,
        });
        self.last_timestamp_us += delta_us_rounded;
        self.sequence_number_count += missing as u16 + 1;
        self.next_sequence_number = extended_sequence.wrapping_add(1);

        true
    }

    fn get_rtcp(mut self) -> TransportLayerCc {
        while self.last_chunk.len > 0 {
            self.chunks.push(self.last_chunk.encode());
        }

        TransportLayerCc {
            sender_ssrc: self.sender_ssrc,
            media_ssrc: self.media_ssrc,
            base_sequence_number: self.base_sequence_number,
            packet_status_count: self.sequence_number_count,
            reference_time: (self.ref_timestamp_64ms as u32) & 0x00ff_ffff,
            fb_pkt_count: self.fb_pkt_count,
            packet_chunks: self.chunks,
            recv_deltas: self.deltas,
        }
    }
}

/// Status symbols waiting to be packed into a chunk.
///
/// Only the first 14 symbols are stored; a longer chunk is always a run of
/// one symbol, so its length says everything.
#[derive(Debug, Clone, Copy)]
struct Chunk {
    symbols: [SymbolTypeTcc; MAX_ONE_BIT_SYMBOLS],
    len: usize,
    has_large_delta: bool,
    has_different_types: bool,
}

impl Chunk {
    fn new() -> Self {
        Self {
            symbols: [SymbolTypeTcc::PacketNotReceived; MAX_ONE_BIT_SYMBOLS],
            len: 0,
            has_large_delta: false,
            has_different_types: false,
        }
    }

    fn can_add(&self, symbol: SymbolTypeTcc) -> bool {
        if self.len < MAX_TWO_BIT_SYMBOLS {
            return true;
        }
        if self.len < MAX_ONE_BIT_SYMBOLS
            && !self.has_large_delta
            && symbol != SymbolTypeTcc::PacketReceivedLargeDelta
        {
            return true;
        }
        self.len < MAX_RUN_LENGTH as usize
            && !self.has_different_types
            && symbol == self.symbols[0]
    }

    fn add(&mut self, symbol: SymbolTypeTcc) {
        if self.len > 0 && symbol != self.symbols[0] {
            self.has_different_types = true;
        }
        self.has_large_delta =
            self.has_large_delta || symbol == SymbolTypeTcc::PacketReceivedLargeDelta;
        if self.len < MAX_ONE_BIT_SYMBOLS {
            self.symbols[self.len] = symbol;
        }
        self.len += 1;
    }

    /// Number of chunks `encode` has to be called for to empty this one.
    fn pending(&self) -> usize {
        match self.len {
            0 => 0,
            n if !self.has_different_types
                || n <= MAX_TWO_BIT_SYMBOLS
                || n == MAX_ONE_BIT_SYMBOLS =>
            {
                1
            }
            _ => 2,
        }
    }

    fn encode(&mut self) -> PacketStatusChunk {
        let chunk = if !self.has_different_types {
            PacketStatusChunk::RunLengthChunk(RunLengthChunk {
                type_tcc: StatusChunkTypeTcc::RunLengthChunk,
                packet_status_symbol: self.symbols[0],
                run_length: self.len as u16,
            })
        } else if self.len == MAX_ONE_BIT_SYMBOLS {
            PacketStatusChunk::StatusVectorChunk(StatusVectorChunk {
                type_tcc: StatusChunkTypeTcc::StatusVectorChunk,
                symbol_size: SymbolSizeTypeTcc::OneBit,
                symbol_list: self.symbols.to_vec(),
            })
        } else {
            PacketStatusChunk::StatusVectorChunk(StatusVectorChunk {
                type_tcc: StatusChunkTypeTcc::StatusVectorChunk,
                symbol_size: SymbolSizeTypeTcc::TwoBit,
                symbol_list: self.symbols[..self.len.min(MAX_TWO_BIT_SYMBOLS)].to_vec(),
            })
        };

        if !self.has_different_types || self.len == MAX_ONE_BIT_SYMBOLS {
            *self = Chunk::new();
            return chunk;
        }

        let taken = self.len.min(MAX_TWO_BIT_SYMBOLS);
        self.symbols.copy_within(taken..self.len, 0);
        self.len -= taken;

        let rest = &self.symbols[..self.len];
        self.has_different_types = rest.iter().any(|s| *s != rest[0]);
        self.has_large_delta = rest.contains(&SymbolTypeTcc::PacketReceivedLargeDelta);

        chunk
    }
}
