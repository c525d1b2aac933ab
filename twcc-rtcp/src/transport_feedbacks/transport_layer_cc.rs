use crate::header::{FORMAT_TCC, HEADER_LENGTH, Header, PacketType};
use crate::packet::Packet;
use crate::util::{get_padding_size, put_padding};
use bytes::{Buf, BufMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};
use std::any::Any;
use std::fmt;

/// Bytes between the common header and the first packet status chunk:
/// sender SSRC, media SSRC, base sequence number, packet status count,
/// reference time and feedback packet count.
pub const PACKET_CHUNK_OFFSET: usize = 16;
/// A packet status chunk is always 16 bits.
pub const PACKET_STATUS_CHUNK_LENGTH: usize = 2;
/// Receive deltas are expressed in multiples of 250us.
pub const TYPE_TCC_DELTA_SCALE_FACTOR: i64 = 250;

/// Longest run a run length chunk can describe (13 bits).
pub const MAX_RUN_LENGTH: u16 = 0x1fff;
/// Symbols held by a status vector chunk with one bit symbols.
pub const MAX_ONE_BIT_SYMBOLS: usize = 14;
/// Symbols held by a status vector chunk with two bit symbols.
pub const MAX_TWO_BIT_SYMBOLS: usize = 7;

/// StatusChunkTypeTcc is the first bit of a packet status chunk
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum StatusChunkTypeTcc {
    #[default]
    RunLengthChunk = 0,
    StatusVectorChunk = 1,
}

/// SymbolSizeTypeTcc is the symbol size of a status vector chunk
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum SymbolSizeTypeTcc {
    #[default]
    OneBit = 0,
    TwoBit = 1,
}

/// SymbolTypeTcc is the status of a single packet
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum SymbolTypeTcc {
    /// https://tools.ietf.org/html/draft-holmer-rmcat-transport-wide-cc-extensions-01#section-3.1.1
    #[default]
    PacketNotReceived = 0,
    /// Received with a one byte delta (0..63.75ms).
    PacketReceivedSmallDelta = 1,
    /// Received with a two byte, possibly negative, delta.
    PacketReceivedLargeDelta = 2,
    /// Reserved by the draft; never produced, rejected on parse.
    PacketReceivedWithoutDelta = 3,
}

impl From<u16> for SymbolTypeTcc {
    fn from(val: u16) -> Self {
        match val & 0x3 {
            0 => SymbolTypeTcc::PacketNotReceived,
            1 => SymbolTypeTcc::PacketReceivedSmallDelta,
            2 => SymbolTypeTcc::PacketReceivedLargeDelta,
            _ => SymbolTypeTcc::PacketReceivedWithoutDelta,
        }
    }
}

impl SymbolTypeTcc {
    /// Size of the receive delta a packet with this status contributes.
    pub fn delta_size(self) -> usize {
        match self {
            SymbolTypeTcc::PacketReceivedSmallDelta => 1,
            SymbolTypeTcc::PacketReceivedLargeDelta => 2,
            _ => 0,
        }
    }
}

/// PacketStatusChunk has two kinds:
/// RunLengthChunk and StatusVectorChunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketStatusChunk {
    RunLengthChunk(RunLengthChunk),
    StatusVectorChunk(StatusVectorChunk),
}

impl PacketStatusChunk {
    /// Number of packet statuses this chunk describes.
    pub fn symbol_count(&self) -> usize {
        match self {
            PacketStatusChunk::RunLengthChunk(c) => c.run_length as usize,
            PacketStatusChunk::StatusVectorChunk(c) => c.symbol_list.len(),
        }
    }
}

impl MarshalSize for PacketStatusChunk {
    fn marshal_size(&self) -> usize {
        PACKET_STATUS_CHUNK_LENGTH
    }
}

impl Marshal for PacketStatusChunk {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        match self {
            PacketStatusChunk::RunLengthChunk(c) => c.marshal_to(buf),
            PacketStatusChunk::StatusVectorChunk(c) => c.marshal_to(buf),
        }
    }
}

/// RunLengthChunk T=TypeTCCRunLengthChunk
/// 0                   1
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |T| S |       Run Length        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunLengthChunk {
    /// T = TypeTCCRunLengthChunk
    pub type_tcc: StatusChunkTypeTcc,
    /// S: type of packet status
    pub packet_status_symbol: SymbolTypeTcc,
    /// run_length: count of S
    pub run_length: u16,
}

impl MarshalSize for RunLengthChunk {
    fn marshal_size(&self) -> usize {
        PACKET_STATUS_CHUNK_LENGTH
    }
}

impl Marshal for RunLengthChunk {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < PACKET_STATUS_CHUNK_LENGTH {
            return Err(Error::BufferTooShort);
        }
        if self.run_length > MAX_RUN_LENGTH {
            return Err(Error::RunLengthTooLong);
        }

        // append 1 bit '0'
        let mut dst = 0u16;
        // append 2 bit packet_status_symbol
        dst |= (self.packet_status_symbol as u16) << 13;
        // append 13 bit run_length
        dst |= self.run_length;

        buf.put_u16(dst);
        Ok(PACKET_STATUS_CHUNK_LENGTH)
    }
}

impl Unmarshal for RunLengthChunk {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < PACKET_STATUS_CHUNK_LENGTH {
            return Err(Error::PacketStatusChunkLength);
        }

        let b = raw_packet.get_u16();
        if b >> 15 != StatusChunkTypeTcc::RunLengthChunk as u16 {
            return Err(Error::WrongChunkType);
        }

        Ok(RunLengthChunk {
            type_tcc: StatusChunkTypeTcc::RunLengthChunk,
            packet_status_symbol: SymbolTypeTcc::from(b >> 13),
            run_length: b & MAX_RUN_LENGTH,
        })
    }
}

/// StatusVectorChunk T=typeStatusVecotrChunk
/// 0                   1
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |T|S|       symbol list         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusVectorChunk {
    /// T = TypeTCCStatusVectorChunk
    pub type_tcc: StatusChunkTypeTcc,
    /// TypeTCCSymbolSizeOneBit or TypeTCCSymbolSizeTwoBit
    pub symbol_size: SymbolSizeTypeTcc,
    /// when symbol_size = TypeTCCSymbolSizeOneBit, symbol_list is 14*1bit:
    /// TypeTCCSymbolListPacketReceived or TypeTCCSymbolListPacketNotReceived
    /// when symbol_size = TypeTCCSymbolSizeTwoBit, symbol_list is 7*2bit:
    /// TypeTCCPacketNotReceived TypeTCCPacketReceivedSmallDelta TypeTCCPacketReceivedLargeDelta or typePacketReserved
    ///
    /// A list shorter than the chunk capacity is padded with not received on the wire.
    pub symbol_list: Vec<SymbolTypeTcc>,
}

impl MarshalSize for StatusVectorChunk {
    fn marshal_size(&self) -> usize {
        PACKET_STATUS_CHUNK_LENGTH
    }
}

impl Marshal for StatusVectorChunk {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        if buf.remaining_mut() < PACKET_STATUS_CHUNK_LENGTH {
            return Err(Error::BufferTooShort);
        }

        // set first bit to 1
        let mut dst = 1u16 << 15;
        // set second bit to symbol_size
        dst |= (self.symbol_size as u16) << 14;

        match self.symbol_size {
            SymbolSizeTypeTcc::OneBit => {
                if self.symbol_list.len() > MAX_ONE_BIT_SYMBOLS {
                    return Err(Error::StatusVectorTooLong);
                }
                for (i, s) in self.symbol_list.iter().enumerate() {
                    let bit = match s {
                        SymbolTypeTcc::PacketNotReceived => 0u16,
                        SymbolTypeTcc::PacketReceivedSmallDelta => 1u16,
                        _ => return Err(Error::WrongChunkType),
                    };
                    dst |= bit << (13 - i);
                }
            }
            SymbolSizeTypeTcc::TwoBit => {
                if self.symbol_list.len() > MAX_TWO_BIT_SYMBOLS {
                    return Err(Error::StatusVectorTooLong);
                }
                for (i, s) in self.symbol_list.iter().enumerate() {
                    dst |= (*s as u16) << (12 - 2 * i);
                }
            }
        }

        buf.put_u16(dst);
        Ok(PACKET_STATUS_CHUNK_LENGTH)
    }
}

impl Unmarshal for StatusVectorChunk {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < PACKET_STATUS_CHUNK_LENGTH {
            return Err(Error::PacketStatusChunkLength);
        }

        let b = raw_packet.get_u16();
        if b >> 15 != StatusChunkTypeTcc::StatusVectorChunk as u16 {
            return Err(Error::WrongChunkType);
        }

        let (symbol_size, symbol_list) = if (b >> 14) & 0x1 == SymbolSizeTypeTcc::OneBit as u16 {
            let list = (0..MAX_ONE_BIT_SYMBOLS)
                .map(|i| {
                    if (b >> (13 - i)) & 0x1 == 1 {
                        SymbolTypeTcc::PacketReceivedSmallDelta
                    } else {
                        SymbolTypeTcc::PacketNotReceived
                    }
                })
                .collect();
            (SymbolSizeTypeTcc::OneBit, list)
        } else {
            let list = (0..MAX_TWO_BIT_SYMBOLS)
                .map(|i| SymbolTypeTcc::from(b >> (12 - 2 * i)))
                .collect();
            (SymbolSizeTypeTcc::TwoBit, list)
        };

        Ok(StatusVectorChunk {
            type_tcc: StatusChunkTypeTcc::StatusVectorChunk,
            symbol_size,
            symbol_list,
        })
    }
}

/// RecvDelta are represented as multiples of 250us
/// small delta is 1 byte: [0，63.75]ms = [0, 63750]us = [0, 255]*250us
/// big delta is 2 bytes: [-8192.0, 8191.75]ms = [-8192000, 8191750]us = [-32768, 32767]*250us
/// <https://tools.ietf.org/html/draft-holmer-rmcat-transport-wide-cc-extensions-01#section-3.1.5>
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecvDelta {
    pub type_tcc_packet: SymbolTypeTcc,
    /// delta in microseconds
    pub delta: i64,
}

impl MarshalSize for RecvDelta {
    fn marshal_size(&self) -> usize {
        self.type_tcc_packet.delta_size()
    }
}

impl Marshal for RecvDelta {
    fn marshal_to(&self, mut buf: &mut [u8]) -> Result<usize> {
        let size = self.marshal_size();
        if buf.remaining_mut() < size {
            return Err(Error::BufferTooShort);
        }

        let delta = self.delta / TYPE_TCC_DELTA_SCALE_FACTOR;
        match self.type_tcc_packet {
            SymbolTypeTcc::PacketReceivedSmallDelta if (0..=u8::MAX as i64).contains(&delta) => {
                buf.put_u8(delta as u8);
                Ok(size)
            }
            SymbolTypeTcc::PacketReceivedLargeDelta
                if (i16::MIN as i64..=i16::MAX as i64).contains(&delta) =>
            {
                buf.put_i16(delta as i16);
                Ok(size)
            }
            _ => Err(Error::DeltaExceedLimit),
        }
    }
}

/// Transport-wide congestion control feedback
/// <https://tools.ietf.org/html/draft-holmer-rmcat-transport-wide-cc-extensions-01#section-3.1>
///
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|  FMT=15 |    PT=205     |           length              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     SSRC of packet sender                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      SSRC of media source                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      base sequence number     |      packet status count      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 reference time                | fb pkt. count |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          packet chunk         |         packet chunk          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// .                                                               .
/// .                                                               .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         packet chunk          |  recv delta   |  recv delta   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// .                                                               .
/// .                                                               .
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           recv delta          |  recv delta   | zero padding  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct TransportLayerCc {
    /// SSRC of sender
    pub sender_ssrc: u32,
    /// SSRC of the media source
    pub media_ssrc: u32,
    /// Transport wide sequence of rtp extension
    pub base_sequence_number: u16,
    /// packet_status_count
    pub packet_status_count: u16,
    /// reference_time, 24 bits, in multiples of 64ms
    pub reference_time: u32,
    /// fb_pkt_count
    pub fb_pkt_count: u8,
    /// packet_chunks
    pub packet_chunks: Vec<PacketStatusChunk>,
    /// recv_deltas
    pub recv_deltas: Vec<RecvDelta>,
}

impl fmt::Display for TransportLayerCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        out += format!("TransportLayerCC:\n\tSender Ssrc {}\n", self.sender_ssrc).as_str();
        out += format!("\tMedia Ssrc {}\n", self.media_ssrc).as_str();
        out += format!("\tBase Sequence Number {}\n", self.base_sequence_number).as_str();
        out += format!("\tStatus Count {}\n", self.packet_status_count).as_str();
        out += format!("\tReference Time {}\n", self.reference_time).as_str();
        out += format!("\tFeedback Packet Count {}\n", self.fb_pkt_count).as_str();
        out += "\tpacket_chunks ";
        for chunk in &self.packet_chunks {
            out += format!("{chunk:?} ").as_str();
        }
        out += "\n\trecv_deltas ";
        for delta in &self.recv_deltas {
            out += format!("{delta:?} ").as_str();
        }
        out += "\n";

        write!(f, "{out}")
    }
}

impl Packet for TransportLayerCc {
    fn header(&self) -> Header {
        Header {
            padding: get_padding_size(self.raw_size()) != 0,
            count: FORMAT_TCC,
            packet_type: PacketType::TransportSpecificFeedback,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }

    /// destination_ssrc returns an array of SSRC values that this packet refers to.
    fn destination_ssrc(&self) -> Vec<u32> {
        vec![self.media_ssrc]
    }

    fn raw_size(&self) -> usize {
        HEADER_LENGTH
            + PACKET_CHUNK_OFFSET
            + self.packet_chunks.len() * PACKET_STATUS_CHUNK_LENGTH
            + self
                .recv_deltas
                .iter()
                .map(|d| d.marshal_size())
                .sum::<usize>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other.as_any().downcast_ref::<TransportLayerCc>() == Some(self)
    }

    fn cloned(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}

impl MarshalSize for TransportLayerCc {
    fn marshal_size(&self) -> usize {
        let l = self.raw_size();
        // align to 32-bit boundary
        l + get_padding_size(l)
    }
}

impl Marshal for TransportLayerCc {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        let size = self.marshal_size();
        if buf.len() < size {
            return Err(Error::BufferTooShort);
        }

        let mut offset = self.header().marshal_to(buf)?;
        {
            let mut writer = &mut buf[offset..];
            writer.put_u32(self.sender_ssrc);
            writer.put_u32(self.media_ssrc);
            writer.put_u16(self.base_sequence_number);
            writer.put_u16(self.packet_status_count);
            writer.put_u8((self.reference_time >> 16) as u8);
            writer.put_u16(self.reference_time as u16);
            writer.put_u8(self.fb_pkt_count);
        }
        offset += PACKET_CHUNK_OFFSET;

        for chunk in &self.packet_chunks {
            offset += chunk.marshal_to(&mut buf[offset..])?;
        }

        for delta in &self.recv_deltas {
            offset += delta.marshal_to(&mut buf[offset..])?;
        }

        let padding_size = get_padding_size(offset);
        put_padding(buf, offset, padding_size);

        Ok(offset + padding_size)
    }
}

impl Unmarshal for TransportLayerCc {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let raw_packet_len = raw_packet.remaining();
        if raw_packet_len < HEADER_LENGTH + PACKET_CHUNK_OFFSET {
            return Err(Error::PacketTooShort);
        }

        let h = Header::unmarshal(raw_packet)?;
        if h.packet_type != PacketType::TransportSpecificFeedback || h.count != FORMAT_TCC {
            return Err(Error::WrongType);
        }

        // https://tools.ietf.org/html/rfc4585#page-33
        // header's length + payload's length
        let total_length = (h.length as usize + 1) * 4;
        if total_length < HEADER_LENGTH + PACKET_CHUNK_OFFSET {
            return Err(Error::HeaderTooSmall);
        }
        if total_length > raw_packet_len {
            return Err(Error::PacketTooShort);
        }

        let sender_ssrc = raw_packet.get_u32();
        let media_ssrc = raw_packet.get_u32();
        let base_sequence_number = raw_packet.get_u16();
        let packet_status_count = raw_packet.get_u16();
        let reference_time =
            ((raw_packet.get_u8() as u32) << 16) | (raw_packet.get_u16() as u32);
        let fb_pkt_count = raw_packet.get_u8();

        let mut body =
            raw_packet.copy_to_bytes(total_length - HEADER_LENGTH - PACKET_CHUNK_OFFSET);
        if h.padding {
            let padding = body.last().copied().unwrap_or(0) as usize;
            if padding == 0 || padding > body.len() {
                return Err(Error::WrongPadding);
            }
            body.truncate(body.len() - padding);
        }

        let status_count = packet_status_count as usize;
        let mut packet_chunks = vec![];
        // statuses that carry a receive delta, in order
        let mut received = vec![];
        let mut processed = 0usize;

        while processed < status_count {
            if body.remaining() < PACKET_STATUS_CHUNK_LENGTH {
                return Err(Error::PacketTooShort);
            }
            let remaining = status_count - processed;

            if body[0] >> 7 == StatusChunkTypeTcc::RunLengthChunk as u8 {
                let chunk = RunLengthChunk::unmarshal(&mut body)?;
                let n = (chunk.run_length as usize).min(remaining);
                if chunk.packet_status_symbol != SymbolTypeTcc::PacketNotReceived {
                    received.extend(std::iter::repeat_n(chunk.packet_status_symbol, n));
                }
                processed += n;
                packet_chunks.push(PacketStatusChunk::RunLengthChunk(chunk));
            } else {
                let mut chunk = StatusVectorChunk::unmarshal(&mut body)?;
                chunk.symbol_list.truncate(remaining);
                processed += chunk.symbol_list.len();
                received.extend(
                    chunk
                        .symbol_list
                        .iter()
                        .copied()
                        .filter(|s| *s != SymbolTypeTcc::PacketNotReceived),
                );
                packet_chunks.push(PacketStatusChunk::StatusVectorChunk(chunk));
            }
        }

        let mut recv_deltas = Vec::with_capacity(received.len());
        for type_tcc_packet in received {
            let delta = match type_tcc_packet {
                SymbolTypeTcc::PacketReceivedSmallDelta => {
                    if body.remaining() < 1 {
                        return Err(Error::PacketTooShort);
                    }
                    body.get_u8() as i64
                }
                SymbolTypeTcc::PacketReceivedLargeDelta => {
                    if body.remaining() < 2 {
                        return Err(Error::PacketTooShort);
                    }
                    body.get_i16() as i64
                }
                _ => return Err(Error::ReservedPacketStatus),
            };
            recv_deltas.push(RecvDelta {
                type_tcc_packet,
                delta: delta * TYPE_TCC_DELTA_SCALE_FACTOR,
            });
        }

        Ok(TransportLayerCc {
            sender_ssrc,
            media_ssrc,
            base_sequence_number,
            packet_status_count,
            reference_time,
            fb_pkt_count,
            packet_chunks,
            recv_deltas,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::Bytes;

    fn small(delta: i64) -> RecvDelta {
        RecvDelta {
            type_tcc_packet: SymbolTypeTcc::PacketReceivedSmallDelta,
            delta,
        }
    }

    fn large(delta: i64) -> RecvDelta {
        RecvDelta {
            type_tcc_packet: SymbolTypeTcc::PacketReceivedLargeDelta,
            delta,
        }
    }

    #[test]
    fn test_run_length_chunk() {
        let chunk = RunLengthChunk {
            type_tcc: StatusChunkTypeTcc::RunLengthChunk,
            packet_status_symbol: SymbolTypeTcc::PacketReceivedSmallDelta,
            run_length: 221,
        };
        let raw = chunk.marshal().unwrap();
        assert_eq!(&raw[..], &[0x20, 0xdd]);
        assert_eq!(RunLengthChunk::unmarshal(&mut raw.freeze()).unwrap(), chunk);

        let too_long = RunLengthChunk {
            run_length: MAX_RUN_LENGTH + 1,
            ..Default::default()
        };
        assert_eq!(too_long.marshal(), Err(Error::RunLengthTooLong));

        let mut vector = Bytes::from_static(&[0x9f, 0x1c]);
        assert_eq!(
            RunLengthChunk::unmarshal(&mut vector),
            Err(Error::WrongChunkType)
        );
    }

    #[test]
    fn test_status_vector_chunk_one_bit() {
        // 0b1001_1111_0001_1100
        let mut raw = Bytes::from_static(&[0x9f, 0x1c]);
        let chunk = StatusVectorChunk::unmarshal(&mut raw).unwrap();

        use super::SymbolTypeTcc::{PacketNotReceived as N, PacketReceivedSmallDelta as R};
        assert_eq!(chunk.symbol_size, SymbolSizeTypeTcc::OneBit);
        assert_eq!(
            chunk.symbol_list,
            vec![N, R, R, R, R, R, N, N, N, R, R, R, N, N]
        );
        assert_eq!(&chunk.marshal().unwrap()[..], &[0x9f, 0x1c]);
    }

    #[test]
    fn test_status_vector_chunk_two_bit() {
        use super::SymbolTypeTcc::{
            PacketNotReceived as N, PacketReceivedLargeDelta as L, PacketReceivedSmallDelta as R,
        };
        let chunk = StatusVectorChunk {
            type_tcc: StatusChunkTypeTcc::StatusVectorChunk,
            symbol_size: SymbolSizeTypeTcc::TwoBit,
            symbol_list: vec![R, N, L, R],
        };
        let raw = chunk.marshal().unwrap();
        assert_eq!(&raw[..], &[0xd2, 0x40]);

        let parsed = StatusVectorChunk::unmarshal(&mut raw.freeze()).unwrap();
        assert_eq!(parsed.symbol_list, vec![R, N, L, R, N, N, N]);

        let too_long = StatusVectorChunk {
            symbol_list: vec![R; 8],
            ..chunk
        };
        assert_eq!(too_long.marshal(), Err(Error::StatusVectorTooLong));
    }

    #[test]
    fn test_recv_delta_marshal() {
        assert_eq!(&small(63_750).marshal().unwrap()[..], &[0xff]);
        assert_eq!(&large(-500).marshal().unwrap()[..], &[0xff, 0xfe]);
        assert_eq!(&large(8_191_750).marshal().unwrap()[..], &[0x7f, 0xff]);

        assert_eq!(small(64_000).marshal(), Err(Error::DeltaExceedLimit));
        assert_eq!(small(-250).marshal(), Err(Error::DeltaExceedLimit));
        assert_eq!(large(8_192_000).marshal(), Err(Error::DeltaExceedLimit));
    }

    #[test]
    fn test_transport_layer_cc_unmarshal() {
        let raw = Bytes::from_static(&[
            // v=2, p=1, fmt=15, TSFB, len=5
            0xaf, 0xcd, 0x00, 0x05, //
            // sender ssrc=0xfa17fa17
            0xfa, 0x17, 0xfa, 0x17, //
            // media ssrc=0x43032fa0
            0x43, 0x03, 0x2f, 0xa0, //
            // base=153, status count=1
            0x00, 0x99, 0x00, 0x01, //
            // reference time=0x3de802, fb count=23
            0x3d, 0xe8, 0x02, 0x17, //
            // run length chunk: small delta x1, recv delta 148, pad 1
            0x20, 0x01, 0x94, 0x01,
        ]);

        let want = TransportLayerCc {
            sender_ssrc: 0xfa17fa17,
            media_ssrc: 0x43032fa0,
            base_sequence_number: 153,
            packet_status_count: 1,
            reference_time: 4057090,
            fb_pkt_count: 23,
            packet_chunks: vec![PacketStatusChunk::RunLengthChunk(RunLengthChunk {
                type_tcc: StatusChunkTypeTcc::RunLengthChunk,
                packet_status_symbol: SymbolTypeTcc::PacketReceivedSmallDelta,
                run_length: 1,
            })],
            recv_deltas: vec![small(37_000)],
        };

        let got = TransportLayerCc::unmarshal(&mut raw.clone()).unwrap();
        assert_eq!(got, want);
        assert!(got.header().padding);
        assert_eq!(got.marshal().unwrap().freeze(), raw);
    }

    #[test]
    fn test_transport_layer_cc_round_trip_mixed_chunks() {
        use super::SymbolTypeTcc::{
            PacketNotReceived as N, PacketReceivedLargeDelta as L, PacketReceivedSmallDelta as R,
        };
        let tlcc = TransportLayerCc {
            sender_ssrc: 1,
            media_ssrc: 2,
            base_sequence_number: 65534,
            packet_status_count: 18,
            reference_time: 0xffffff,
            fb_pkt_count: 255,
            // only the last vector may be shorter than its capacity
            packet_chunks: vec![
                PacketStatusChunk::StatusVectorChunk(StatusVectorChunk {
                    type_tcc: StatusChunkTypeTcc::StatusVectorChunk,
                    symbol_size: SymbolSizeTypeTcc::OneBit,
                    symbol_list: vec![R, R, N, N, N, N, N, N, N, N, N, N, N, R],
                }),
                PacketStatusChunk::StatusVectorChunk(StatusVectorChunk {
                    type_tcc: StatusChunkTypeTcc::StatusVectorChunk,
                    symbol_size: SymbolSizeTypeTcc::TwoBit,
                    symbol_list: vec![R, N, L, R],
                }),
            ],
            recv_deltas: vec![
                small(0),
                small(1_000),
                small(500),
                small(250),
                large(-500),
                small(63_750),
            ],
        };

        assert_eq!(tlcc.raw_size(), 4 + 16 + 4 + 7);
        assert_eq!(tlcc.marshal_size(), 32);
        assert_eq!(tlcc.header().length, 7);

        let raw = tlcc.marshal().unwrap();
        let parsed = TransportLayerCc::unmarshal(&mut raw.freeze()).unwrap();
        assert_eq!(parsed, tlcc);
    }

    #[test]
    fn test_transport_layer_cc_reserved_symbol() {
        let mut raw = Bytes::from_static(&[
            0x8f, 0xcd, 0x00, 0x05, //
            0x00, 0x00, 0x00, 0x01, //
            0x00, 0x00, 0x00, 0x02, //
            0x00, 0x00, 0x00, 0x01, //
            0x00, 0x00, 0x00, 0x00, //
            // run length chunk with the reserved symbol
            0x60, 0x01, 0x00, 0x00,
        ]);
        assert_eq!(
            TransportLayerCc::unmarshal(&mut raw),
            Err(Error::ReservedPacketStatus)
        );
    }

    #[test]
    fn test_transport_layer_cc_truncated_deltas() {
        let mut raw = Bytes::from_static(&[
            0x8f, 0xcd, 0x00, 0x05, //
            0x00, 0x00, 0x00, 0x01, //
            0x00, 0x00, 0x00, 0x02, //
            0x00, 0x00, 0x00, 0x02, //
            0x00, 0x00, 0x00, 0x00, //
            // two large deltas announced, one present
            0x40, 0x02, 0x00, 0x04,
        ]);
        assert_eq!(
            TransportLayerCc::unmarshal(&mut raw),
            Err(Error::PacketTooShort)
        );
    }

    #[test]
    fn test_transport_layer_cc_wrong_type() {
        let mut raw = Bytes::from_static(&[
            // fmt=1 (generic NACK)
            0x81, 0xcd, 0x00, 0x04, //
            0x00, 0x00, 0x00, 0x01, //
            0x00, 0x00, 0x00, 0x02, //
            0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00,
        ]);
        assert_eq!(
            TransportLayerCc::unmarshal(&mut raw),
            Err(Error::WrongType)
        );
    }
}
