use crate::header::{HEADER_LENGTH, Header, PacketType, FORMAT_TCC};
use crate::sender_report::SenderReport;
use crate::transport_feedbacks::transport_layer_cc::TransportLayerCc;
use bytes::{Buf, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, Unmarshal};
use std::any::Any;
use std::fmt;

/// Packet represents an RTCP packet, a protocol used for out-of-band statistics
/// and control information for an RTP session
pub trait Packet: Marshal + Unmarshal + fmt::Display + fmt::Debug + Send + Sync {
    fn header(&self) -> Header;
    fn destination_ssrc(&self) -> Vec<u32>;
    fn raw_size(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn equal(&self, other: &dyn Packet) -> bool;
    fn cloned(&self) -> Box<dyn Packet>;
}

impl PartialEq for dyn Packet {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Clone for Box<dyn Packet> {
    fn clone(&self) -> Box<dyn Packet> {
        self.cloned()
    }
}

/// marshal takes an array of Packets and serializes them to a single buffer
pub fn marshal(packets: &[Box<dyn Packet>]) -> Result<Bytes> {
    let mut out = BytesMut::new();
    for p in packets {
        let data = p.marshal()?;
        out.extend_from_slice(&data);
    }
    Ok(out.freeze())
}

/// Unmarshal takes an entire udp datagram (which may consist of multiple RTCP packets) and
/// returns the unmarshaled packets it contains.
///
/// Only sender reports and transport-wide congestion control feedback are
/// understood; any other packet type yields [`Error::WrongType`].
pub fn unmarshal<B>(raw_data: &mut B) -> Result<Vec<Box<dyn Packet>>>
where
    B: Buf,
{
    let mut packets = vec![];

    while raw_data.has_remaining() {
        let p = unmarshaller(raw_data)?;
        packets.push(p);
    }

    if packets.is_empty() {
        Err(Error::InvalidHeader)
    } else {
        Ok(packets)
    }
}

/// unmarshaller is a factory which pulls the first RTCP packet from a bytestream,
/// and returns it's parsed representation.
pub(crate) fn unmarshaller<B>(raw_data: &mut B) -> Result<Box<dyn Packet>>
where
    B: Buf,
{
    if raw_data.remaining() < HEADER_LENGTH {
        return Err(Error::PacketTooShort);
    }
    let header_bytes = raw_data.copy_to_bytes(HEADER_LENGTH);
    let h = Header::unmarshal(&mut header_bytes.clone())?;

    let length = (h.length as usize) * 4;
    if length > raw_data.remaining() {
        return Err(Error::PacketTooShort);
    }
    let mut in_packet = header_bytes.chain(raw_data.copy_to_bytes(length));

    let p: Box<dyn Packet> = match h.packet_type {
        PacketType::SenderReport => Box::new(SenderReport::unmarshal(&mut in_packet)?),
        PacketType::TransportSpecificFeedback if h.count == FORMAT_TCC => {
            Box::new(TransportLayerCc::unmarshal(&mut in_packet)?)
        }
        _ => return Err(Error::WrongType),
    };

    Ok(p)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport_feedbacks::transport_layer_cc::{
        PacketStatusChunk, RecvDelta, RunLengthChunk, StatusChunkTypeTcc, SymbolTypeTcc,
    };

    fn twcc() -> TransportLayerCc {
        TransportLayerCc {
            sender_ssrc: 0x1234,
            media_ssrc: 0x5678,
            base_sequence_number: 100,
            packet_status_count: 2,
            reference_time: 16,
            fb_pkt_count: 3,
            packet_chunks: vec![PacketStatusChunk::RunLengthChunk(RunLengthChunk {
                type_tcc: StatusChunkTypeTcc::RunLengthChunk,
                packet_status_symbol: SymbolTypeTcc::PacketReceivedSmallDelta,
                run_length: 2,
            })],
            recv_deltas: vec![
                RecvDelta {
                    type_tcc_packet: SymbolTypeTcc::PacketReceivedSmallDelta,
                    delta: 0,
                },
                RecvDelta {
                    type_tcc_packet: SymbolTypeTcc::PacketReceivedSmallDelta,
                    delta: 10_000,
                },
            ],
        }
    }

    fn sender_report() -> SenderReport {
        SenderReport {
            ssrc: 0x902f9e2e,
            ntp_time: 0xda8bd1fcdddda05a,
            rtp_time: 0xaaf4edd5,
            packet_count: 1,
            octet_count: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_packet_unmarshal_compound() {
        let packets: Vec<Box<dyn Packet>> = vec![Box::new(sender_report()), Box::new(twcc())];
        let data = marshal(&packets).unwrap();

        let parsed = unmarshal(&mut data.clone()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed, packets);

        let tlcc = parsed[1]
            .as_any()
            .downcast_ref::<TransportLayerCc>()
            .expect("second packet is TWCC feedback");
        assert_eq!(tlcc.base_sequence_number, 100);
        assert_eq!(parsed[1].destination_ssrc(), vec![0x5678]);
    }

    #[test]
    fn test_packet_unmarshal_empty() {
        let mut data = Bytes::new();
        assert_eq!(unmarshal(&mut data).unwrap_err(), Error::InvalidHeader);
    }

    #[test]
    fn test_packet_unmarshal_truncated() {
        let data = twcc().marshal().unwrap().freeze();
        let mut truncated = data.slice(..data.len() - 4);
        assert_eq!(unmarshal(&mut truncated).unwrap_err(), Error::PacketTooShort);
    }

    #[test]
    fn test_packet_unmarshal_unknown_type() {
        // v=2, p=0, count=0, BYE, len=0
        let mut data = Bytes::from_static(&[0x80, 0xcb, 0x00, 0x00]);
        assert_eq!(unmarshal(&mut data).unwrap_err(), Error::WrongType);
    }

    #[test]
    fn test_boxed_packet_clone() {
        let packet: Box<dyn Packet> = Box::new(twcc());
        let cloned = packet.clone();
        assert!(packet.equal(cloned.as_ref()));
    }
}
