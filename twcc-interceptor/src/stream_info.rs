/// RTP header extension negotiated for a stream.
#[derive(Default, Debug, Clone)]
pub struct RTPHeaderExtension {
    pub uri: String,
    pub id: u16,
}

/// RTCP feedback mechanism negotiated for a stream.
#[derive(Default, Debug, Clone)]
pub struct RTCPFeedback {
    /// Type of feedback, e.g. "transport-cc" or "nack".
    pub typ: String,
    pub parameter: String,
}

/// StreamInfo is the context passed when a stream is bound or unbound.
#[derive(Default, Debug, Clone)]
pub struct StreamInfo {
    pub id: String,
    pub ssrc: u32,
    pub payload_type: u8,
    pub rtp_header_extensions: Vec<RTPHeaderExtension>,
    pub mime_type: String,
    pub clock_rate: u32,
    pub rtcp_feedback: Vec<RTCPFeedback>,
}
