use crate::decode::util::*;
use crate::decode::Decoder;
use crate::frame::Frame;
use crate::observation::{BridgeId, Observation, StpObservation};
use tracing::*;

/// 802.3 length field upper bound; anything above is an EtherType.
const MAX_8023_LEN: u16 = 0x05DC;

/// Offset of the source address in the 802.3 header.
const SRC_MAC_OFFSET: usize = 6;
/// Offset of the length field in the 802.3 header.
const LEN_OFFSET: usize = 12;
const HEADER_LEN: usize = 14;

/// LLC DSAP/SSAP pair for spanning tree.
const STP_SAP: [u8; 2] = [0x42, 0x42];

const BPDU_CONFIG: u8 = 0x00;
const BPDU_RAPID: u8 = 0x02;

/// Extracts root and bridge identifiers from spanning-tree BPDUs
/// (802.3 + LLC with DSAP/SSAP 0x42/0x42).
///
/// The 802.3 header is read straight from the raw bytes: LLC frames sit
/// below the layers the slicer cares about, and a frame it balked at must
/// still decode.  The all-zero source some bridges emit is kept as-is, so
/// such BPDUs key their host to the zero MAC rather than being dropped.
///
/// Identifiers decode into host-order fields at parse time: the leading
/// 16-bit word splits into the 4-bit priority (kept as its multiple-of-4096
/// value) and the 12-bit system-id extension, followed by the 6-byte system
/// id.  Topology-change BPDUs carry no identifiers and decline.
pub struct StpDecoder;

impl Decoder for StpDecoder {
    fn name(&self) -> &'static str {
        "stp"
    }

    fn decode(&self, frame: &Frame<'_>) -> Option<Observation> {
        // An 802.3 frame keeps its payload length where Ethernet II keeps
        // the EtherType.
        if be_u16_at(frame.data, LEN_OFFSET)? > MAX_8023_LEN {
            return None;
        }
        let payload = frame.data.get(HEADER_LEN..)?;
        let llc = bytes_at(payload, 0, 3)?;
        if llc[..2] != STP_SAP {
            return None;
        }
        // Unlike ARP, a zero source is kept; the aggregator keys such
        // observations to the zero host.
        let sender_mac = mac_at(frame.data, SRC_MAC_OFFSET)?;

        // After the 3-byte LLC header: protocol id (2), version (1),
        // BPDU type (1), flags (1), then the identifiers.
        let body = &payload[3..];
        if be_u16_at(body, 0)? != 0x0000 {
            warn!("BPDU with unknown protocol identifier");
            return None;
        }
        let bpdu_type = u8_at(body, 3)?;
        if bpdu_type != BPDU_CONFIG && bpdu_type != BPDU_RAPID {
            debug!("BPDU type {bpdu_type:#04x} carries no identifiers; ignoring");
            return None;
        }
        let root = parse_bridge_id(bytes_at(body, 5, 8)?)?;
        let bridge = parse_bridge_id(bytes_at(body, 17, 8)?)?;

        Some(Observation::Stp(StpObservation {
            ts: frame.ts,
            sender_mac,
            root,
            bridge,
        }))
    }
}

fn parse_bridge_id(bytes: &[u8]) -> Option<BridgeId> {
    let word = be_u16_at(bytes, 0)?;
    Some(BridgeId {
        priority: word & 0xF000,
        system_id_ext: word & 0x0FFF,
        system_id: mac_at(bytes, 2)?,
    })
}
