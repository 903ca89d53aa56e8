use crate::decode::util::*;
use crate::decode::Decoder;
use crate::frame::Frame;
use crate::observation::{LldpObservation, Observation};
use tracing::*;

pub(crate) const ETHERTYPE_LLDP: u16 = 0x88CC;

const TLV_END_OF_LLDPDU: u8 = 0;
const TLV_CHASSIS_ID: u8 = 1;
const TLV_PORT_ID: u8 = 2;
const TLV_TTL: u8 = 3;
const TLV_PORT_DESCRIPTION: u8 = 4;
const TLV_SYSTEM_NAME: u8 = 5;
const TLV_SYSTEM_DESCRIPTION: u8 = 6;
const TLV_SYSTEM_CAPABILITIES: u8 = 7;
const TLV_MANAGEMENT_ADDRESS: u8 = 8;
const TLV_ORGANIZATION_SPECIFIC: u8 = 127;

/// Extracts neighbour identity from LLDP advertisements (EtherType 0x88CC).
///
/// Each TLV header is a 16-bit big-endian word packing a 7-bit type and a
/// 9-bit length.  The walk stops at end-of-LLDPDU; a TLV overrunning the
/// frame or a type outside the standard set declines the whole frame.
pub struct LldpDecoder;

impl Decoder for LldpDecoder {
    fn name(&self) -> &'static str {
        "lldp"
    }

    fn decode(&self, frame: &Frame<'_>) -> Option<Observation> {
        if frame.ether_type()? != ETHERTYPE_LLDP {
            return None;
        }
        let sender_mac = frame.src_mac()?;
        let payload = frame.ether_payload()?;

        let mut port_id = String::new();
        let mut port_description = String::new();
        let mut system_name = String::new();
        let mut system_description = String::new();

        let mut pos = 0;
        while pos < payload.len() {
            let header = be_u16_at(payload, pos)?;
            let tlv_type = (header >> 9) as u8;
            let tlv_len = usize::from(header & 0x1FF);
            pos += 2;
            if tlv_type == TLV_END_OF_LLDPDU {
                break;
            }
            let value = match bytes_at(payload, pos, tlv_len) {
                Some(x) => x,
                None => {
                    warn!("LLDP TLV type {tlv_type} overruns the frame");
                    return None;
                }
            };
            match tlv_type {
                // Port ID carries a one-byte subtype before the identifier.
                TLV_PORT_ID => {
                    if let Some(id) = value.get(1..) {
                        port_id = lossy_string(id);
                    }
                }
                TLV_PORT_DESCRIPTION => port_description = lossy_string(value),
                TLV_SYSTEM_NAME => system_name = lossy_string(value),
                TLV_SYSTEM_DESCRIPTION => system_description = lossy_string(value),
                TLV_CHASSIS_ID
                | TLV_TTL
                | TLV_SYSTEM_CAPABILITIES
                | TLV_MANAGEMENT_ADDRESS
                | TLV_ORGANIZATION_SPECIFIC => (),
                other => {
                    warn!("LLDP TLV type {other} is outside the standard set");
                    return None;
                }
            }
            pos += tlv_len;
        }

        Some(Observation::Lldp(LldpObservation {
            ts: frame.ts,
            sender_mac,
            port_id,
            port_description,
            system_name,
            system_description,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mac::MacAddr;
    use std::time::SystemTime;

    fn tlv(tlv_type: u8, value: &[u8]) -> Vec<u8> {
        let header = (u16::from(tlv_type) << 9) | (value.len() as u16 & 0x1FF);
        let mut out = header.to_be_bytes().to_vec();
        out.extend_from_slice(value);
        out
    }

    pub(crate) fn lldp_frame(src_mac: [u8; 6], tlvs: &[Vec<u8>]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e]); // nearest-bridge
        bytes.extend_from_slice(&src_mac);
        bytes.extend_from_slice(&ETHERTYPE_LLDP.to_be_bytes());
        for t in tlvs {
            bytes.extend_from_slice(t);
        }
        bytes.extend_from_slice(&tlv(TLV_END_OF_LLDPDU, &[]));
        bytes
    }

    #[test]
    fn decodes_an_advertisement() {
        let src = [0xaa, 0xbb, 0xcc, 0, 0, 4];
        let tlvs = vec![
            tlv(TLV_CHASSIS_ID, &[4, 0xaa, 0xbb, 0xcc, 0, 0, 4]),
            tlv(TLV_PORT_ID, &[5, b'g', b'i', b'0', b'/', b'1']),
            tlv(TLV_TTL, &[0, 120]),
            tlv(TLV_PORT_DESCRIPTION, b"uplink"),
            tlv(TLV_SYSTEM_NAME, b"sw-core-1"),
            tlv(TLV_SYSTEM_DESCRIPTION, b"48-port switch"),
        ];
        let bytes = lldp_frame(src, &tlvs);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        match LldpDecoder.decode(&frame) {
            Some(Observation::Lldp(obs)) => {
                assert_eq!(obs.sender_mac, MacAddr(src));
                assert_eq!(obs.port_id, "gi0/1");
                assert_eq!(obs.port_description, "uplink");
                assert_eq!(obs.system_name, "sw-core-1");
                assert_eq!(obs.system_description, "48-port switch");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_stream_emits_empty_fields() {
        let bytes = lldp_frame([0xaa, 0xbb, 0xcc, 0, 0, 4], &[]);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        match LldpDecoder.decode(&frame) {
            Some(Observation::Lldp(obs)) => {
                assert_eq!(obs.system_name, "");
                assert_eq!(obs.port_id, "");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn overrunning_tlv_declines() {
        let src = [0xaa, 0xbb, 0xcc, 0, 0, 4];
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e]);
        bytes.extend_from_slice(&src);
        bytes.extend_from_slice(&ETHERTYPE_LLDP.to_be_bytes());
        // Claims 100 bytes of system name but provides 3.
        let header = (u16::from(TLV_SYSTEM_NAME) << 9) | 100;
        bytes.extend_from_slice(&header.to_be_bytes());
        bytes.extend_from_slice(b"abc");
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        assert!(LldpDecoder.decode(&frame).is_none());
    }

    #[test]
    fn reserved_tlv_type_declines() {
        let bytes = lldp_frame([0xaa, 0xbb, 0xcc, 0, 0, 4], &[tlv(9, b"x")]);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        assert!(LldpDecoder.decode(&frame).is_none());
    }
}
