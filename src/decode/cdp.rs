use crate::decode::util::*;
use crate::decode::Decoder;
use crate::frame::Frame;
use crate::observation::{CdpObservation, Observation, ZERO_IP};
use bytes::Buf;
use std::net::{IpAddr, Ipv4Addr};
use tracing::*;

/// 802.3 length field upper bound; anything above is an EtherType.
const MAX_8023_LEN: u16 = 0x05DC;

/// LLC/SNAP prefix: DSAP 0xAA, SSAP 0xAA, control 0x03.
const SNAP_PREFIX: [u8; 3] = [0xAA, 0xAA, 0x03];
/// Cisco organization code in the SNAP header.
const CISCO_OUI: [u8; 3] = [0x00, 0x00, 0x0C];
const CDP_PROTOCOL_ID: u16 = 0x2000;

const TLV_DEVICE_ID: u16 = 0x0001;
const TLV_ADDRESS: u16 = 0x0002;
const TLV_PORT_ID: u16 = 0x0003;
const TLV_CAPABILITIES: u16 = 0x0004;
const TLV_SOFTWARE_VERSION: u16 = 0x0005;
const TLV_PLATFORM: u16 = 0x0006;
const TLV_VTP_DOMAIN: u16 = 0x0009;
const TLV_NATIVE_VLAN: u16 = 0x000A;
const TLV_DUPLEX: u16 = 0x000B;
const TLV_SYSTEM_NAME: u16 = 0x000D;
const TLV_SYSTEM_DESCRIPTION: u16 = 0x000E;
const TLV_POWER_REQUEST: u16 = 0x000F;
const TLV_POWER_CONSUMPTION: u16 = 0x0010;
const TLV_TRUST_BITMAP: u16 = 0x0012;
const TLV_UNTRUSTED_PORT_COS: u16 = 0x0013;
const TLV_MGMT_ADDRESS: u16 = 0x0016;

/// NLPID protocol value for IPv4 in CDP address records.
const NLPID_IP: u8 = 0xCC;

/// Extracts neighbour identity from Cisco Discovery Protocol frames
/// (802.3 + LLC/SNAP, Cisco org code, protocol id 0x2000).
///
/// The TLV length includes the 4-byte TLV header, so any length below 4 is
/// malformed and declines the frame, as does a TLV overrunning the buffer.
/// Address TLVs carry variable-length per-address records; only IPv4
/// addresses (NLPID 0xCC) are kept.
pub struct CdpDecoder;

impl Decoder for CdpDecoder {
    fn name(&self) -> &'static str {
        "cdp"
    }

    fn decode(&self, frame: &Frame<'_>) -> Option<Observation> {
        if frame.ether_type()? > MAX_8023_LEN {
            return None;
        }
        let sender_mac = frame.src_mac()?;
        let payload = frame.ether_payload()?;
        if bytes_at(payload, 0, 3)? != SNAP_PREFIX
            || bytes_at(payload, 3, 3)? != CISCO_OUI
            || be_u16_at(payload, 6)? != CDP_PROTOCOL_ID
        {
            return None;
        }

        // CDP header: version (1), TTL (1), checksum (2), then TLVs.
        let body = &payload[8..];
        let version = u8_at(body, 0)?;
        trace!("CDP version {version}");
        bytes_at(body, 0, 4)?;

        let mut obs = CdpObservation {
            ts: frame.ts,
            sender_mac,
            sender_ip: ZERO_IP,
            device_id: String::new(),
            addresses: Vec::new(),
            port_id: String::new(),
            capabilities: 0,
            software_version: String::new(),
            platform: String::new(),
            vtp_domain: String::new(),
            native_vlan: 0,
            duplex: 0,
            trust_bitmap: 0,
            untrusted_port_cos: 0,
            mgmt_addresses: Vec::new(),
        };

        let mut pos = 4;
        while pos < body.len() {
            let (tlv_type, tlv_len) = match (be_u16_at(body, pos), be_u16_at(body, pos + 2)) {
                (Some(t), Some(l)) => (t, usize::from(l)),
                _ => {
                    warn!("CDP TLV header overruns the frame");
                    return None;
                }
            };
            if tlv_len < 4 || pos + tlv_len > body.len() {
                warn!("CDP TLV type {tlv_type:#06x} has invalid length {tlv_len}");
                return None;
            }
            let value = &body[pos + 4..pos + tlv_len];
            match tlv_type {
                TLV_DEVICE_ID => obs.device_id = lossy_string(value),
                TLV_PORT_ID => obs.port_id = lossy_string(value),
                TLV_ADDRESS => obs.addresses = parse_addresses(value)?,
                TLV_MGMT_ADDRESS => obs.mgmt_addresses = parse_addresses(value)?,
                TLV_CAPABILITIES => {
                    if value.len() == 4 {
                        obs.capabilities = be_u32_at(value, 0)?;
                    }
                }
                TLV_SOFTWARE_VERSION => obs.software_version = lossy_string(value),
                TLV_PLATFORM => obs.platform = lossy_string(value),
                TLV_VTP_DOMAIN => obs.vtp_domain = lossy_string(value),
                TLV_NATIVE_VLAN => {
                    if value.len() == 2 {
                        obs.native_vlan = be_u16_at(value, 0)?;
                    }
                }
                TLV_DUPLEX => {
                    if value.len() == 1 {
                        obs.duplex = value[0];
                    }
                }
                TLV_TRUST_BITMAP => {
                    if value.len() == 1 {
                        obs.trust_bitmap = value[0];
                    }
                }
                TLV_UNTRUSTED_PORT_COS => {
                    if value.len() == 1 {
                        obs.untrusted_port_cos = value[0];
                    }
                }
                TLV_SYSTEM_NAME | TLV_SYSTEM_DESCRIPTION | TLV_POWER_REQUEST
                | TLV_POWER_CONSUMPTION => (),
                other => trace!("Skipping CDP TLV type {other:#06x}"),
            }
            pos += tlv_len;
        }

        obs.sender_ip = obs.addresses.first().copied().unwrap_or(ZERO_IP);
        Some(Observation::Cdp(obs))
    }
}

/// Parses a CDP address TLV body: a 32-bit record count, then per-address
/// records of `{protocol type, protocol length, protocol, address length,
/// address}`.  Records are variable length, so each header is read rather
/// than assuming a stride.  Returns `None` when a record overruns the value.
fn parse_addresses(mut buf: &[u8]) -> Option<Vec<IpAddr>> {
    if buf.remaining() < 4 {
        return None;
    }
    let count = buf.get_u32();
    let mut addresses = Vec::new();
    for _ in 0..count {
        if buf.remaining() < 2 {
            return None;
        }
        let _proto_type = buf.get_u8();
        let proto_len = usize::from(buf.get_u8());
        if buf.remaining() < proto_len {
            return None;
        }
        let is_ip = proto_len == 1 && buf.chunk()[0] == NLPID_IP;
        buf.advance(proto_len);
        if buf.remaining() < 2 {
            return None;
        }
        let addr_len = usize::from(buf.get_u16());
        if buf.remaining() < addr_len {
            return None;
        }
        if is_ip && addr_len == 4 {
            let a = buf.chunk();
            addresses.push(IpAddr::V4(Ipv4Addr::new(a[0], a[1], a[2], a[3])));
        }
        buf.advance(addr_len);
    }
    Some(addresses)
}
