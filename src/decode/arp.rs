use crate::decode::util::*;
use crate::decode::Decoder;
use crate::frame::Frame;
use crate::observation::{ArpObservation, Observation};
use tracing::*;

pub(crate) const ETHERTYPE_ARP: u16 = 0x0806;

/// Extracts the sender mapping from ARP requests and replies.
///
/// Only Ethernet/IPv4 ARP is accepted (hardware type 1, protocol 0x0800,
/// address sizes 6/4).  A zero sender MAC is announced by some probing stacks
/// and must not create a host, so those frames decline.
pub struct ArpDecoder;

impl Decoder for ArpDecoder {
    fn name(&self) -> &'static str {
        "arp"
    }

    fn decode(&self, frame: &Frame<'_>) -> Option<Observation> {
        if frame.ether_type()? != ETHERTYPE_ARP {
            return None;
        }
        let payload = frame.ether_payload()?;

        // htype (2), ptype (2), hlen (1), plen (1), oper (2), then the
        // sender/target address pairs.
        if be_u16_at(payload, 0)? != 1
            || be_u16_at(payload, 2)? != 0x0800
            || u8_at(payload, 4)? != 6
            || u8_at(payload, 5)? != 4
        {
            trace!("ARP frame isn't Ethernet/IPv4; ignoring");
            return None;
        }
        let sender_mac = mac_at(payload, 8)?;
        let sender_ip = ipv4_at(payload, 14)?;
        let target_ip = ipv4_at(payload, 24)?;

        if sender_mac.is_zero() {
            debug!("ARP frame with a zero sender MAC; ignoring");
            return None;
        }
        Some(Observation::Arp(ArpObservation {
            ts: frame.ts,
            sender_mac,
            sender_ip,
            target_ip,
        }))
    }
}
