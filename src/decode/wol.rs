use crate::decode::util::*;
use crate::decode::Decoder;
use crate::frame::Frame;
use crate::observation::{Observation, WolObservation};

pub(crate) const ETHERTYPE_WOL: u16 = 0x0842;

/// Extracts the waker and the wakee from Wake-on-LAN magic packets
/// (EtherType 0x0842).
///
/// The payload is six 0xFF sync bytes followed by sixteen repetitions of the
/// target MAC; the first repetition at bytes 6..12 is all we need.
pub struct WolDecoder;

impl Decoder for WolDecoder {
    fn name(&self) -> &'static str {
        "wol"
    }

    fn decode(&self, frame: &Frame<'_>) -> Option<Observation> {
        if frame.ether_type()? != ETHERTYPE_WOL {
            return None;
        }
        let sender_mac = frame.src_mac()?;
        let target_mac = mac_at(frame.ether_payload()?, 6)?;
        Some(Observation::Wol(WolObservation {
            ts: frame.ts,
            sender_mac,
            target_mac,
        }))
    }
}
