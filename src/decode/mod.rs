/*! The per-protocol wire-format decoders.

Each decoder looks at a [`Frame`] and either emits exactly one
[`Observation`] or declines with `None`.  Declining covers both "not my
protocol" and "my protocol, but malformed": a decoder never panics on wire
data, and partial fields from a malformed frame are never emitted.

The [`Dispatcher`] owns one of each and offers every frame to all of them in
registration order.  The order doesn't matter for correctness (decoders
decline frames that aren't theirs) but it is fixed so test output is
deterministic.
*/

pub(crate) mod arp;
pub(crate) mod cdp;
pub(crate) mod dhcp;
pub(crate) mod lldp;
pub(crate) mod mdns;
pub(crate) mod ssdp;
pub(crate) mod stp;
mod util;
pub(crate) mod wol;

pub use self::arp::ArpDecoder;
pub use self::cdp::CdpDecoder;
pub use self::dhcp::DhcpDecoder;
pub use self::lldp::LldpDecoder;
pub use self::mdns::MdnsDecoder;
pub use self::ssdp::SsdpDecoder;
pub use self::stp::StpDecoder;
pub use self::wol::WolDecoder;

use crate::frame::Frame;
use crate::observation::Observation;
use tracing::*;

pub trait Decoder {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect the frame; emit one observation or decline with `None`.
    fn decode(&self, frame: &Frame<'_>) -> Option<Observation>;
}

/// An ordered set of decoders.
pub struct Dispatcher {
    decoders: Vec<Box<dyn Decoder + Send>>,
}

impl Dispatcher {
    /// All eight protocol decoders, in a fixed order.
    pub fn standard() -> Dispatcher {
        Dispatcher {
            decoders: vec![
                Box::new(ArpDecoder),
                Box::new(DhcpDecoder),
                Box::new(MdnsDecoder),
                Box::new(LldpDecoder),
                Box::new(CdpDecoder),
                Box::new(StpDecoder),
                Box::new(SsdpDecoder),
                Box::new(WolDecoder),
            ],
        }
    }

    /// Offers the frame to every decoder, forwarding each emitted
    /// observation to `sink`.
    pub fn dispatch(&self, frame: &Frame<'_>, mut sink: impl FnMut(Observation)) {
        for decoder in &self.decoders {
            if let Some(obs) = decoder.decode(frame) {
                trace!("{} decoder emitted an observation", decoder.name());
                sink(obs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Protocol;
    use std::time::SystemTime;

    #[test]
    fn each_frame_matches_exactly_one_decoder() {
        let dispatcher = Dispatcher::standard();
        let frames: Vec<(Protocol, Vec<u8>)> = vec![
            (
                Protocol::Arp,
                arp::tests::arp_frame([0xaa, 0, 0, 0, 0, 1], [10, 0, 0, 5], [10, 0, 0, 1]),
            ),
            (
                Protocol::Dhcp,
                dhcp::tests::dhcp_frame([0xaa, 0, 0, 0, 0, 2], &[]),
            ),
            (
                Protocol::Lldp,
                lldp::tests::lldp_frame([0xaa, 0, 0, 0, 0, 3], &[]),
            ),
            (Protocol::Cdp, cdp::tests::cdp_frame([0xaa, 0, 0, 0, 0, 4], &[])),
            (
                Protocol::Stp,
                stp::tests::bpdu_frame(
                    [0xaa, 0, 0, 0, 0, 5],
                    [0x80, 0, 1, 2, 3, 4, 5, 6],
                    [0x80, 0, 1, 2, 3, 4, 5, 6],
                ),
            ),
            (
                Protocol::Ssdp,
                ssdp::tests::ssdp_frame(
                    [0xaa, 0, 0, 0, 0, 6],
                    [192, 168, 1, 2],
                    b"NOTIFY * HTTP/1.1\r\n\r\n",
                ),
            ),
            (
                Protocol::Wol,
                wol::tests::wol_frame([0xaa, 0, 0, 0, 0, 7], [0xaa, 0, 0, 0, 0, 8]),
            ),
            (
                Protocol::Mdns,
                mdns::tests::mdns_frame([0xaa, 0, 0, 0, 0, 9], &[0u8; 12]),
            ),
        ];
        for (expected, bytes) in frames {
            let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
            let mut emitted = Vec::new();
            dispatcher.dispatch(&frame, |obs| emitted.push(obs));
            assert_eq!(emitted.len(), 1, "{expected:?} frame");
            assert_eq!(emitted[0].kind(), expected);
        }
    }

    #[test]
    fn garbage_matches_nothing() {
        let dispatcher = Dispatcher::standard();
        let bytes = vec![0x5a; 64];
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        let mut emitted = Vec::new();
        dispatcher.dispatch(&frame, |obs| emitted.push(obs));
        assert!(emitted.is_empty());
    }
}
