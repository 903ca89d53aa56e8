/*! A captured frame, pre-sliced into its standard layers.

The capture source hands us a timestamp and a raw byte buffer.  We run
etherparse over it once, up front; the per-protocol decoders then ask for the
pieces they care about through the accessors here.  A frame that etherparse
can't slice (truncated IP header, bogus UDP length, ...) still keeps its raw
bytes, so decoders that work below those layers are unaffected.
*/

use crate::mac::MacAddr;
use etherparse::{Ethernet2Slice, LinkSlice, NetSlice, SlicedPacket, TransportSlice};
use std::net::IpAddr;
use std::time::SystemTime;
use tracing::*;

pub struct Frame<'a> {
    /// Capture timestamp of the frame.
    pub ts: SystemTime,
    /// The raw bytes, starting at the Ethernet header.
    pub data: &'a [u8],
    sliced: Option<SlicedPacket<'a>>,
}

impl<'a> Frame<'a> {
    pub fn new(ts: SystemTime, data: &'a [u8]) -> Frame<'a> {
        let sliced = match SlicedPacket::from_ethernet(data) {
            Ok(x) => Some(x),
            Err(e) => {
                trace!("Frame didn't slice cleanly: {e}");
                None
            }
        };
        Frame { ts, data, sliced }
    }

    fn ethernet(&self) -> Option<&Ethernet2Slice<'a>> {
        match self.sliced.as_ref()?.link.as_ref()? {
            LinkSlice::Ethernet2(eth) => Some(eth),
            _ => None,
        }
    }

    /// The source MAC of the Ethernet header, if there is one.
    pub fn src_mac(&self) -> Option<MacAddr> {
        Some(MacAddr(self.ethernet()?.source()))
    }

    /// The raw 16-bit EtherType field.  For 802.3 frames this is the payload
    /// length instead (values up to 0x05DC), which is how the LLC-based
    /// decoders recognise their frames.
    pub fn ether_type(&self) -> Option<u16> {
        Some(self.ethernet()?.ether_type().0)
    }

    /// Everything after the Ethernet header.
    pub fn ether_payload(&self) -> Option<&[u8]> {
        Some(self.ethernet()?.payload_slice())
    }

    /// The source address of the IPv4/IPv6 header, if there is one.
    pub fn src_ip(&self) -> Option<IpAddr> {
        match self.sliced.as_ref()?.net.as_ref()? {
            NetSlice::Ipv4(v4) => Some(IpAddr::V4(v4.header().source_addr())),
            NetSlice::Ipv6(v6) => Some(IpAddr::V6(v6.header().source_addr())),
        }
    }

    /// `(source port, destination port, payload)` of the UDP datagram, if
    /// there is one.
    pub fn udp(&self) -> Option<(u16, u16, &[u8])> {
        match self.sliced.as_ref()?.transport.as_ref()? {
            TransportSlice::Udp(udp) => {
                let hdr = udp.to_header();
                Some((hdr.source_port, hdr.destination_port, udp.payload()))
            }
            _ => None,
        }
    }
}
