use crate::decode::util::*;
use crate::decode::Decoder;
use crate::frame::Frame;
use crate::observation::{DhcpObservation, Observation, ZERO_IP};
use std::net::IpAddr;
use tracing::*;

const PORT_SERVER: u16 = 67;
const PORT_CLIENT: u16 = 68;

/// Offset of the client hardware address in the BOOTP header.
const CHADDR_OFFSET: usize = 28;
/// Offset of the magic cookie (end of the fixed BOOTP header).
const COOKIE_OFFSET: usize = 236;
const MAGIC_COOKIE: u32 = 0x6382_5363;

const OPT_REQUESTED_ADDRESS: u8 = 50;
const OPT_SERVER_IDENTIFIER: u8 = 54;
const OPT_ROUTERS: u8 = 3;
const OPT_DOMAIN_NAME_SERVERS: u8 = 6;

/// Extracts the client's address negotiation from DHCP traffic.
///
/// Four options are read as IPv4 addresses: requested-address,
/// server-identifier, and the first entry each of routers and
/// domain-name-servers.  Anything missing stays zero.
pub struct DhcpDecoder;

impl Decoder for DhcpDecoder {
    fn name(&self) -> &'static str {
        "dhcp"
    }

    fn decode(&self, frame: &Frame<'_>) -> Option<Observation> {
        let (sport, dport, payload) = frame.udp()?;
        if sport != PORT_SERVER && sport != PORT_CLIENT && dport != PORT_SERVER && dport != PORT_CLIENT
        {
            return None;
        }
        frame.src_mac()?; // Ethernet/IPv4/UDP only

        // Fixed BOOTP header.  The client hardware address field is 16 bytes;
        // only its first 6 are meaningful for hlen == 6.
        if u8_at(payload, 2)? != 6 {
            trace!("DHCP frame with a non-Ethernet hardware length; ignoring");
            return None;
        }
        let client_mac = mac_at(payload, CHADDR_OFFSET)?;
        if be_u32_at(payload, COOKIE_OFFSET)? != MAGIC_COOKIE {
            warn!("DHCP frame without the magic cookie");
            return None;
        }

        let mut offered_ip = ZERO_IP;
        let mut server_ip = ZERO_IP;
        let mut gateway_ip = ZERO_IP;
        let mut dns_ip = ZERO_IP;
        walk_options(&payload[COOKIE_OFFSET + 4..], |tag, value| {
            let target: &mut IpAddr = match tag {
                OPT_REQUESTED_ADDRESS => &mut offered_ip,
                OPT_SERVER_IDENTIFIER => &mut server_ip,
                OPT_ROUTERS => &mut gateway_ip,
                OPT_DOMAIN_NAME_SERVERS => &mut dns_ip,
                _ => return,
            };
            // Routers and DNS servers are lists; the first entry wins either
            // way.
            if target.is_unspecified() {
                if let Some(ip) = ipv4_at(value, 0) {
                    *target = ip;
                }
            }
        });

        Some(Observation::Dhcp(DhcpObservation {
            ts: frame.ts,
            client_mac,
            offered_ip,
            // The hostname option is unreliable in the wild; the field stays
            // empty and is only ever refined from other protocols.
            hostname: String::new(),
            server_ip,
            gateway_ip,
            dns_ip,
        }))
    }
}

/// Walks the DHCP option stream, calling `handle` for each option.
///
/// Tag 0 is padding and tag 255 terminates the stream.  A truncated option
/// stops the walk; options already seen keep their effect.
fn walk_options(mut buf: &[u8], mut handle: impl FnMut(u8, &[u8])) {
    loop {
        let (&tag, rest) = match buf.split_first() {
            Some(x) => x,
            None => break,
        };
        buf = rest;
        match tag {
            0 => continue,
            255 => break,
            _ => {
                let (&len, rest) = match buf.split_first() {
                    Some(x) => x,
                    None => {
                        warn!("DHCP option {tag} is missing its length byte");
                        break;
                    }
                };
                let len = usize::from(len);
                if rest.len() < len {
                    warn!("DHCP option {tag} overruns the frame");
                    break;
                }
                handle(tag, &rest[..len]);
                buf = &rest[len..];
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mac::MacAddr;
    use etherparse::PacketBuilder;
    use std::time::SystemTime;

    /// A DHCP frame (client -> server) with the given options appended after
    /// the magic cookie.
    pub(crate) fn dhcp_frame(client_mac: [u8; 6], options: &[u8]) -> Vec<u8> {
        let mut payload = vec![0u8; COOKIE_OFFSET];
        payload[0] = 1; // BOOTREQUEST
        payload[1] = 1; // Ethernet
        payload[2] = 6; // hlen
        payload[CHADDR_OFFSET..CHADDR_OFFSET + 6].copy_from_slice(&client_mac);
        payload.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
        payload.extend_from_slice(options);
        payload.push(255);

        let builder = PacketBuilder::ethernet2(client_mac, [0xff; 6])
            .ipv4([0, 0, 0, 0], [255, 255, 255, 255], 64)
            .udp(PORT_CLIENT, PORT_SERVER);
        let mut bytes = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut bytes, &payload).unwrap();
        bytes
    }

    #[test]
    fn reads_the_four_address_options() {
        let mut options = Vec::new();
        options.extend_from_slice(&[OPT_REQUESTED_ADDRESS, 4, 10, 0, 0, 50]);
        options.extend_from_slice(&[OPT_SERVER_IDENTIFIER, 4, 10, 0, 0, 1]);
        options.extend_from_slice(&[OPT_ROUTERS, 8, 10, 0, 0, 1, 10, 0, 0, 2]);
        options.extend_from_slice(&[OPT_DOMAIN_NAME_SERVERS, 4, 8, 8, 8, 8]);
        let bytes = dhcp_frame([0xaa, 0xbb, 0xcc, 0, 0, 2], &options);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        match DhcpDecoder.decode(&frame) {
            Some(Observation::Dhcp(obs)) => {
                assert_eq!(obs.client_mac, MacAddr([0xaa, 0xbb, 0xcc, 0, 0, 2]));
                assert_eq!(obs.offered_ip.to_string(), "10.0.0.50");
                assert_eq!(obs.server_ip.to_string(), "10.0.0.1");
                assert_eq!(obs.gateway_ip.to_string(), "10.0.0.1"); // first router only
                assert_eq!(obs.dns_ip.to_string(), "8.8.8.8");
                assert_eq!(obs.hostname, "");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_options_stay_zero() {
        let bytes = dhcp_frame([0xaa, 0xbb, 0xcc, 0, 0, 2], &[]);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        match DhcpDecoder.decode(&frame) {
            Some(Observation::Dhcp(obs)) => {
                assert!(obs.offered_ip.is_unspecified());
                assert!(obs.server_ip.is_unspecified());
                assert!(obs.gateway_ip.is_unspecified());
                assert!(obs.dns_ip.is_unspecified());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn truncated_option_is_dropped() {
        // Length byte says 4 but only 2 bytes follow.
        let bytes = dhcp_frame([0xaa, 0xbb, 0xcc, 0, 0, 2], &[OPT_REQUESTED_ADDRESS, 4, 10, 0]);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        match DhcpDecoder.decode(&frame) {
            Some(Observation::Dhcp(obs)) => assert!(obs.offered_ip.is_unspecified()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn other_ports_decline() {
        let builder = PacketBuilder::ethernet2([1; 6], [2; 6])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .udp(12345, 54321);
        let mut bytes = Vec::new();
        builder.write(&mut bytes, &[0u8; 240]).unwrap();
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        assert!(DhcpDecoder.decode(&frame).is_none());
    }
}
