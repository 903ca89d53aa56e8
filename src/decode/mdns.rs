use crate::decode::util::*;
use crate::decode::Decoder;
use crate::frame::Frame;
use crate::observation::{MdnsObservation, Observation, ZERO_IP};
use tracing::*;

const PORT_MDNS: u16 = 5353;

const TYPE_A: u16 = 1;
const HEADER_LEN: usize = 12;

/// Extracts names from multicast DNS traffic on port 5353.
///
/// Captures the first query name and the first A-type answer (name plus
/// address).  Queries and responses both emit; whichever side is absent
/// stays empty.
pub struct MdnsDecoder;

impl Decoder for MdnsDecoder {
    fn name(&self) -> &'static str {
        "mdns"
    }

    fn decode(&self, frame: &Frame<'_>) -> Option<Observation> {
        let (sport, dport, msg) = frame.udp()?;
        if sport != PORT_MDNS && dport != PORT_MDNS {
            return None;
        }
        let client_mac = frame.src_mac()?;

        let qdcount = be_u16_at(msg, 4)?;
        let ancount = be_u16_at(msg, 6)?;
        let mut pos = HEADER_LEN;

        let mut queried_domain = String::new();
        for i in 0..qdcount {
            let (name, next) = parse_name(msg, pos)?;
            if i == 0 {
                queried_domain = name;
            }
            pos = next + 4; // qtype + qclass
            if pos > msg.len() {
                warn!("mDNS question section overruns the frame");
                return None;
            }
        }

        let mut answered_hostname = String::new();
        let mut answered_ip = ZERO_IP;
        for _ in 0..ancount {
            let (name, next) = parse_name(msg, pos)?;
            let rr_type = be_u16_at(msg, next)?;
            let rdlen = usize::from(be_u16_at(msg, next + 8)?);
            let rdata_at = next + 10;
            if rr_type == TYPE_A && rdlen == 4 {
                answered_hostname = name;
                answered_ip = ipv4_at(msg, rdata_at)?;
                break;
            }
            pos = rdata_at + rdlen;
            if pos > msg.len() {
                warn!("mDNS answer section overruns the frame");
                return None;
            }
        }

        Some(Observation::Mdns(MdnsObservation {
            ts: frame.ts,
            client_mac,
            queried_domain,
            answered_hostname,
            answered_ip,
        }))
    }
}

/// Decodes a DNS name starting at `pos`, following compression pointers.
///
/// Returns the dotted name and the position just past the name *in the
/// uncompressed stream* (i.e. past the first pointer if one was followed).
/// The hop count is capped so a pointer loop can't spin us forever.
fn parse_name(msg: &[u8], mut pos: usize) -> Option<(String, usize)> {
    let mut labels: Vec<String> = Vec::new();
    let mut end = None;
    let mut hops = 0;
    loop {
        let len = usize::from(u8_at(msg, pos)?);
        if len == 0 {
            pos += 1;
            break;
        }
        match len & 0xC0 {
            0xC0 => {
                let lo = usize::from(u8_at(msg, pos + 1)?);
                end.get_or_insert(pos + 2);
                pos = ((len & 0x3F) << 8) | lo;
                hops += 1;
                if hops > 16 {
                    warn!("mDNS name has a compression-pointer loop");
                    return None;
                }
            }
            0x00 => {
                let label = bytes_at(msg, pos + 1, len)?;
                labels.push(String::from_utf8_lossy(label).into_owned());
                pos += 1 + len;
                if labels.len() > 128 {
                    return None;
                }
            }
            // 0x40 and 0x80 are reserved label types
            _ => return None,
        }
    }
    Some((labels.join("."), end.unwrap_or(pos)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mac::MacAddr;
    use etherparse::PacketBuilder;
    use std::time::SystemTime;

    fn encode_name(name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for label in name.split('.') {
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
        out.push(0);
        out
    }

    pub(crate) fn mdns_frame(src_mac: [u8; 6], msg: &[u8]) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2(src_mac, [0x01, 0x00, 0x5e, 0, 0, 0xfb])
            .ipv4([192, 168, 1, 23], [224, 0, 0, 251], 255)
            .udp(PORT_MDNS, PORT_MDNS);
        let mut bytes = Vec::with_capacity(builder.size(msg.len()));
        builder.write(&mut bytes, msg).unwrap();
        bytes
    }

    /// A response whose answer name points back at the question name.
    #[test]
    fn decodes_a_compressed_response() {
        let mut msg = vec![0, 0, 0x84, 0, 0, 1, 0, 1, 0, 0, 0, 0];
        msg.extend_from_slice(&encode_name("printer.local")); // question at offset 12
        msg.extend_from_slice(&[0, 1, 0, 1]); // A, IN
        msg.extend_from_slice(&[0xC0, 12]); // answer name -> offset 12
        msg.extend_from_slice(&[0, 1, 0, 1]); // A, IN
        msg.extend_from_slice(&[0, 0, 0, 120]); // ttl
        msg.extend_from_slice(&[0, 4, 192, 168, 1, 23]); // rdata
        let bytes = mdns_frame([0xaa, 0xbb, 0xcc, 0, 0, 7], &msg);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        match MdnsDecoder.decode(&frame) {
            Some(Observation::Mdns(obs)) => {
                assert_eq!(obs.client_mac, MacAddr([0xaa, 0xbb, 0xcc, 0, 0, 7]));
                assert_eq!(obs.queried_domain, "printer.local");
                assert_eq!(obs.answered_hostname, "printer.local");
                assert_eq!(obs.answered_ip.to_string(), "192.168.1.23");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn query_only_leaves_answer_empty() {
        let mut msg = vec![0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        msg.extend_from_slice(&encode_name("printer.local"));
        msg.extend_from_slice(&[0, 1, 0, 1]);
        let bytes = mdns_frame([0xaa, 0xbb, 0xcc, 0, 0, 7], &msg);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        match MdnsDecoder.decode(&frame) {
            Some(Observation::Mdns(obs)) => {
                assert_eq!(obs.queried_domain, "printer.local");
                assert_eq!(obs.answered_hostname, "");
                assert!(obs.answered_ip.is_unspecified());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn pointer_loop_declines() {
        let mut msg = vec![0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        msg.extend_from_slice(&[0xC0, 12]); // name at 12 points at itself
        msg.extend_from_slice(&[0, 1, 0, 1]);
        let bytes = mdns_frame([0xaa, 0xbb, 0xcc, 0, 0, 7], &msg);
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        assert!(MdnsDecoder.decode(&frame).is_none());
    }

    #[test]
    fn wrong_port_declines() {
        let builder = PacketBuilder::ethernet2([1; 6], [2; 6])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .udp(5354, 5354);
        let mut bytes = Vec::new();
        builder.write(&mut bytes, &[0u8; 12]).unwrap();
        let frame = Frame::new(SystemTime::UNIX_EPOCH, &bytes);
        assert!(MdnsDecoder.decode(&frame).is_none());
    }
}
