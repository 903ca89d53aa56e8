use crate::decode::Decoder;
use crate::frame::Frame;
use crate::observation::{Observation, SsdpKind, SsdpObservation};
use tracing::*;

const PORT_SSDP: u16 = 1900;

/// Extracts service announcements from SSDP traffic on port 1900.
///
/// The UDP payload is an HTTP-like message: the start line decides the kind
/// (`NOTIFY`, `M-SEARCH`, or a status line for responses; anything else
/// declines), then `Name: Value` headers follow in order until a blank line.
pub struct SsdpDecoder;

impl Decoder for SsdpDecoder {
    fn name(&self) -> &'static str {
        "ssdp"
    }

    fn decode(&self, frame: &Frame<'_>) -> Option<Observation> {
        let (sport, dport, payload) = frame.udp()?;
        if sport != PORT_SSDP && dport != PORT_SSDP {
            return None;
        }
        let sender_mac = frame.src_mac()?;
        let sender_ip = frame.src_ip()?;

        let text = String::from_utf8_lossy(payload);
        let mut lines = text.split('\n').map(|l| l.trim_end_matches('\r'));
        let start_line = lines.next()?;
        let kind = if start_line.starts_with("NOTIFY") {
            SsdpKind::Notify
        } else if start_line.starts_with("M-SEARCH") {
            SsdpKind::MSearch
        } else if start_line.starts_with("HTTP/") {
            SsdpKind::Response
        } else {
            debug!("SSDP datagram with unknown start line; ignoring");
            return None;
        };

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.push((name.trim().to_string(), value.trim().to_string()))
                }
                None => trace!("SSDP line without a colon; skipping"),
            }
        }

        Some(Observation::Ssdp(SsdpObservation {
            ts: frame.ts,
            sender_mac,
            sender_ip,
            kind,
            headers,
        }))
    }
}
