/*! Live capture from a network interface, via libpcap.

This is deliberately thin: open an interface in promiscuous mode and hand
out `(timestamp, bytes)` pairs.  The read timeout matters: it's what lets
the daemon's main loop come up for air between frames to poll its signal
flags on a quiet network.
*/

use crate::error::Result;
use std::time::{Duration, SystemTime};
use tracing::*;

const SNAPLEN: i32 = 65_535;
const READ_TIMEOUT_MS: i32 = 1_000;

pub struct CaptureSource {
    inner: pcap::Capture<pcap::Active>,
}

impl CaptureSource {
    /// Opens `interface` for promiscuous live capture.
    pub fn open(interface: &str) -> Result<CaptureSource> {
        let inner = pcap::Capture::from_device(interface)?
            .promisc(true)
            .snaplen(SNAPLEN)
            .timeout(READ_TIMEOUT_MS)
            .open()?;
        debug!("Opened {interface} for capture");
        Ok(CaptureSource { inner })
    }

    /// The next frame, or `None` if the read timeout elapsed first.
    ///
    /// Any error other than the timeout is unrecoverable and propagates.
    pub fn next_frame(&mut self) -> Result<Option<(SystemTime, &[u8])>> {
        match self.inner.next_packet() {
            Ok(packet) => {
                let secs = packet.header.ts.tv_sec.max(0) as u64;
                let micros = packet.header.ts.tv_usec.max(0) as u64;
                let ts = SystemTime::UNIX_EPOCH
                    + Duration::from_secs(secs)
                    + Duration::from_micros(micros);
                Ok(Some((ts, packet.data)))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
