/*! A host on the segment, as accumulated from its observations. */

use crate::mac::MacAddr;
use crate::observation::{Observation, Protocol, ZERO_IP};
use std::net::IpAddr;
use std::time::SystemTime;

/// Everything we know about one MAC address.
///
/// `ip` and `hostname` are refined monotonically: once set to a non-zero /
/// non-empty value they are never cleared again, though a newer non-zero /
/// non-empty value replaces the older one.  `first_seen <= last_seen` always
/// holds; both use the wall clock at submit time, not the packet timestamp.
#[derive(Debug, Clone)]
pub struct Host {
    mac: MacAddr,
    ip: IpAddr,
    hostname: String,
    first_seen: SystemTime,
    last_seen: SystemTime,
    /// One deduplicated observation set per protocol, indexed by tag.
    observations: [Vec<Observation>; 8],
}

impl Host {
    pub(crate) fn new(mac: MacAddr, now: SystemTime) -> Host {
        Host {
            mac,
            ip: ZERO_IP,
            hostname: String::new(),
            first_seen: now,
            last_seen: now,
            observations: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn first_seen(&self) -> SystemTime {
        self.first_seen
    }

    pub fn last_seen(&self) -> SystemTime {
        self.last_seen
    }

    /// The deduplicated observation set for one protocol.
    pub fn observations(&self, protocol: Protocol) -> &[Observation] {
        &self.observations[protocol.index()]
    }

    pub(crate) fn refine_ip(&mut self, ip: IpAddr) {
        if !ip.is_unspecified() {
            self.ip = ip;
        }
    }

    pub(crate) fn refine_hostname(&mut self, hostname: &str) {
        if !hostname.is_empty() {
            self.hostname = hostname.to_string();
        }
    }

    pub(crate) fn touch(&mut self, now: SystemTime) {
        if now > self.last_seen {
            self.last_seen = now;
        }
    }

    /// Adds the observation to its protocol's set, or refreshes the stored
    /// timestamp if an identical observation is already there.  Returns
    /// whether anything new was inserted.
    pub(crate) fn attach(&mut self, obs: Observation) -> bool {
        let set = &mut self.observations[obs.kind().index()];
        match set.iter_mut().find(|o| o.same_observation(&obs)) {
            Some(existing) => {
                existing.refresh_timestamp(obs.timestamp());
                false
            }
            None => {
                set.push(obs);
                true
            }
        }
    }
}
