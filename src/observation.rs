/*! The things a decoder can see a host say.

Every decoder reduces a frame to exactly one [`Observation`].  The enum is
closed: the aggregator and the inventory renderer both dispatch on the
protocol tag exhaustively, so adding a protocol is a compile-visible change
everywhere it matters.

Two observations of the same variant are *the same sighting* when every field
except the packet timestamp is equal ([`Observation::same_observation`]).
The per-host observation sets are deduplicated under that relation; a repeat
sighting only refreshes the stored timestamp.
*/

use crate::mac::MacAddr;
use std::net::{IpAddr, Ipv4Addr};
use std::time::SystemTime;

/// The zero IP, used wherever a frame didn't carry an address.
pub const ZERO_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Protocol tag of an [`Observation`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Protocol {
    Arp,
    Dhcp,
    Mdns,
    Lldp,
    Cdp,
    Stp,
    Ssdp,
    Wol,
}

impl Protocol {
    pub const ALL: [Protocol; 8] = [
        Protocol::Arp,
        Protocol::Dhcp,
        Protocol::Mdns,
        Protocol::Lldp,
        Protocol::Cdp,
        Protocol::Stp,
        Protocol::Ssdp,
        Protocol::Wol,
    ];

    /// The uppercase tag used as the `PROTOCOLS` key in the inventory.
    pub fn tag(self) -> &'static str {
        match self {
            Protocol::Arp => "ARP",
            Protocol::Dhcp => "DHCP",
            Protocol::Mdns => "MDNS",
            Protocol::Lldp => "LLDP",
            Protocol::Cdp => "CDP",
            Protocol::Stp => "STP",
            Protocol::Ssdp => "SSDP",
            Protocol::Wol => "WOL",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ArpObservation {
    pub ts: SystemTime,
    pub sender_mac: MacAddr,
    pub sender_ip: IpAddr,
    pub target_ip: IpAddr,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DhcpObservation {
    pub ts: SystemTime,
    pub client_mac: MacAddr,
    /// The REQUESTED-ADDRESS option (50), or zero.
    pub offered_ip: IpAddr,
    pub hostname: String,
    /// The SERVER-IDENTIFIER option (54), or zero.
    pub server_ip: IpAddr,
    /// First entry of the ROUTERS option (3), or zero.
    pub gateway_ip: IpAddr,
    /// First entry of the DOMAIN-NAME-SERVERS option (6), or zero.
    pub dns_ip: IpAddr,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MdnsObservation {
    pub ts: SystemTime,
    pub client_mac: MacAddr,
    pub queried_domain: String,
    pub answered_hostname: String,
    pub answered_ip: IpAddr,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LldpObservation {
    pub ts: SystemTime,
    pub sender_mac: MacAddr,
    pub port_id: String,
    pub port_description: String,
    pub system_name: String,
    pub system_description: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CdpObservation {
    pub ts: SystemTime,
    pub sender_mac: MacAddr,
    /// First address of the address TLV, or zero.
    pub sender_ip: IpAddr,
    pub device_id: String,
    pub addresses: Vec<IpAddr>,
    pub port_id: String,
    pub capabilities: u32,
    pub software_version: String,
    pub platform: String,
    pub vtp_domain: String,
    pub native_vlan: u16,
    pub duplex: u8,
    pub trust_bitmap: u8,
    pub untrusted_port_cos: u8,
    pub mgmt_addresses: Vec<IpAddr>,
}

/// A root or bridge identifier from a BPDU, decoded into host-order fields.
///
/// On the wire this is a 16-bit big-endian word packing a 4-bit priority and
/// a 12-bit system-id extension, followed by the 6-byte system id.  The
/// priority keeps its 802.1D value (a multiple of 4096).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BridgeId {
    pub priority: u16,
    pub system_id_ext: u16,
    pub system_id: MacAddr,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StpObservation {
    pub ts: SystemTime,
    pub sender_mac: MacAddr,
    pub root: BridgeId,
    pub bridge: BridgeId,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SsdpKind {
    Notify,
    MSearch,
    Response,
}

impl SsdpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SsdpKind::Notify => "NOTIFY",
            SsdpKind::MSearch => "M-SEARCH",
            SsdpKind::Response => "RESPONSE",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SsdpObservation {
    pub ts: SystemTime,
    pub sender_mac: MacAddr,
    pub sender_ip: IpAddr,
    pub kind: SsdpKind,
    /// Header lines in received order.
    pub headers: Vec<(String, String)>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WolObservation {
    pub ts: SystemTime,
    pub sender_mac: MacAddr,
    pub target_mac: MacAddr,
}

/// A single protocol sighting, as produced by one of the decoders.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Observation {
    Arp(ArpObservation),
    Dhcp(DhcpObservation),
    Mdns(MdnsObservation),
    Lldp(LldpObservation),
    Cdp(CdpObservation),
    Stp(StpObservation),
    Ssdp(SsdpObservation),
    Wol(WolObservation),
}

impl Observation {
    pub fn kind(&self) -> Protocol {
        match self {
            Observation::Arp(_) => Protocol::Arp,
            Observation::Dhcp(_) => Protocol::Dhcp,
            Observation::Mdns(_) => Protocol::Mdns,
            Observation::Lldp(_) => Protocol::Lldp,
            Observation::Cdp(_) => Protocol::Cdp,
            Observation::Stp(_) => Protocol::Stp,
            Observation::Ssdp(_) => Protocol::Ssdp,
            Observation::Wol(_) => Protocol::Wol,
        }
    }

    /// The packet timestamp of the frame that produced this observation.
    pub fn timestamp(&self) -> SystemTime {
        match self {
            Observation::Arp(x) => x.ts,
            Observation::Dhcp(x) => x.ts,
            Observation::Mdns(x) => x.ts,
            Observation::Lldp(x) => x.ts,
            Observation::Cdp(x) => x.ts,
            Observation::Stp(x) => x.ts,
            Observation::Ssdp(x) => x.ts,
            Observation::Wol(x) => x.ts,
        }
    }

    pub(crate) fn refresh_timestamp(&mut self, ts: SystemTime) {
        match self {
            Observation::Arp(x) => x.ts = ts,
            Observation::Dhcp(x) => x.ts = ts,
            Observation::Mdns(x) => x.ts = ts,
            Observation::Lldp(x) => x.ts = ts,
            Observation::Cdp(x) => x.ts = ts,
            Observation::Stp(x) => x.ts = ts,
            Observation::Ssdp(x) => x.ts = ts,
            Observation::Wol(x) => x.ts = ts,
        }
    }

    /// The MAC a host is keyed on when this observation is submitted.
    ///
    /// DHCP uses the client hardware address; everything else uses the
    /// sender.  An STP frame whose sender couldn't be extracted keys to
    /// [`MacAddr::ZERO`].
    pub fn host_key(&self) -> MacAddr {
        match self {
            Observation::Arp(x) => x.sender_mac,
            Observation::Dhcp(x) => x.client_mac,
            Observation::Mdns(x) => x.client_mac,
            Observation::Lldp(x) => x.sender_mac,
            Observation::Cdp(x) => x.sender_mac,
            Observation::Stp(x) => x.sender_mac,
            Observation::Ssdp(x) => x.sender_mac,
            Observation::Wol(x) => x.sender_mac,
        }
    }

    /// The IP this observation can contribute to its host, or zero.
    pub fn carried_ip(&self) -> IpAddr {
        match self {
            Observation::Arp(x) => x.sender_ip,
            Observation::Dhcp(x) => x.offered_ip,
            Observation::Mdns(x) => x.answered_ip,
            Observation::Cdp(x) => x.sender_ip,
            Observation::Ssdp(x) => x.sender_ip,
            Observation::Lldp(_) | Observation::Stp(_) | Observation::Wol(_) => ZERO_IP,
        }
    }

    /// The hostname this observation can contribute to its host, or `""`.
    pub fn carried_hostname(&self) -> &str {
        match self {
            Observation::Dhcp(x) => &x.hostname,
            Observation::Lldp(x) => &x.system_name,
            Observation::Mdns(x) => &x.answered_hostname,
            _ => "",
        }
    }

    /// Structural identity, ignoring the packet timestamp.
    ///
    /// SSDP headers compare as a multiset; CDP address lists compare
    /// position-wise.  Observations of different variants are never the same.
    pub fn same_observation(&self, other: &Observation) -> bool {
        use Observation::*;
        match (self, other) {
            (Arp(a), Arp(b)) => {
                a.sender_mac == b.sender_mac
                    && a.sender_ip == b.sender_ip
                    && a.target_ip == b.target_ip
            }
            (Dhcp(a), Dhcp(b)) => {
                a.client_mac == b.client_mac
                    && a.offered_ip == b.offered_ip
                    && a.hostname == b.hostname
                    && a.server_ip == b.server_ip
                    && a.gateway_ip == b.gateway_ip
                    && a.dns_ip == b.dns_ip
            }
            (Mdns(a), Mdns(b)) => {
                a.client_mac == b.client_mac
                    && a.queried_domain == b.queried_domain
                    && a.answered_hostname == b.answered_hostname
                    && a.answered_ip == b.answered_ip
            }
            (Lldp(a), Lldp(b)) => {
                a.sender_mac == b.sender_mac
                    && a.port_id == b.port_id
                    && a.port_description == b.port_description
                    && a.system_name == b.system_name
                    && a.system_description == b.system_description
            }
            (Cdp(a), Cdp(b)) => {
                a.sender_mac == b.sender_mac
                    && a.sender_ip == b.sender_ip
                    && a.device_id == b.device_id
                    && a.addresses == b.addresses
                    && a.port_id == b.port_id
                    && a.capabilities == b.capabilities
                    && a.software_version == b.software_version
                    && a.platform == b.platform
                    && a.vtp_domain == b.vtp_domain
                    && a.native_vlan == b.native_vlan
                    && a.duplex == b.duplex
                    && a.trust_bitmap == b.trust_bitmap
                    && a.untrusted_port_cos == b.untrusted_port_cos
                    && a.mgmt_addresses == b.mgmt_addresses
            }
            (Stp(a), Stp(b)) => {
                a.sender_mac == b.sender_mac && a.root == b.root && a.bridge == b.bridge
            }
            (Ssdp(a), Ssdp(b)) => {
                a.sender_mac == b.sender_mac
                    && a.sender_ip == b.sender_ip
                    && a.kind == b.kind
                    && headers_multiset_eq(&a.headers, &b.headers)
            }
            (Wol(a), Wol(b)) => a.sender_mac == b.sender_mac && a.target_mac == b.target_mac,
            _ => false,
        }
    }
}

fn headers_multiset_eq(a: &[(String, String)], b: &[(String, String)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&(String, String)> = a.iter().collect();
    let mut b: Vec<&(String, String)> = b.iter().collect();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn arp_at(ts: SystemTime) -> Observation {
        Observation::Arp(ArpObservation {
            ts,
            sender_mac: MacAddr([0xaa, 0xbb, 0xcc, 0, 0, 1]),
            sender_ip: "10.0.0.5".parse().unwrap(),
            target_ip: "10.0.0.1".parse().unwrap(),
        })
    }

    #[test]
    fn identity_ignores_timestamp() {
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + Duration::from_secs(60);
        assert!(arp_at(t0).same_observation(&arp_at(t1)));
        assert_ne!(arp_at(t0), arp_at(t1)); // but full equality doesn't
    }

    #[test]
    fn identity_is_per_variant() {
        let ts = SystemTime::UNIX_EPOCH;
        let wol = Observation::Wol(WolObservation {
            ts,
            sender_mac: MacAddr([0xaa, 0xbb, 0xcc, 0, 0, 1]),
            target_mac: MacAddr([0xaa, 0xbb, 0xcc, 0, 0, 2]),
        });
        assert!(!arp_at(ts).same_observation(&wol));
    }

    #[test]
    fn ssdp_headers_compare_as_multiset() {
        let ts = SystemTime::UNIX_EPOCH;
        let mk = |headers: Vec<(&str, &str)>| {
            Observation::Ssdp(SsdpObservation {
                ts,
                sender_mac: MacAddr([2; 6]),
                sender_ip: "192.168.1.10".parse().unwrap(),
                kind: SsdpKind::Notify,
                headers: headers
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
        };
        let a = mk(vec![("HOST", "239.255.255.250:1900"), ("NTS", "ssdp:alive")]);
        let b = mk(vec![("NTS", "ssdp:alive"), ("HOST", "239.255.255.250:1900")]);
        let c = mk(vec![("NTS", "ssdp:alive"), ("NTS", "ssdp:alive")]);
        assert!(a.same_observation(&b));
        assert!(!a.same_observation(&c));
    }

    #[test]
    fn cdp_addresses_compare_position_wise() {
        let ts = SystemTime::UNIX_EPOCH;
        let mk = |addrs: Vec<&str>| {
            Observation::Cdp(CdpObservation {
                ts,
                sender_mac: MacAddr([4; 6]),
                sender_ip: ZERO_IP,
                device_id: "sw1".into(),
                addresses: addrs.into_iter().map(|a| a.parse().unwrap()).collect(),
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
            })
        };
        let a = mk(vec!["10.0.0.1", "10.0.0.2"]);
        let b = mk(vec!["10.0.0.2", "10.0.0.1"]);
        assert!(!a.same_observation(&b));
        assert!(a.same_observation(&a.clone()));
    }
}
