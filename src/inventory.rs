/*! The rendered, serializable mirror of the host map.

The view is derived state: after every submit the aggregator re-renders the
touched host and upserts it here, keyed by MAC, so the view never diverges
from the host map and a snapshot is just a serialization of what's already
rendered.  Records keep host insertion order.

Rendering is deterministic: each protocol's array is sorted by observation
timestamp, ties broken by comparing the record fields in declaration order.
*/

use crate::host::Host;
use crate::mac::MacAddr;
use crate::observation::{Observation, Protocol, SsdpObservation, StpObservation};
use crate::vendor::VendorDb;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::SystemTime;

/// One host, rendered for the inventory document.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct HostRecord {
    #[serde(rename = "MAC")]
    pub mac: String,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "HOSTNAME")]
    pub hostname: String,
    #[serde(rename = "FIRST SEEN")]
    pub first_seen: String,
    #[serde(rename = "LAST SEEN")]
    pub last_seen: String,
    #[serde(rename = "PROTOCOLS")]
    pub protocols: ProtocolRecords,
}

/// Per-protocol observation arrays.  Protocols with nothing to show are
/// omitted from the JSON entirely.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ProtocolRecords {
    #[serde(rename = "ARP", default, skip_serializing_if = "Vec::is_empty")]
    pub arp: Vec<ArpRecord>,
    #[serde(rename = "DHCP", default, skip_serializing_if = "Vec::is_empty")]
    pub dhcp: Vec<DhcpRecord>,
    #[serde(rename = "MDNS", default, skip_serializing_if = "Vec::is_empty")]
    pub mdns: Vec<MdnsRecord>,
    #[serde(rename = "LLDP", default, skip_serializing_if = "Vec::is_empty")]
    pub lldp: Vec<LldpRecord>,
    #[serde(rename = "CDP", default, skip_serializing_if = "Vec::is_empty")]
    pub cdp: Vec<CdpRecord>,
    #[serde(rename = "STP", default, skip_serializing_if = "Vec::is_empty")]
    pub stp: Vec<StpRecord>,
    #[serde(rename = "SSDP", default, skip_serializing_if = "Vec::is_empty")]
    pub ssdp: Vec<SsdpRecord>,
    #[serde(rename = "WOL", default, skip_serializing_if = "Vec::is_empty")]
    pub wol: Vec<WolRecord>,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct ArpRecord {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "SENDER MAC")]
    pub sender_mac: String,
    #[serde(rename = "SENDER IP")]
    pub sender_ip: String,
    #[serde(rename = "TARGET IP")]
    pub target_ip: String,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct DhcpRecord {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "CLIENT MAC")]
    pub client_mac: String,
    #[serde(rename = "OFFERED IP")]
    pub offered_ip: String,
    #[serde(rename = "HOSTNAME")]
    pub hostname: String,
    #[serde(rename = "DHCP SERVER IP")]
    pub server_ip: String,
    #[serde(rename = "GATEWAY IP")]
    pub gateway_ip: String,
    #[serde(rename = "DNS SERVER IP")]
    pub dns_ip: String,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct MdnsRecord {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "CLIENT MAC")]
    pub client_mac: String,
    #[serde(rename = "QUERIED DOMAIN")]
    pub queried_domain: String,
    #[serde(rename = "ANSWERED HOSTNAME")]
    pub answered_hostname: String,
    #[serde(rename = "ANSWERED IP")]
    pub answered_ip: String,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct LldpRecord {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "SENDER MAC")]
    pub sender_mac: String,
    #[serde(rename = "PORT ID")]
    pub port_id: String,
    #[serde(rename = "PORT DESCRIPTION")]
    pub port_description: String,
    #[serde(rename = "SYSTEM NAME")]
    pub system_name: String,
    #[serde(rename = "SYSTEM DESCRIPTION")]
    pub system_description: String,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct CdpRecord {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "SENDER MAC")]
    pub sender_mac: String,
    #[serde(rename = "SENDER IP")]
    pub sender_ip: String,
    #[serde(rename = "DEVICE ID")]
    pub device_id: String,
    #[serde(rename = "ADDRESSES")]
    pub addresses: Vec<String>,
    #[serde(rename = "PORT ID")]
    pub port_id: String,
    #[serde(rename = "CAPABILITIES")]
    pub capabilities: u32,
    #[serde(rename = "SOFTWARE VERSION")]
    pub software_version: String,
    #[serde(rename = "PLATFORM")]
    pub platform: String,
    #[serde(rename = "VTP DOMAIN")]
    pub vtp_domain: String,
    #[serde(rename = "NATIVE VLAN")]
    pub native_vlan: u16,
    #[serde(rename = "DUPLEX")]
    pub duplex: u8,
    #[serde(rename = "TRUST BITMAP")]
    pub trust_bitmap: u8,
    #[serde(rename = "UNTRUSTED PORT COS")]
    pub untrusted_port_cos: u8,
    #[serde(rename = "MANAGEMENT ADDRESSES")]
    pub mgmt_addresses: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct StpRecord {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "SENDER MAC")]
    pub sender_mac: String,
    #[serde(rename = "ROOT IDENTIFIER")]
    pub root: StpIdentifierRecord,
    #[serde(rename = "BRIDGE IDENTIFIER")]
    pub bridge: StpIdentifierRecord,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct StpIdentifierRecord {
    #[serde(rename = "PRIORITY")]
    pub priority: u16,
    #[serde(rename = "SYSTEM ID EXTENSION")]
    pub system_id_ext: u16,
    #[serde(rename = "SYSTEM ID")]
    pub system_id: String,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct SsdpRecord {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "SENDER MAC")]
    pub sender_mac: String,
    #[serde(rename = "SENDER IP")]
    pub sender_ip: String,
    #[serde(rename = "KIND")]
    pub kind: String,
    #[serde(rename = "HEADERS")]
    pub headers: Vec<SsdpHeaderRecord>,
}

/// A single `Name: Value` header, kept as an array element so received
/// order survives serialization.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct SsdpHeaderRecord {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "VALUE")]
    pub value: String,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct WolRecord {
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "SENDER MAC")]
    pub sender_mac: String,
    #[serde(rename = "TARGET MAC")]
    pub target_mac: String,
}

/// `DD-MM-YYYY HH:MM:SS` in local time, matching the report format.
pub(crate) fn fmt_timestamp(ts: SystemTime) -> String {
    let dt: chrono::DateTime<chrono::Local> = ts.into();
    dt.format("%d-%m-%Y %H:%M:%S").to_string()
}

/// `AA:BB:CC:DD:EE:FF (Vendor Name)`, with `Unknown Vendor` for prefixes the
/// table doesn't know.
pub(crate) fn fmt_mac_with_vendor(mac: MacAddr, vendors: &VendorDb) -> String {
    format!("{} ({})", mac, vendors.name(&mac).unwrap_or("Unknown Vendor"))
}

fn sorted_records<R: Ord>(mut entries: Vec<(SystemTime, R)>) -> Vec<R> {
    entries.sort();
    entries.into_iter().map(|(_, record)| record).collect()
}

fn ssdp_record(x: &SsdpObservation) -> SsdpRecord {
    SsdpRecord {
        timestamp: fmt_timestamp(x.ts),
        sender_mac: x.sender_mac.to_string(),
        sender_ip: x.sender_ip.to_string(),
        kind: x.kind.as_str().to_string(),
        headers: x
            .headers
            .iter()
            .map(|(name, value)| SsdpHeaderRecord {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
    }
}

fn stp_record(x: &StpObservation) -> StpRecord {
    let ident = |id: &crate::observation::BridgeId| StpIdentifierRecord {
        priority: id.priority,
        system_id_ext: id.system_id_ext,
        system_id: id.system_id.to_string(),
    };
    StpRecord {
        timestamp: fmt_timestamp(x.ts),
        sender_mac: x.sender_mac.to_string(),
        root: ident(&x.root),
        bridge: ident(&x.bridge),
    }
}

/// Renders one host into its inventory record.
pub(crate) fn render_host(host: &Host, vendors: &VendorDb) -> HostRecord {
    let mut arp = Vec::new();
    let mut dhcp = Vec::new();
    let mut mdns = Vec::new();
    let mut lldp = Vec::new();
    let mut cdp = Vec::new();
    let mut stp = Vec::new();
    let mut ssdp = Vec::new();
    let mut wol = Vec::new();
    for protocol in Protocol::ALL {
        for obs in host.observations(protocol) {
            match obs {
                Observation::Arp(x) => arp.push((
                    x.ts,
                    ArpRecord {
                        timestamp: fmt_timestamp(x.ts),
                        sender_mac: x.sender_mac.to_string(),
                        sender_ip: x.sender_ip.to_string(),
                        target_ip: x.target_ip.to_string(),
                    },
                )),
                Observation::Dhcp(x) => dhcp.push((
                    x.ts,
                    DhcpRecord {
                        timestamp: fmt_timestamp(x.ts),
                        client_mac: x.client_mac.to_string(),
                        offered_ip: x.offered_ip.to_string(),
                        hostname: x.hostname.clone(),
                        server_ip: x.server_ip.to_string(),
                        gateway_ip: x.gateway_ip.to_string(),
                        dns_ip: x.dns_ip.to_string(),
                    },
                )),
                Observation::Mdns(x) => mdns.push((
                    x.ts,
                    MdnsRecord {
                        timestamp: fmt_timestamp(x.ts),
                        client_mac: x.client_mac.to_string(),
                        queried_domain: x.queried_domain.clone(),
                        answered_hostname: x.answered_hostname.clone(),
                        answered_ip: x.answered_ip.to_string(),
                    },
                )),
                Observation::Lldp(x) => lldp.push((
                    x.ts,
                    LldpRecord {
                        timestamp: fmt_timestamp(x.ts),
                        sender_mac: x.sender_mac.to_string(),
                        port_id: x.port_id.clone(),
                        port_description: x.port_description.clone(),
                        system_name: x.system_name.clone(),
                        system_description: x.system_description.clone(),
                    },
                )),
                Observation::Cdp(x) => cdp.push((
                    x.ts,
                    CdpRecord {
                        timestamp: fmt_timestamp(x.ts),
                        sender_mac: x.sender_mac.to_string(),
                        sender_ip: x.sender_ip.to_string(),
                        device_id: x.device_id.clone(),
                        addresses: x.addresses.iter().map(|a| a.to_string()).collect(),
                        port_id: x.port_id.clone(),
                        capabilities: x.capabilities,
                        software_version: x.software_version.clone(),
                        platform: x.platform.clone(),
                        vtp_domain: x.vtp_domain.clone(),
                        native_vlan: x.native_vlan,
                        duplex: x.duplex,
                        trust_bitmap: x.trust_bitmap,
                        untrusted_port_cos: x.untrusted_port_cos,
                        mgmt_addresses: x.mgmt_addresses.iter().map(|a| a.to_string()).collect(),
                    },
                )),
                Observation::Stp(x) => stp.push((x.ts, stp_record(x))),
                Observation::Ssdp(x) => ssdp.push((x.ts, ssdp_record(x))),
                Observation::Wol(x) => wol.push((
                    x.ts,
                    WolRecord {
                        timestamp: fmt_timestamp(x.ts),
                        sender_mac: x.sender_mac.to_string(),
                        target_mac: x.target_mac.to_string(),
                    },
                )),
            }
        }
    }
    HostRecord {
        mac: fmt_mac_with_vendor(host.mac(), vendors),
        ip: host.ip().to_string(),
        hostname: host.hostname().to_string(),
        first_seen: fmt_timestamp(host.first_seen()),
        last_seen: fmt_timestamp(host.last_seen()),
        protocols: ProtocolRecords {
            arp: sorted_records(arp),
            dhcp: sorted_records(dhcp),
            mdns: sorted_records(mdns),
            lldp: sorted_records(lldp),
            cdp: sorted_records(cdp),
            stp: sorted_records(stp),
            ssdp: sorted_records(ssdp),
            wol: sorted_records(wol),
        },
    }
}

/// The ordered record list, with an index for O(1) upserts by MAC.
#[derive(Debug, Default)]
pub struct InventoryView {
    index: HashMap<MacAddr, usize>,
    records: Vec<HostRecord>,
}

impl InventoryView {
    pub(crate) fn upsert(&mut self, mac: MacAddr, record: HostRecord) {
        match self.index.get(&mac) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(mac, self.records.len());
                self.records.push(record);
            }
        }
    }

    /// The rendered records, in host insertion order.
    pub fn records(&self) -> &[HostRecord] {
        &self.records
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }

    /// Writes the snapshot document to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), crate::Error> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, &self.records)?;
        Ok(())
    }
}
