/*! The host aggregator: fuses observations into the keyed host collection. */

use crate::host::Host;
use crate::inventory::{render_host, InventoryView};
use crate::mac::MacAddr;
use crate::observation::Observation;
use crate::vendor::VendorDb;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::SystemTime;
use tracing::*;

/// The keyed host collection plus its rendered inventory view.
///
/// All submissions funnel through [`HostRegistry::submit`]: pick the identity
/// MAC, update-or-insert the host, attach the observation to the host's
/// per-protocol set, then re-render that host into the view.  The view is
/// synchronized on every submit, so it never diverges from the map.
pub struct HostRegistry {
    hosts: HashMap<MacAddr, Host>,
    /// Host insertion order; the inventory preserves it.
    order: Vec<MacAddr>,
    view: InventoryView,
    vendors: VendorDb,
}

impl HostRegistry {
    pub fn new(vendors: VendorDb) -> HostRegistry {
        HostRegistry {
            hosts: HashMap::new(),
            order: Vec::new(),
            view: InventoryView::default(),
            vendors,
        }
    }

    /// Submits an observation, stamping `first_seen`/`last_seen` with the
    /// current wall clock.
    pub fn submit(&mut self, obs: Observation) {
        self.submit_at(obs, SystemTime::now());
    }

    /// Like [`HostRegistry::submit`] with an explicit clock.
    pub fn submit_at(&mut self, obs: Observation, now: SystemTime) {
        let mac = obs.host_key();
        let host = match self.hosts.entry(mac) {
            Entry::Occupied(entry) => {
                let host = entry.into_mut();
                host.refine_ip(obs.carried_ip());
                host.refine_hostname(obs.carried_hostname());
                host.touch(now);
                host
            }
            Entry::Vacant(entry) => {
                info!("New host {mac} ({})", obs.kind().tag());
                let mut host = Host::new(mac, now);
                host.refine_ip(obs.carried_ip());
                host.refine_hostname(obs.carried_hostname());
                self.order.push(mac);
                entry.insert(host)
            }
        };
        if !host.attach(obs) {
            trace!("Repeat observation for {mac}; timestamp refreshed");
        }
        let record = render_host(host, &self.vendors);
        self.view.upsert(mac, record);
    }

    pub fn get(&self, mac: MacAddr) -> Option<&Host> {
        self.hosts.get(&mac)
    }

    /// Hosts in insertion order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.order.iter().filter_map(|mac| self.hosts.get(mac))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn view(&self) -> &InventoryView {
        &self.view
    }
}
