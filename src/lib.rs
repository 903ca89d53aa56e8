/*!
A passive network-discovery engine.

Devices on a LAN segment can't help talking about themselves: they ARP for
their neighbours, beg DHCP servers for addresses, advertise services over
mDNS and SSDP, and (if they're switches) introduce themselves with LLDP,
CDP and spanning-tree BPDUs.  This crate listens to that chatter and distils
it into a live host inventory, without ever sending a byte.

The pipeline is linear:

```text
frame ─► Dispatcher ─► per-protocol decoder ─► Observation ─► HostRegistry ─► InventoryView
```

* Each [`decode::Decoder`] reduces a frame to one typed [`Observation`], or
  declines.  Decoding is pure and bounds-checked; malformed frames decline
  rather than panic.
* The [`HostRegistry`] fuses observations into hosts keyed by MAC,
  deduplicating repeat sightings and refining each host's IP and hostname as
  better information arrives.
* The [`InventoryView`] is a rendered mirror of the host map, kept in sync on
  every submit and serialized to JSON on demand.

[`Engine`] wires the three together:

```no_run
use lanscout::{capture::CaptureSource, Engine, Frame, VendorDb};

let mut capture = CaptureSource::open("eth0")?;
let mut engine = Engine::new(VendorDb::empty());
loop {
    if let Some((ts, data)) = capture.next_frame()? {
        engine.process(&Frame::new(ts, data));
    }
}
# Ok::<(), lanscout::Error>(())
```
*/

pub mod capture;
pub mod decode;
mod error;
mod frame;
mod host;
mod inventory;
mod mac;
mod observation;
mod registry;
mod vendor;

pub use error::{Error, Result};
pub use frame::Frame;
pub use host::Host;
pub use inventory::{HostRecord, InventoryView};
pub use mac::MacAddr;
pub use observation::{
    ArpObservation, BridgeId, CdpObservation, DhcpObservation, LldpObservation, MdnsObservation,
    Observation, Protocol, SsdpKind, SsdpObservation, StpObservation, WolObservation, ZERO_IP,
};
pub use registry::HostRegistry;
pub use vendor::VendorDb;

use decode::Dispatcher;
use std::path::Path;
use std::time::SystemTime;

/// The full pipeline: decoders in front of a host registry.
pub struct Engine {
    dispatcher: Dispatcher,
    registry: HostRegistry,
}

impl Engine {
    pub fn new(vendors: VendorDb) -> Engine {
        Engine {
            dispatcher: Dispatcher::standard(),
            registry: HostRegistry::new(vendors),
        }
    }

    /// Runs one frame through every decoder and submits whatever they emit.
    pub fn process(&mut self, frame: &Frame<'_>) {
        self.process_at(frame, SystemTime::now());
    }

    /// Like [`Engine::process`] with an explicit clock for
    /// `first_seen`/`last_seen`.
    pub fn process_at(&mut self, frame: &Frame<'_>, now: SystemTime) {
        let registry = &mut self.registry;
        self.dispatcher.dispatch(frame, |obs| registry.submit_at(obs, now));
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// Serializes the current inventory to `path`.
    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        self.registry.view().write_to(path)
    }
}
