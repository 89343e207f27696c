//! Per-interface state
use super::AdapterRecord;
use crate::{proc::StatusEntries, vfs::Entry};
use log::debug;
use spin::Mutex;
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering},
        Arc,
    },
};

/// An Ethernet style hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(addr: [u8; 6]) -> Self {
        Self(addr)
    }
}

/// Traffic counters, maintained by the data path.
#[derive(Debug, Default)]
pub struct NetStats {
    pub tx_bytes: AtomicU64,
    pub rx_bytes: AtomicU64,
    pub tx_packets: AtomicU64,
    pub rx_packets: AtomicU64,
    pub tx_dropped: AtomicU64,
    pub rx_dropped: AtomicU64,
    pub tx_errors: AtomicU64,
    pub rx_errors: AtomicU64,
}

/// The network interface as the host stack sees it
#[derive(Debug)]
pub struct NetInterface {
    name: String,
    mac: Mutex<MacAddress>,
    multicast: Mutex<Vec<MacAddress>>,
    carrier: AtomicBool,
    queue_stopped: AtomicBool,
    pub stats: NetStats,
}

impl NetInterface {
    /// New interface, with carrier off and the transmit queue stopped.
    pub fn new(name: &str, mac: MacAddress) -> Self {
        Self {
            name: name.to_owned(),
            mac: Mutex::new(mac),
            multicast: Mutex::new(Vec::new()),
            carrier: AtomicBool::new(false),
            queue_stopped: AtomicBool::new(true),
            stats: NetStats::default(),
        }
    }

    /// Interface name, ie `uap0`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mac(&self) -> MacAddress {
        *self.mac.lock()
    }

    pub fn set_mac(&self, mac: MacAddress) {
        *self.mac.lock() = mac;
    }

    /// Current multicast filter list
    pub fn multicast(&self) -> Vec<MacAddress> {
        self.multicast.lock().clone()
    }

    pub fn set_multicast(&self, list: Vec<MacAddress>) {
        *self.multicast.lock() = list;
    }

    pub fn carrier_ok(&self) -> bool {
        self.carrier.load(Ordering::Relaxed)
    }

    pub fn set_carrier(&self, on: bool) {
        self.carrier.store(on, Ordering::Relaxed)
    }

    pub fn queue_stopped(&self) -> bool {
        self.queue_stopped.load(Ordering::Relaxed)
    }

    pub fn stop_queue(&self) {
        self.queue_stopped.store(true, Ordering::Relaxed)
    }

    pub fn wake_queue(&self) {
        self.queue_stopped.store(false, Ordering::Relaxed)
    }
}

/// Command and data path flags of a device.
#[derive(Debug, Default)]
pub struct DeviceRecord {
    /// A firmware command is in flight
    pub cmd_sent: AtomicU8,

    /// A data packet is in flight
    pub data_sent: AtomicU8,
}

/// Handles to everything published for one device.
#[derive(Debug, Default)]
pub(crate) struct Surfaces {
    /// debugfs `<module>/<device>`
    pub exposure: Option<Entry>,

    /// procfs `<status root>/<device>`
    pub status: Option<StatusEntries>,
}

/// One active network interface.
///
/// Created when the interface is registered. Anything still published for
/// it is unlinked when it's dropped.
#[derive(Debug)]
pub struct DeviceContext {
    net: NetInterface,
    record: Arc<DeviceRecord>,
    adapter: Arc<AdapterRecord>,
    media_connected: AtomicBool,
    num_tx_timeout: AtomicU32,

    /// Serializes publishing and removal for this device
    pub(crate) surfaces: Mutex<Surfaces>,
}

impl DeviceContext {
    pub fn new(net: NetInterface, adapter: Arc<AdapterRecord>) -> Arc<Self> {
        Arc::new(Self {
            net,
            record: Arc::new(DeviceRecord::default()),
            adapter,
            media_connected: AtomicBool::new(false),
            num_tx_timeout: AtomicU32::new(0),
            surfaces: Mutex::new(Surfaces::default()),
        })
    }

    /// External identifier, the interface name.
    pub fn name(&self) -> &str {
        self.net.name()
    }

    pub fn net(&self) -> &NetInterface {
        &self.net
    }

    pub fn record(&self) -> &Arc<DeviceRecord> {
        &self.record
    }

    pub fn adapter(&self) -> &Arc<AdapterRecord> {
        &self.adapter
    }

    pub fn media_connected(&self) -> bool {
        self.media_connected.load(Ordering::Relaxed)
    }

    pub fn set_media_connected(&self, connected: bool) {
        self.media_connected.store(connected, Ordering::Relaxed)
    }

    pub fn num_tx_timeout(&self) -> u32 {
        self.num_tx_timeout.load(Ordering::Relaxed)
    }

    /// Count a transmit watchdog timeout.
    pub fn tx_timeout(&self) {
        self.num_tx_timeout.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether the attribute directory is currently published.
    pub fn is_exposed(&self) -> bool {
        self.surfaces
            .lock()
            .exposure
            .as_ref()
            .map_or(false, Entry::is_linked)
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        let surfaces = self.surfaces.get_mut();
        if let Some(dir) = surfaces.exposure.take() {
            if dir.remove() {
                debug!("{}: released attribute directory on drop", self.net.name);
            }
        }
        if let Some(status) = surfaces.status.take() {
            status.release();
        }
    }
}
