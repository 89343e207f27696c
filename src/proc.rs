//! Status surface under procfs.
//!
//! ```text
//! <status root>/
//!     <device>/
//!         info        read-only status dump
//!         hwstatus    hardware status, write the reset code to reset
//! ```
//!
//! The top-level directory is shared by all devices. What happens to it when
//! one device goes away is decided by [`StatusRootRemoval`].
use crate::{
    config::{Config, StatusRootRemoval},
    error::FsError,
    number::parse_number,
    types::{DeviceContext, HardwareStatus},
    vfs::{Entry, FileOps, Filesystem, Mode, Result},
};
use log::{debug, info, warn};
use std::{
    fmt::{self, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

/// Name of the status dump endpoint
pub const INFO: &str = "info";

/// Name of the hardware status endpoint
pub const HWSTATUS: &str = "hwstatus";

/// Longest accepted `hwstatus` write, in bytes.
pub const HWSTATUS_MAX: usize = 10;

/// Resets the radio hardware of a device.
///
/// May block. Failures are the implementation's business, the status is set
/// to [`HardwareStatus::Reset`] regardless.
pub trait HardwareReset: Send + Sync {
    fn hardware_reset(&self, device: &DeviceContext);
}

impl<F> HardwareReset for F
where
    F: Fn(&DeviceContext) + Send + Sync,
{
    fn hardware_reset(&self, device: &DeviceContext) {
        self(device)
    }
}

/// Render the `info` dump of `device`.
///
/// Every counter is read at call time.
pub fn render_info(device: &DeviceContext, config: &Config) -> String {
    let mut s = String::new();
    // Writing to a String can't fail
    let _ = write_info(&mut s, device, config);
    s
}

fn write_info(s: &mut String, device: &DeviceContext, config: &Config) -> fmt::Result {
    let net = device.net();
    let stats = &net.stats;
    let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
    let multicast = net.multicast();

    writeln!(s, "driver_name = \"{}\"", config.driver_name)?;
    writeln!(s, "driver_version = {}", config.version_string())?;
    writeln!(s, "InterfaceName=\"{}\"", net.name())?;
    let state = if device.media_connected() {
        "Connected"
    } else {
        "Disconnected"
    };
    writeln!(s, "State=\"{state}\"")?;
    writeln!(s, "MACAddress=\"{}\"", net.mac())?;
    writeln!(s, "MCCount=\"{}\"", multicast.len())?;
    for (i, addr) in multicast.iter().enumerate() {
        writeln!(s, "MCAddr[{i}]=\"{addr}\"")?;
    }
    writeln!(s, "num_tx_bytes = {}", load(&stats.tx_bytes))?;
    writeln!(s, "num_rx_bytes = {}", load(&stats.rx_bytes))?;
    writeln!(s, "num_tx_pkts = {}", load(&stats.tx_packets))?;
    writeln!(s, "num_rx_pkts = {}", load(&stats.rx_packets))?;
    writeln!(s, "num_tx_pkts_dropped = {}", load(&stats.tx_dropped))?;
    writeln!(s, "num_rx_pkts_dropped = {}", load(&stats.rx_dropped))?;
    writeln!(s, "num_tx_pkts_err = {}", load(&stats.tx_errors))?;
    writeln!(s, "num_rx_pkts_err = {}", load(&stats.rx_errors))?;
    writeln!(s, "num_tx_timeout = {}", device.num_tx_timeout())?;
    let carrier = if net.carrier_ok() { "on" } else { "off" };
    writeln!(s, "carrier {carrier}")?;
    let queue = if net.queue_stopped() {
        "stopped"
    } else {
        "started"
    };
    writeln!(s, "tx queue {queue}")
}

struct InfoNode {
    device: Weak<DeviceContext>,
    config: Config,
}

impl FileOps for InfoNode {
    fn read(&self) -> Result<Vec<u8>> {
        let device = self.device.upgrade().ok_or(FsError::NoDevice)?;
        Ok(render_info(&device, &self.config).into_bytes())
    }
}

struct HwStatusNode {
    device: Weak<DeviceContext>,
    reset: Arc<dyn HardwareReset>,
}

impl FileOps for HwStatusNode {
    fn read(&self) -> Result<Vec<u8>> {
        let device = self.device.upgrade().ok_or(FsError::NoDevice)?;
        Ok(format!("{}\n", device.adapter().hardware_status()).into_bytes())
    }

    /// Only the reset command is accepted, there is no way to set any other
    /// status.
    fn write(&self, data: &[u8]) -> Result<usize> {
        if data.len() > HWSTATUS_MAX {
            return Err(FsError::InvalidArgument);
        }
        let device = self.device.upgrade().ok_or(FsError::NoDevice)?;

        // Input ends at the first NUL, like a C string
        let text = match data.iter().position(|&b| b == 0) {
            Some(end) => &data[..end],
            None => data,
        };
        let text = text.strip_suffix(b"\n").unwrap_or(text);

        if parse_number(text) as u32 != HardwareStatus::Reset.code() {
            return Err(FsError::InvalidArgument);
        }
        info!("{}: reset hw", device.name());
        self.reset.hardware_reset(&device);
        device.adapter().set_hardware_status(HardwareStatus::Reset);
        Ok(data.len())
    }
}

/// Handles to one device's status directory.
#[derive(Debug)]
pub(crate) struct StatusEntries {
    top: Entry,
    dir: Entry,
    endpoints: Vec<Entry>,
}

impl StatusEntries {
    fn is_linked(&self) -> bool {
        self.top.is_linked() && self.dir.is_linked()
    }

    /// Remove the endpoints and the device directory, leaving the top-level
    /// directory alone.
    pub(crate) fn release(self) -> Entry {
        for endpoint in self.endpoints {
            endpoint.remove();
        }
        self.dir.remove();
        self.top
    }
}

/// Create `<status root>/<device>/{info,hwstatus}`.
///
/// Does nothing if they already exist. Failures are logged, and leave the
/// device without a status directory.
pub fn create_status(
    fs: &Filesystem,
    device: &Arc<DeviceContext>,
    config: &Config,
    reset: Arc<dyn HardwareReset>,
) {
    info!("{}: creating proc interface", device.name());
    let mut surfaces = device.surfaces.lock();
    if surfaces.status.as_ref().map_or(false, StatusEntries::is_linked) {
        debug!("{}: proc interface already exists", device.name());
        return;
    }

    let top = match fs.root().get_or_create_dir(&config.status_root, Mode::DIR) {
        Ok(top) => top,
        Err(e) => {
            warn!("failed to create {}/{}: {e}", fs.name(), config.status_root);
            return;
        }
    };
    let dir = match top.node().create_dir(device.name(), Mode::DIR) {
        Ok(dir) => dir,
        Err(e) => {
            warn!(
                "failed to create {}/{}/{}: {e}",
                fs.name(),
                config.status_root,
                device.name()
            );
            return;
        }
    };

    let info_node = InfoNode {
        device: Arc::downgrade(device),
        config: config.clone(),
    };
    let hwstatus_node = HwStatusNode {
        device: Arc::downgrade(device),
        reset,
    };
    let nodes = [
        (INFO, Box::new(info_node) as Box<dyn FileOps>),
        (HWSTATUS, Box::new(hwstatus_node) as Box<dyn FileOps>),
    ];

    let mut endpoints = Vec::with_capacity(nodes.len());
    for (name, ops) in nodes {
        match dir.node().create_file(name, config.status_mode, ops) {
            Ok(entry) => endpoints.push(entry),
            Err(e) => warn!(
                "failed to create {}/{}/{name}: {e}",
                config.status_root,
                device.name()
            ),
        }
    }
    surfaces.status = Some(StatusEntries {
        top,
        dir,
        endpoints,
    });
}

/// Remove the device's status directory, and then the top-level directory as
/// `policy` says.
///
/// Does nothing if there is no status directory.
pub fn remove_status(device: &DeviceContext, policy: StatusRootRemoval) {
    // Held until everything is unlinked, so a concurrent create_status
    // can't see the directory half gone
    let mut surfaces = device.surfaces.lock();
    let status = match surfaces.status.take() {
        Some(s) => s,
        None => return,
    };
    let top = status.release();
    match policy {
        StatusRootRemoval::Unconditional => {
            if !top.node().children().is_empty() {
                debug!(
                    "{}: removing `{}` with other devices still in it",
                    device.name(),
                    top.name()
                );
            }
            top.remove();
        }
        StatusRootRemoval::WhenEmpty => {
            if top.node().children().is_empty() {
                top.remove();
            }
        }
    }
}
