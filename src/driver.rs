//! Lifecycle hooks tying the surfaces to module and device events.
//!
//! # Example
//!
//! ```rust
//! # use std::sync::Arc;
//! # use uapdbg::{config::Config, driver::Driver, types::*, vfs::Filesystem};
//! let debugfs = Arc::new(Filesystem::new("debugfs"));
//! let procfs = Arc::new(Filesystem::new("procfs"));
//! let driver = Driver::new(
//!     Config::default(),
//!     debugfs.clone(),
//!     procfs.clone(),
//!     Arc::new(|dev: &DeviceContext| println!("resetting {}", dev.name())),
//! );
//! driver.on_module_load();
//!
//! let dev = DeviceContext::new(
//!     NetInterface::new("uap0", MacAddress::default()),
//!     Arc::new(AdapterRecord::new()),
//! );
//! driver.on_device_ready(&dev);
//! assert_eq!(debugfs.read_to_string("uap/uap0/cmd_sent").unwrap(), "0x00\n");
//!
//! procfs.write("uap/uap0/hwstatus", b"2\n").unwrap();
//! assert_eq!(dev.adapter().hardware_status(), HardwareStatus::Reset.code());
//!
//! driver.on_device_removed(&dev);
//! driver.on_module_unload();
//! ```
use crate::{
    config::Config,
    debugfs::{self, DebugRoot},
    proc::{self, HardwareReset},
    types::DeviceContext,
    vfs::Filesystem,
};
use log::info;
use spin::Mutex;
use std::sync::Arc;

/// Owns everything that lives for as long as the module is loaded.
pub struct Driver {
    config: Config,
    debugfs: Arc<Filesystem>,
    procfs: Arc<Filesystem>,
    debug_root: Mutex<DebugRoot>,
    reset: Arc<dyn HardwareReset>,
}

impl Driver {
    pub fn new(
        config: Config,
        debugfs: Arc<Filesystem>,
        procfs: Arc<Filesystem>,
        reset: Arc<dyn HardwareReset>,
    ) -> Self {
        Self {
            config,
            debugfs,
            procfs,
            debug_root: Mutex::new(DebugRoot::new()),
            reset,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn debugfs(&self) -> &Filesystem {
        &self.debugfs
    }

    pub fn procfs(&self) -> &Filesystem {
        &self.procfs
    }

    /// Publish the debugfs root.
    pub fn on_module_load(&self) {
        info!("{}: module loaded", self.config.module_name);
        self.debug_root
            .lock()
            .publish(&self.debugfs, &self.config.module_name);
    }

    /// Expose the device's attributes and create its status endpoints.
    pub fn on_device_ready(&self, device: &Arc<DeviceContext>) {
        debugfs::publish_device(&self.debug_root.lock(), device, self.config.attribute_mode);
        proc::create_status(&self.procfs, device, &self.config, self.reset.clone());
    }

    /// Remove everything published for the device.
    pub fn on_device_removed(&self, device: &DeviceContext) {
        debugfs::unpublish_device(device);
        proc::remove_status(device, self.config.status_root_removal);
    }

    /// Remove the debugfs root, and every device directory still in it.
    pub fn on_module_unload(&self) {
        self.debug_root.lock().teardown();
        info!("{}: module unloaded", self.config.module_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attributes::ATTRIBUTES,
        config::StatusRootRemoval,
        types::{AdapterRecord, HardwareStatus, MacAddress, NetInterface},
    };
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Rig {
        driver: Driver,
        resets: Arc<AtomicUsize>,
    }

    fn rig(config: Config) -> Rig {
        let _ = env_logger::builder().is_test(true).try_init();
        let resets = Arc::new(AtomicUsize::new(0));
        let r = resets.clone();
        let driver = Driver::new(
            config,
            Arc::new(Filesystem::new("debugfs")),
            Arc::new(Filesystem::new("procfs")),
            Arc::new(move |_: &DeviceContext| {
                r.fetch_add(1, Ordering::SeqCst);
            }),
        );
        Rig { driver, resets }
    }

    fn device(name: &str, last: u8) -> Arc<DeviceContext> {
        DeviceContext::new(
            NetInterface::new(name, MacAddress([0x00, 0x50, 0x43, 0x00, 0x00, last])),
            Arc::new(AdapterRecord::new()),
        )
    }

    #[test]
    fn full_lifecycle() -> Result<()> {
        let Rig { driver, resets } = rig(Config::default());
        driver.on_module_load();
        let dev = device("uap0", 1);
        driver.on_device_ready(&dev);

        assert_eq!(
            driver.debugfs().resolve("uap/uap0")?.children().len(),
            ATTRIBUTES.len()
        );
        let info = driver.procfs().read_to_string("uap/uap0/info")?;
        assert!(info.contains("MACAddress=\"00:50:43:00:00:01\"\n"));

        driver.procfs().write("uap/uap0/hwstatus", b"2")?;
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        assert_eq!(dev.adapter().hardware_status(), HardwareStatus::Reset.code());

        driver.on_device_removed(&dev);
        assert!(!driver.debugfs().exists("uap/uap0"));
        assert!(driver.procfs().walk().is_empty());

        driver.on_module_unload();
        assert!(driver.debugfs().walk().is_empty());
        Ok(())
    }

    #[test]
    fn ready_twice() -> Result<()> {
        let Rig { driver, .. } = rig(Config::default());
        driver.on_module_load();
        driver.on_module_load();
        let dev = device("uap0", 1);
        driver.on_device_ready(&dev);
        driver.on_device_ready(&dev);

        assert_eq!(driver.debugfs().resolve("uap")?.children(), ["uap0"]);
        assert_eq!(driver.procfs().resolve("uap")?.children(), ["uap0"]);
        Ok(())
    }

    #[test]
    fn removed_without_ready() {
        let Rig { driver, .. } = rig(Config::default());
        driver.on_module_load();
        let dev = device("uap0", 1);
        driver.on_device_removed(&dev);
        assert!(driver.debugfs().exists("uap"));
    }

    #[test]
    fn not_loaded_still_has_status() -> Result<()> {
        let Rig { driver, .. } = rig(Config::default());
        let dev = device("uap0", 1);
        driver.on_device_ready(&dev);

        assert!(!dev.is_exposed());
        assert!(driver.debugfs().walk().is_empty());
        assert_eq!(driver.procfs().read_to_string("uap/uap0/hwstatus")?, "0\n");
        Ok(())
    }

    #[test]
    fn unload_with_devices_attached() -> Result<()> {
        let Rig { driver, .. } = rig(Config::default());
        driver.on_module_load();
        let a = device("uap0", 1);
        let b = device("uap1", 2);
        driver.on_device_ready(&a);
        driver.on_device_ready(&b);

        driver.on_module_unload();
        assert!(driver.debugfs().walk().is_empty());
        assert!(!a.is_exposed());
        assert!(!b.is_exposed());

        // Late removal after unload touches nothing
        driver.on_device_removed(&a);
        assert!(driver.debugfs().walk().is_empty());

        // Reloading starts from scratch
        driver.on_module_load();
        driver.on_device_ready(&b);
        assert!(driver.debugfs().exists("uap/uap1/tx_h2c_failed"));
        Ok(())
    }

    #[test]
    fn status_root_policies() {
        let legacy = rig(Config::default()).driver;
        let counted = rig(Config {
            status_root_removal: StatusRootRemoval::WhenEmpty,
            ..Config::default()
        })
        .driver;

        for driver in [&legacy, &counted] {
            let a = device("uap0", 1);
            let b = device("uap1", 2);
            driver.on_device_ready(&a);
            driver.on_device_ready(&b);
            driver.on_device_removed(&a);
            let sibling = driver.procfs().exists("uap/uap1/info");
            match driver.config().status_root_removal {
                StatusRootRemoval::Unconditional => assert!(!sibling),
                StatusRootRemoval::WhenEmpty => assert!(sibling),
            }
        }
    }
}
