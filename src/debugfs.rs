//! Raw attribute exposure under debugfs.
//!
//! ```text
//! <module>/
//!     <device>/
//!         cmd_sent
//!         data_sent
//!         ...
//! ```
//!
//! Every node is bound to a live counter, see [`crate::attributes`]. Writing
//! a node overwrites driver state with no checks whatsoever, this is a
//! debugging backdoor and not an API.
//!
//! Failing to create anything here never affects the device, it just
//! isn't exposed. Failures are logged.
use crate::{
    attributes::{AttributeNode, ATTRIBUTES},
    types::DeviceContext,
    vfs::{Entry, Filesystem, Mode},
};
use log::{debug, warn};

/// The module-wide debugfs directory.
///
/// Owned by the [`Driver`](crate::driver::Driver) for as long as the module
/// is loaded.
#[derive(Debug, Default)]
pub struct DebugRoot {
    dir: Option<Entry>,
}

impl DebugRoot {
    /// A root that was never published. Devices won't be exposed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root directory `name` in `fs`.
    ///
    /// Does nothing if already published. On failure the root stays absent.
    pub fn publish(&mut self, fs: &Filesystem, name: &str) {
        if self.is_present() {
            debug!("{}: debug root `{name}` already published", fs.name());
            return;
        }
        match fs.root().create_dir(name, Mode::DIR) {
            Ok(dir) => self.dir = Some(dir),
            Err(e) => warn!("{}: couldn't create debug root `{name}`: {e}", fs.name()),
        }
    }

    pub fn is_present(&self) -> bool {
        self.dir.as_ref().map_or(false, Entry::is_linked)
    }

    /// Remove the root and every device directory beneath it.
    pub fn teardown(&mut self) {
        if let Some(dir) = self.dir.take() {
            dir.remove();
        }
    }
}

/// Publish one node per attribute under `<root>/<device>`.
///
/// Does nothing if `root` is absent or the device is already published.
pub fn publish_device(root: &DebugRoot, device: &DeviceContext, mode: Mode) {
    let root = match &root.dir {
        Some(dir) if dir.is_linked() => dir,
        _ => {
            debug!("{}: no debug root, not exposing attributes", device.name());
            return;
        }
    };

    let mut surfaces = device.surfaces.lock();
    if surfaces.exposure.as_ref().map_or(false, Entry::is_linked) {
        debug!("{}: attributes already exposed", device.name());
        return;
    }

    let dir = match root.node().create_dir(device.name(), Mode::DIR) {
        Ok(dir) => dir,
        Err(e) => {
            warn!("{}: couldn't create debug directory: {e}", device.name());
            return;
        }
    };
    for attr in ATTRIBUTES {
        let node = AttributeNode::new(attr, device.record().clone(), device.adapter().clone());
        if let Err(e) = dir.node().create_file(attr.name, mode, Box::new(node)) {
            warn!("{}: couldn't create `{}`: {e}", device.name(), attr.name);
        }
    }
    surfaces.exposure = Some(dir);
}

/// Remove the device's debug directory and everything in it.
///
/// Does nothing if it isn't published.
pub fn unpublish_device(device: &DeviceContext) {
    if let Some(dir) = device.surfaces.lock().exposure.take() {
        if !dir.remove() {
            debug!("{}: debug directory was already gone", device.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdapterRecord, MacAddress, NetInterface};
    use anyhow::Result;
    use std::sync::{atomic::Ordering, Arc};

    const MODE: Mode = Mode::from_bits_truncate(0o600);

    fn device(name: &str) -> Arc<DeviceContext> {
        DeviceContext::new(
            NetInterface::new(name, MacAddress::default()),
            Arc::new(AdapterRecord::new()),
        )
    }

    fn setup() -> (Filesystem, DebugRoot) {
        let _ = env_logger::builder().is_test(true).try_init();
        let fs = Filesystem::new("debugfs");
        let mut root = DebugRoot::new();
        root.publish(&fs, "uap");
        (fs, root)
    }

    #[test]
    fn publishes_every_attribute() -> Result<()> {
        let (fs, root) = setup();
        let dev = device("uap0");
        publish_device(&root, &dev, MODE);

        let names = fs.resolve("uap/uap0")?.children();
        assert_eq!(names.len(), ATTRIBUTES.len());
        for attr in ATTRIBUTES {
            let node = fs.resolve(format!("uap/uap0/{}", attr.name))?;
            assert_eq!(node.mode(), MODE);
        }
        assert!(dev.is_exposed());
        Ok(())
    }

    #[test]
    fn nodes_are_live() -> Result<()> {
        let (fs, root) = setup();
        let dev = device("uap0");
        publish_device(&root, &dev, MODE);

        dev.adapter().int_count.store(7, Ordering::Relaxed);
        assert_eq!(fs.read_to_string("uap/uap0/int_count")?, "0x00000007\n");
        dev.adapter().int_count.store(8, Ordering::Relaxed);
        assert_eq!(fs.read_to_string("uap/uap0/int_count")?, "0x00000008\n");

        fs.write("uap/uap0/data_sent", b"1\n")?;
        assert_eq!(dev.record().data_sent.load(Ordering::Relaxed), 1);
        Ok(())
    }

    #[test]
    fn publish_twice_is_noop() -> Result<()> {
        let (fs, root) = setup();
        let dev = device("uap0");
        publish_device(&root, &dev, MODE);
        let first = fs.resolve("uap/uap0")?;
        publish_device(&root, &dev, MODE);

        assert!(Arc::ptr_eq(&first, &fs.resolve("uap/uap0")?));
        assert_eq!(fs.resolve("uap")?.children(), ["uap0"]);
        assert_eq!(first.children().len(), ATTRIBUTES.len());
        Ok(())
    }

    #[test]
    fn no_root_no_exposure() {
        let fs = Filesystem::new("debugfs");
        let root = DebugRoot::new();
        let dev = device("uap0");
        publish_device(&root, &dev, MODE);

        assert!(!dev.is_exposed());
        assert!(fs.walk().is_empty());
    }

    #[test]
    fn root_publish_failure_degrades() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let fs = Filesystem::new("debugfs");
        fs.root().create_dir("uap", Mode::DIR)?;
        let mut root = DebugRoot::new();
        root.publish(&fs, "uap");
        assert!(!root.is_present());

        let dev = device("uap0");
        publish_device(&root, &dev, MODE);
        assert!(!dev.is_exposed());
        Ok(())
    }

    #[test]
    fn name_clash_is_not_fatal() -> Result<()> {
        let (fs, root) = setup();
        let a = device("uap0");
        let b = device("uap0");
        publish_device(&root, &a, MODE);
        publish_device(&root, &b, MODE);

        assert!(a.is_exposed());
        assert!(!b.is_exposed());
        // b's removal must not take a's directory
        unpublish_device(&b);
        assert!(fs.exists("uap/uap0/cmd_sent"));
        Ok(())
    }

    #[test]
    fn unpublish() -> Result<()> {
        let (fs, root) = setup();
        let dev = device("uap0");
        unpublish_device(&dev);

        publish_device(&root, &dev, MODE);
        unpublish_device(&dev);
        assert!(!fs.exists("uap/uap0"));
        assert!(fs.exists("uap"));
        assert!(!dev.is_exposed());
        unpublish_device(&dev);
        Ok(())
    }

    #[test]
    fn teardown_removes_everything() -> Result<()> {
        let (fs, mut root) = setup();
        let a = device("uap0");
        let b = device("uap1");
        publish_device(&root, &a, MODE);
        publish_device(&root, &b, MODE);

        root.teardown();
        assert!(fs.walk().is_empty());
        assert!(!root.is_present());
        assert!(!a.is_exposed());

        // Stale handles are harmless
        unpublish_device(&a);
        drop(b);
        assert!(fs.walk().is_empty());
        Ok(())
    }

    #[test]
    fn drop_releases() -> Result<()> {
        let (fs, root) = setup();
        let dev = device("uap0");
        publish_device(&root, &dev, MODE);
        drop(dev);
        assert!(!fs.exists("uap/uap0"));
        Ok(())
    }
}
