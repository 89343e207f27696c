//! Names, versions and policies of the published surfaces
use crate::vfs::Mode;

/// Driver name, shown in the `info` endpoint.
pub const DRIVER_NAME: &str = "uap";

/// Driver version, shown in the `info` endpoint.
pub const DRIVER_VERSION: &str = "26146";

/// Firmware patch number the driver was released against.
pub const FIRMWARE_PATCH: &str = "68";

/// What to do with the shared status directory when a device goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRootRemoval {
    /// Always remove it, taking every other device's status nodes with it.
    ///
    /// This is how the driver has always behaved.
    Unconditional,

    /// Only remove it once no device directory is left beneath it.
    WhenEmpty,
}

/// Configuration of a [`Driver`](crate::driver::Driver)
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the debugfs root directory
    pub module_name: String,

    /// Name of the top-level procfs directory
    pub status_root: String,

    pub driver_name: String,
    pub driver_version: String,
    pub firmware_patch: String,

    /// Mode of attribute nodes
    pub attribute_mode: Mode,

    /// Mode of the `info` and `hwstatus` endpoints
    pub status_mode: Mode,

    pub status_root_removal: StatusRootRemoval,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module_name: "uap".into(),
            status_root: "uap".into(),
            driver_name: DRIVER_NAME.into(),
            driver_version: DRIVER_VERSION.into(),
            firmware_patch: FIRMWARE_PATCH.into(),
            attribute_mode: Mode::OWNER_READ | Mode::OWNER_WRITE,
            status_mode: Mode::OWNER_READ | Mode::OWNER_WRITE | Mode::GROUP_READ,
            status_root_removal: StatusRootRemoval::Unconditional,
        }
    }
}

impl Config {
    /// `<version>-(FP<patch>)`, as shown in the `info` endpoint
    pub fn version_string(&self) -> String {
        format!("{}-(FP{})", self.driver_version, self.firmware_patch)
    }
}
