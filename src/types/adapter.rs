//! Hardware and firmware facing state of an interface
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};

/// State of the radio hardware, as stored in
/// [`AdapterRecord::hardware_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum HardwareStatus {
    Ready = 0,
    Initializing = 1,

    /// A reset was requested and carried out.
    Reset = 2,
    Closing = 3,
    NotReady = 4,
}

impl HardwareStatus {
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for HardwareStatus {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Ready,
            1 => Self::Initializing,
            2 => Self::Reset,
            3 => Self::Closing,
            4 => Self::NotReady,
            _ => return Err(code),
        })
    }
}

/// Counters and status shared with firmware command processing.
///
/// Everything here is written by other parts of the driver without any
/// locking. Loads are relaxed, so readers may see values mid-update.
#[derive(Debug)]
pub struct AdapterRecord {
    /// Interrupts taken
    pub int_count: AtomicU32,

    /// Firmware commands queued but not yet sent
    pub cmd_pending: AtomicU32,

    /// Power save mode
    pub ps_mode: AtomicU16,

    /// Power save state
    pub ps_state: AtomicU16,

    /// Commands the bus failed to deliver to the card
    pub cmd_host_to_card_failures: AtomicU32,

    /// Data packets the bus failed to deliver to the card
    pub tx_host_to_card_failures: AtomicU32,

    /// Raw [`HardwareStatus`] code
    pub hardware_status: AtomicU32,
}

impl Default for AdapterRecord {
    fn default() -> Self {
        Self {
            int_count: AtomicU32::new(0),
            cmd_pending: AtomicU32::new(0),
            ps_mode: AtomicU16::new(0),
            ps_state: AtomicU16::new(0),
            cmd_host_to_card_failures: AtomicU32::new(0),
            tx_host_to_card_failures: AtomicU32::new(0),
            hardware_status: AtomicU32::new(HardwareStatus::Ready.code()),
        }
    }
}

impl AdapterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw status code.
    ///
    /// May not be a known [`HardwareStatus`], the attribute surface can store
    /// anything here.
    pub fn hardware_status(&self) -> u32 {
        self.hardware_status.load(Ordering::Relaxed)
    }

    pub fn set_hardware_status(&self, status: HardwareStatus) {
        self.hardware_status.store(status.code(), Ordering::Relaxed)
    }
}
