//! Table of raw attributes exposed per device.
//!
//! Every entry names one fixed width counter in either the
//! [`DeviceRecord`] or the [`AdapterRecord`] of a device. The accessor and
//! the declared width are generated from the same field, so a width that
//! doesn't match the field can't compile.
use crate::{
    error::FsError,
    number::parse_unsigned,
    types::{AdapterRecord, DeviceRecord},
    vfs::{FileOps, Result},
};
use std::sync::{
    atomic::{AtomicU16, AtomicU32, AtomicU8, Ordering},
    Arc,
};

/// Width of an attribute, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Width {
    U8 = 1,
    U16 = 2,
    U32 = 4,
}

impl Width {
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

/// Which structure an attribute lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Device,
    Adapter,
}

/// A live counter of some width
#[derive(Debug, Clone, Copy)]
pub enum RawLocation<'a> {
    U8(&'a AtomicU8),
    U16(&'a AtomicU16),
    U32(&'a AtomicU32),
}

impl<'a> RawLocation<'a> {
    pub fn width(&self) -> Width {
        match self {
            Self::U8(_) => Width::U8,
            Self::U16(_) => Width::U16,
            Self::U32(_) => Width::U32,
        }
    }

    /// Address of the counter
    pub fn addr(&self) -> usize {
        match self {
            Self::U8(a) => a.as_ptr() as usize,
            Self::U16(a) => a.as_ptr() as usize,
            Self::U32(a) => a.as_ptr() as usize,
        }
    }

    /// Current value, whatever another writer may be doing to it.
    pub fn load(&self) -> u32 {
        match self {
            Self::U8(a) => a.load(Ordering::Relaxed).into(),
            Self::U16(a) => a.load(Ordering::Relaxed).into(),
            Self::U32(a) => a.load(Ordering::Relaxed),
        }
    }

    /// Overwrite the counter, keeping only the low [`Width`] bytes of `value`.
    pub fn store(&self, value: u32) {
        match self {
            Self::U8(a) => a.store(value as u8, Ordering::Relaxed),
            Self::U16(a) => a.store(value as u16, Ordering::Relaxed),
            Self::U32(a) => a.store(value, Ordering::Relaxed),
        }
    }
}

/// Where a descriptor's counter is found
#[derive(Clone, Copy)]
pub enum Field {
    Device(for<'a> fn(&'a DeviceRecord) -> RawLocation<'a>),
    Adapter(for<'a> fn(&'a AdapterRecord) -> RawLocation<'a>),
}

/// One entry of [`ATTRIBUTES`]
#[derive(Clone, Copy)]
pub struct AttributeDescriptor {
    /// Node name, unique
    pub name: &'static str,
    pub width: Width,

    /// Byte offset of the counter within its owner
    pub offset: usize,
    pub field: Field,
}

impl std::fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("offset", &self.offset)
            .field("owner", &self.owner())
            .finish()
    }
}

impl AttributeDescriptor {
    pub fn owner(&self) -> Owner {
        match self.field {
            Field::Device(_) => Owner::Device,
            Field::Adapter(_) => Owner::Adapter,
        }
    }

    /// Locate this attribute's counter in a live device/adapter pair.
    pub fn resolve<'a>(
        &self,
        device: &'a DeviceRecord,
        adapter: &'a AdapterRecord,
    ) -> RawLocation<'a> {
        match self.field {
            Field::Device(get) => get(device),
            Field::Adapter(get) => get(adapter),
        }
    }
}

macro_rules! attribute {
    ($name:literal, $owner:ident, $variant:ident, $ty:ty, $field:ident) => {
        AttributeDescriptor {
            name: $name,
            width: Width::$variant,
            offset: std::mem::offset_of!($ty, $field),
            field: Field::$owner({
                fn get(r: &$ty) -> RawLocation<'_> {
                    RawLocation::$variant(&r.$field)
                }
                get
            }),
        }
    };
}

macro_rules! device_attribute {
    ($name:literal, $variant:ident, $field:ident) => {
        attribute!($name, Device, $variant, DeviceRecord, $field)
    };
}

macro_rules! adapter_attribute {
    ($name:literal, $variant:ident, $field:ident) => {
        attribute!($name, Adapter, $variant, AdapterRecord, $field)
    };
}

/// Every attribute published for a device, in publishing order.
pub static ATTRIBUTES: &[AttributeDescriptor] = &[
    device_attribute!("cmd_sent", U8, cmd_sent),
    device_attribute!("data_sent", U8, data_sent),
    adapter_attribute!("int_count", U32, int_count),
    adapter_attribute!("cmd_pending", U32, cmd_pending),
    adapter_attribute!("ps_mode", U16, ps_mode),
    adapter_attribute!("ps_state", U16, ps_state),
    adapter_attribute!("cmd_h2c_failed", U32, cmd_host_to_card_failures),
    adapter_attribute!("tx_h2c_failed", U32, tx_host_to_card_failures),
];

/// A published attribute node.
///
/// Reads render like a debugfs `x8`/`x16`/`x32` file, `0x` and exactly
/// two hex digits per byte. Writes take any unsigned number and truncate it
/// to the width, straight into live driver state.
pub struct AttributeNode {
    descriptor: &'static AttributeDescriptor,
    device: Arc<DeviceRecord>,
    adapter: Arc<AdapterRecord>,
}

impl AttributeNode {
    pub fn new(
        descriptor: &'static AttributeDescriptor,
        device: Arc<DeviceRecord>,
        adapter: Arc<AdapterRecord>,
    ) -> Self {
        Self {
            descriptor,
            device,
            adapter,
        }
    }

    fn location(&self) -> RawLocation<'_> {
        self.descriptor.resolve(&self.device, &self.adapter)
    }
}

impl FileOps for AttributeNode {
    fn read(&self) -> Result<Vec<u8>> {
        let width = self.descriptor.width.bytes() * 2;
        Ok(format!("0x{:0width$x}\n", self.location().load(), width = width).into_bytes())
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        let text = std::str::from_utf8(data).map_err(|_| FsError::InvalidArgument)?;
        let value = parse_unsigned(text).ok_or(FsError::InvalidArgument)?;
        self.location().store(value as u32);
        Ok(data.len())
    }
}
