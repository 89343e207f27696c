//! Types describing a uAP interface and its adapter.
//!
//! A [`DeviceContext`] is paired with exactly one [`AdapterRecord`] for as
//! long as the interface is registered. Counters in both are produced
//! elsewhere in the driver, this crate only reads them, or lets a debugger
//! overwrite them.
mod adapter;
mod device;

pub use self::{adapter::*, device::*};
