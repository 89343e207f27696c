//! Debug attribute and status surfaces for uAP network interfaces
//!
//! Every registered interface gets two things:
//!
//! - A debugfs directory, `<module>/<device>/`, with one raw read/write node
//!   per entry of [`attributes::ATTRIBUTES`], bound directly to live driver
//!   counters.
//! - A procfs directory, `<status root>/<device>/`, with an `info` status
//!   dump and a `hwstatus` endpoint that resets the hardware when the reset
//!   code is written to it.
//!
//! # Implementation details
//!
//! The filesystems are modelled by [`vfs`], an in-memory node tree where
//! file content is rendered on every read.
//!
//! Nothing here synchronizes with the rest of the driver. Counters are
//! relaxed atomics, so a read may observe a value mid-update, and writes to
//! attribute nodes land in live state unchecked.
//!
//! Failing to publish something is never an error for the device, it just
//! runs without that surface. See [`driver::Driver`] for the lifecycle.
//!
//! # Features
//!
//! - `snapshot`, on by default. Enables [`snapshot`], which copies a node
//!   tree to disk.
#![doc(html_root_url = "https://docs.rs/uapdbg/0.1.0")]

pub mod attributes;
pub mod config;
pub mod debugfs;
pub mod driver;
pub mod error;
pub mod number;
pub mod proc;
#[cfg(feature = "snapshot")]
pub mod snapshot;
pub mod types;
pub mod vfs;
