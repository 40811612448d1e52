//! Device mediation layer between `axectl-api` and consumers (the CLI, or
//! anything embedding the crate).
//!
//! - **[`Device`]**: Facade for one Bitaxe/AxeOS device:
//!   [`connect()`](Device::connect) fetches the first snapshot and starts
//!   the background poller; reads decode from the cached snapshot; writes
//!   and commands go through the dispatcher.
//!
//! - **[`Coordinator`]**: Owns the single cached [`DeviceSnapshot`].
//!   Concurrent refresh requests coalesce into one GET; writes are
//!   serialized and followed by a forced refresh, so a successful write is
//!   visible to the writer as soon as it returns.
//!
//! - **[`Registry`]**: Static catalog of control points (sensors, numbers,
//!   selects, switches, text fields) and commands, with per-point value
//!   domains and codecs. Frequency and core-voltage options depend on the
//!   reported ASIC model ([`asic`]).
//!
//! - **[`Dispatcher`]**: Turns "set key to value" and "press command" into
//!   validated device writes.
//!
//! - **[`Transport`]**: The network seam. [`axectl_api::DeviceClient`] is
//!   the production implementation.

pub mod asic;
pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod registry;
pub mod store;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::Dispatcher;
pub use config::DeviceConfig;
pub use controller::{ConnectionState, Device, Reading};
pub use error::{CoreError, DispatchError, FetchError, RegistryError, WriteError};
pub use registry::{
    Access, Codec, CommandDescriptor, ControlPointDescriptor, DisplayValue, DomainSpec, Platform,
    Registry, ValueDomain,
};
pub use store::{Coordinator, DeviceSnapshot};
pub use transport::{Transport, WriteRequest};
