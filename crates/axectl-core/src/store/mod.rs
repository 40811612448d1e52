// ── Snapshot store ──
//
// Cached device state plus the coordinator that keeps it fresh.

mod coordinator;
mod snapshot;

pub use coordinator::Coordinator;
pub use snapshot::{ASIC_MODEL_KEY, DeviceSnapshot};
