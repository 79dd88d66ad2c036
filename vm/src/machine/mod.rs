//! Machine module - the VM instance and the native call bridge
//!
//! The VM owns the register file, guest memory, the frozen native table and
//! any host attachments. Dispatch lives in its own submodule so the call
//! state machine can be read in one place.

mod dispatch;
mod host;
mod vm;

// Public API
pub use dispatch::{CallState, Completion};
pub use host::HostMap;
pub use vm::Vm;
