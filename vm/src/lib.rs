pub mod config;
pub mod error;
pub mod machine;
pub mod marshal;
pub mod native;
pub mod register;

pub use config::{FaultPolicy, VmConfig};
pub use error::RuntimeError;
pub use machine::{CallState, Completion, Vm};
pub use marshal::Color;
pub use native::{
    NativeCall, NativeDescriptor, NativeFn, NativeRegistry, NativeTable, NativeTableBuilder,
    Operand, Status,
};
pub use register::{Register, RegisterView, Registers};

pub use memory::{GuestAddr, GuestMemory, MemoryError};
