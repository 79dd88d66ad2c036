use memory::{GuestAddr, MemoryError};

use crate::register::Register;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("unknown native symbol `{0}`")]
    UnknownNativeSymbol(String),
    #[error("unknown native index {0}")]
    UnknownNativeIndex(u16),
    #[error("native symbol `{0}` is already registered")]
    DuplicateNativeSymbol(String),
    #[error("native `{symbol}` failed with status {code}")]
    NativeFunctionFailure { symbol: String, code: i32 },
    #[error("a native call is already in progress")]
    NativeCallInProgress,
    #[error("native `{symbol}` wrote {register}, which its descriptor does not declare")]
    UndeclaredRegisterWrite { symbol: String, register: Register },

    #[error("invalid register code {0:#04x}")]
    InvalidRegister(u8),
    #[error("unknown register name `{0}`")]
    UnknownRegisterName(String),
    #[error("string at {addr} is not valid UTF-8")]
    InvalidUtf8 { addr: GuestAddr },

    #[error("no `{0}` host is attached to this VM")]
    HostUnavailable(&'static str),
    #[error("the VM is halted")]
    Halted,
    #[error("configuration error: {0}")]
    Config(String),
}
