use crate::GuestAddr;

/// Faults raised by guest memory accessors.
///
/// A fault always means the access did not happen: nothing was read and
/// nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("out of bounds: {len} byte(s) at {addr} (guest memory is {size} bytes)")]
    OutOfBounds {
        addr: GuestAddr,
        len: usize,
        size: usize,
    },

    #[error("unterminated string at {addr}: no NUL byte before the end of guest memory")]
    UnterminatedString { addr: GuestAddr },
}

impl MemoryError {
    /// Address the failing access started at.
    pub fn addr(&self) -> GuestAddr {
        match self {
            MemoryError::OutOfBounds { addr, .. } => *addr,
            MemoryError::UnterminatedString { addr } => *addr,
        }
    }
}
