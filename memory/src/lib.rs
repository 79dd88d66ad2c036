pub mod address;
pub mod error;
pub mod guest;

#[cfg(test)]
mod guest_tests;

pub use address::GuestAddr;
pub use byteorder::{BigEndian, ByteOrder, LittleEndian};
pub use error::MemoryError;
pub use guest::GuestMemory;
