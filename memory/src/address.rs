use std::fmt;

/// Byte offset into guest memory.
///
/// Guest code only ever sees these integers; they are resolved against the
/// live [`GuestMemory`](crate::GuestMemory) extent on every access and never
/// turned into host pointers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct GuestAddr(pub u64);

impl GuestAddr {
    #[inline]
    pub const fn new(offset: u64) -> Self {
        GuestAddr(offset)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// `self + offset`, or `None` if the sum leaves the 64-bit address space.
    #[inline]
    pub fn checked_add(self, offset: u64) -> Option<GuestAddr> {
        self.0.checked_add(offset).map(GuestAddr)
    }

    /// Host index for this address, if it fits in `usize`.
    #[inline]
    pub fn to_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl From<u64> for GuestAddr {
    #[inline]
    fn from(offset: u64) -> Self {
        GuestAddr(offset)
    }
}

impl From<u32> for GuestAddr {
    #[inline]
    fn from(offset: u32) -> Self {
        GuestAddr(offset as u64)
    }
}

impl From<GuestAddr> for u64 {
    #[inline]
    fn from(addr: GuestAddr) -> Self {
        addr.0
    }
}

impl fmt::Debug for GuestAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuestAddr({:#x})", self.0)
    }
}

impl fmt::Display for GuestAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
