//! Helpers bindings use to move arguments out of the VM and results back in.
//!
//! The helpers only translate. Range checks on the values themselves
//! (negative sizes, zero font sizes) belong to the binding.

use memory::{GuestAddr, GuestMemory};

use crate::error::RuntimeError;
use crate::machine::Vm;
use crate::register::Register;

/// Four 8-bit channels, stored in guest memory as `r, g, b, a`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const SIZE: usize = 4;

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Reconstruct a color from the four bytes at `addr`.
    pub fn read(mem: &GuestMemory, addr: GuestAddr) -> Result<Self, RuntimeError> {
        let bytes = mem.read_bytes(addr, Self::SIZE)?;
        Ok(Self::new(bytes[0], bytes[1], bytes[2], bytes[3]))
    }

    pub fn write(self, mem: &mut GuestMemory, addr: GuestAddr) -> Result<(), RuntimeError> {
        mem.write_bytes(addr, &self.to_bytes())?;
        Ok(())
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((r, g, b, a): (u8, u8, u8, u8)) -> Self {
        Self::new(r, g, b, a)
    }
}

#[inline]
pub fn arg_int(vm: &Vm, reg: Register) -> i64 {
    vm.registers().get_int(reg)
}

/// Integer argument narrowed to `i32`. The value is sign-extended from the
/// view first, so a `D*` register always fits.
#[inline]
pub fn arg_i32(vm: &Vm, reg: Register) -> i32 {
    vm.registers().get_int(reg) as i32
}

#[inline]
pub fn arg_uint(vm: &Vm, reg: Register) -> u64 {
    vm.registers().get_uint(reg)
}

#[inline]
pub fn arg_float(vm: &Vm, reg: Register) -> f64 {
    vm.registers().get_float(reg)
}

/// The register's bits as a guest address.
#[inline]
pub fn arg_addr(vm: &Vm, reg: Register) -> GuestAddr {
    GuestAddr(vm.registers().get_uint(reg))
}

/// The NUL-terminated string whose address is held in `reg`.
pub fn arg_cstr(vm: &Vm, reg: Register) -> Result<&str, RuntimeError> {
    let addr = arg_addr(vm, reg);
    let bytes = vm.memory().read_cstring(addr)?;
    std::str::from_utf8(bytes).map_err(|_| RuntimeError::InvalidUtf8 { addr })
}

/// Raw bytes of the NUL-terminated string whose address is held in `reg`.
pub fn arg_cbytes(vm: &Vm, reg: Register) -> Result<&[u8], RuntimeError> {
    let addr = arg_addr(vm, reg);
    Ok(vm.memory().read_cstring(addr)?)
}

pub fn arg_color(vm: &Vm, reg: Register) -> Result<Color, RuntimeError> {
    Color::read(vm.memory(), arg_addr(vm, reg))
}

#[inline]
pub fn ret_int(vm: &mut Vm, reg: Register, value: i64) {
    vm.registers_mut().set_int(reg, value);
}

#[inline]
pub fn ret_bool(vm: &mut Vm, reg: Register, value: bool) {
    vm.registers_mut().set(reg, u64::from(value));
}

#[inline]
pub fn ret_float(vm: &mut Vm, reg: Register, value: f64) {
    vm.registers_mut().set_float(reg, value);
}
