use std::any::Any;

use memory::{GuestAddr, GuestMemory};

use super::dispatch::CallState;
use super::host::HostMap;
use crate::config::VmConfig;
use crate::error::RuntimeError;
use crate::native::NativeTable;
use crate::register::{Register, Registers};

/// The Virtual Machine struct
pub struct Vm {
    pub(super) regs: Registers,
    pub(super) mem: GuestMemory,
    /// Frozen at construction. Bindings and hosts can read it, nothing can
    /// add to it.
    pub(super) natives: NativeTable,
    pub(super) hosts: HostMap,
    pub(super) config: VmConfig,
    pub(super) state: CallState,
    pub(super) halted: bool,
}

impl Vm {
    /// Create a VM with zeroed registers and `config.memory_size` bytes of
    /// zeroed guest memory.
    pub fn new(config: VmConfig, natives: NativeTable) -> Result<Self, RuntimeError> {
        config.validate()?;
        tracing::debug!(
            memory_size = config.memory_size,
            natives = natives.len(),
            policy = ?config.fault_policy,
            "vm created"
        );
        Ok(Self {
            regs: Registers::new(),
            mem: GuestMemory::new(config.memory_size),
            natives,
            hosts: HostMap::new(),
            config,
            state: CallState::Idle,
            halted: false,
        })
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn natives(&self) -> &NativeTable {
        &self.natives
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn memory(&self) -> &GuestMemory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut GuestMemory {
        &mut self.mem
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Stop the VM. Every later dispatch fails with `Halted`.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Soft reset: zero registers and memory and clear the halt flag.
    /// The native table and host attachments are kept. The call state is
    /// owned by the dispatcher, so a native that resets the VM is still
    /// inside its call.
    pub fn reset(&mut self) {
        self.regs.clear();
        self.mem = GuestMemory::new(self.config.memory_size);
        self.halted = false;
    }

    /// Copy a program's data image into guest memory at `addr`.
    pub fn load_image(&mut self, addr: GuestAddr, bytes: &[u8]) -> Result<(), RuntimeError> {
        self.mem.write_bytes(addr, bytes)?;
        Ok(())
    }

    // --- Host attachments ---

    pub fn attach<T: Any>(&mut self, host: T) -> Option<T> {
        tracing::debug!(host = std::any::type_name::<T>(), "host attached");
        self.hosts.attach(host)
    }

    pub fn detach<T: Any>(&mut self) -> Option<T> {
        self.hosts.detach()
    }

    pub fn host<T: Any>(&self) -> Result<&T, RuntimeError> {
        self.hosts.get()
    }

    pub fn host_mut<T: Any>(&mut self) -> Result<&mut T, RuntimeError> {
        self.hosts.get_mut()
    }

    /// Borrow a host and guest memory at the same time, for bindings that
    /// move data between the two (e.g. reading a file into a guest buffer).
    pub fn host_and_memory_mut<T: Any>(
        &mut self,
    ) -> Result<(&mut T, &mut GuestMemory), RuntimeError> {
        let host = self.hosts.get_mut::<T>()?;
        Ok((host, &mut self.mem))
    }

    // --- Binding surface ---

    pub fn get_register_int(&self, reg: Register) -> i64 {
        self.regs.get_int(reg)
    }

    pub fn set_register_int(&mut self, reg: Register, value: i64) {
        self.regs.set_int(reg, value);
    }

    pub fn get_register_float(&self, reg: Register) -> f64 {
        self.regs.get_float(reg)
    }

    pub fn set_register_float(&mut self, reg: Register, value: f64) {
        self.regs.set_float(reg, value);
    }

    pub fn read_byte(&self, addr: GuestAddr) -> Result<u8, RuntimeError> {
        Ok(self.mem.read_byte(addr)?)
    }

    pub fn write_byte(&mut self, addr: GuestAddr, value: u8) -> Result<(), RuntimeError> {
        Ok(self.mem.write_byte(addr, value)?)
    }

    pub fn read_cstring(&self, addr: GuestAddr) -> Result<&[u8], RuntimeError> {
        Ok(self.mem.read_cstring(addr)?)
    }
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("memory_size", &self.mem.len())
            .field("natives", &self.natives.len())
            .field("hosts", &self.hosts)
            .field("state", &self.state)
            .field("halted", &self.halted)
            .finish()
    }
}
