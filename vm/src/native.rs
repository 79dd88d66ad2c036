use std::collections::HashMap;
use std::fmt;

use crate::error::RuntimeError;
use crate::machine::Vm;
use crate::register::Register;

// The unified signature for every binding.
// Arguments come from the register file and guest memory; results go back
// the same way. The returned status is the native outcome, `Err` is a fault.
pub type NativeFn = fn(vm: &mut Vm) -> Result<Status, RuntimeError>;

/// Outcome code of a native function. `0` is success, anything else is an
/// opaque, function-specific failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Status(pub i32);

impl Status {
    pub const OK: Status = Status(0);

    #[inline]
    pub const fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Turn a nonzero status into `NativeFunctionFailure` for callers that
    /// want to bail out with `?`.
    pub fn into_result(self, symbol: &str) -> Result<(), RuntimeError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(RuntimeError::NativeFunctionFailure {
                symbol: symbol.to_string(),
                code: self.0,
            })
        }
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Status(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One argument a binding pulls out of the VM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Scalar integer held directly in the register.
    Int(Register),
    Float(Register),
    /// Address of a NUL-terminated string.
    CString(Register),
    /// Address of a buffer whose length is held in another register.
    Buffer { addr: Register, len: Register },
    /// Address of a fixed-size composite such as a color.
    Composite { addr: Register, size: usize },
}

/// The registered contract of one native function.
#[derive(Clone, Copy)]
pub struct NativeDescriptor {
    pub name: &'static str,
    pub func: NativeFn,
    pub reads: &'static [Operand],
    pub writes: &'static [Register],
    pub blocking: bool,
}

impl NativeDescriptor {
    pub const fn new(name: &'static str, func: NativeFn) -> Self {
        Self {
            name,
            func,
            reads: &[],
            writes: &[],
            blocking: false,
        }
    }

    pub const fn reads(mut self, reads: &'static [Operand]) -> Self {
        self.reads = reads;
        self
    }

    pub const fn writes(mut self, writes: &'static [Register]) -> Self {
        self.writes = writes;
        self
    }

    pub const fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    /// True if writing `reg` is covered by a declared result register.
    pub fn declares_write(&self, reg: Register) -> bool {
        self.writes.iter().any(|w| w.shares_cell(reg))
    }
}

impl fmt::Debug for NativeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeDescriptor")
            .field("name", &self.name)
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .field("blocking", &self.blocking)
            .finish_non_exhaustive()
    }
}

/// How the interpreter names the native it wants to call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeCall<'a> {
    Symbol(&'a str),
    Index(u16),
}

impl fmt::Display for NativeCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeCall::Symbol(s) => write!(f, "`{}`", s),
            NativeCall::Index(i) => write!(f, "#{}", i),
        }
    }
}

/// Frozen table of native functions. The position of a descriptor is its
/// call index.
#[derive(Debug, Clone, Default)]
pub struct NativeTable {
    entries: Vec<NativeDescriptor>,
    by_name: HashMap<&'static str, u16>,
}

impl NativeTable {
    pub fn builder() -> NativeTableBuilder {
        NativeTableBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<&NativeDescriptor> {
        self.entries.get(index as usize)
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// Look up a call target, failing with the matching "unknown" error.
    pub fn resolve(&self, call: NativeCall<'_>) -> Result<(u16, &NativeDescriptor), RuntimeError> {
        let index = match call {
            NativeCall::Symbol(name) => self
                .index_of(name)
                .ok_or_else(|| RuntimeError::UnknownNativeSymbol(name.to_string()))?,
            NativeCall::Index(index) => index,
        };
        self.get(index)
            .map(|desc| (index, desc))
            .ok_or(RuntimeError::UnknownNativeIndex(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NativeDescriptor> {
        self.entries.iter()
    }
}

/// Trait for native function registration
pub trait NativeRegistry {
    fn define_native(&mut self, desc: NativeDescriptor) -> Result<(), RuntimeError>;

    /// Register every descriptor of a static library table, in order.
    fn define_all(&mut self, descs: &[NativeDescriptor]) -> Result<(), RuntimeError> {
        descs.iter().try_for_each(|d| self.define_native(*d))
    }
}

/// Collects descriptors before the VM exists. Once built, the table cannot
/// change.
#[derive(Debug, Default)]
pub struct NativeTableBuilder {
    table: NativeTable,
}

impl NativeTableBuilder {
    pub fn build(self) -> NativeTable {
        self.table
    }
}

impl NativeRegistry for NativeTableBuilder {
    fn define_native(&mut self, desc: NativeDescriptor) -> Result<(), RuntimeError> {
        if self.table.by_name.contains_key(desc.name) {
            return Err(RuntimeError::DuplicateNativeSymbol(desc.name.to_string()));
        }
        let index = u16::try_from(self.table.entries.len())
            .map_err(|_| RuntimeError::Config("native table is full".into()))?;
        self.table.by_name.insert(desc.name, index);
        self.table.entries.push(desc);
        Ok(())
    }
}
