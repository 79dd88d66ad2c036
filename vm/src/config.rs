use std::path::Path;

use serde::Deserialize;

use crate::error::RuntimeError;

pub const DEFAULT_MEMORY_SIZE: usize = 4096;

fn default_memory_size() -> usize {
    DEFAULT_MEMORY_SIZE
}

fn default_true() -> bool {
    true
}

/// What the VM does when a native call faults (unknown symbol, memory
/// fault, contract violation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Halt the VM and hand the error to the host.
    Abort,
    /// Report the fault to the interpreter as a guest-visible trap and keep
    /// the VM runnable.
    #[default]
    Trap,
}

/// VM settings, loadable from TOML:
///
/// ```toml
/// memory_size = 65536
/// fault_policy = "abort"
/// verify_contracts = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VmConfig {
    /// Guest memory size in bytes.
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,
    #[serde(default)]
    pub fault_policy: FaultPolicy,
    /// Reject register writes a descriptor does not declare.
    #[serde(default)]
    pub verify_contracts: bool,
    /// Emit a `debug` event for every dispatched call.
    #[serde(default = "default_true")]
    pub trace_calls: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            fault_policy: FaultPolicy::default(),
            verify_contracts: false,
            trace_calls: true,
        }
    }
}

impl VmConfig {
    pub fn from_toml(src: &str) -> Result<Self, RuntimeError> {
        let config: VmConfig =
            toml::from_str(src).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&src)
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.memory_size == 0 {
            return Err(RuntimeError::Config(
                "memory_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn with_memory_size(mut self, bytes: usize) -> Self {
        self.memory_size = bytes;
        self
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    pub fn with_verify_contracts(mut self, on: bool) -> Self {
        self.verify_contracts = on;
        self
    }

    pub fn with_trace_calls(mut self, on: bool) -> Self {
        self.trace_calls = on;
        self
    }
}
