use tracing::{debug, trace, warn};

use super::vm::Vm;
use crate::config::FaultPolicy;
use crate::error::RuntimeError;
use crate::native::{NativeCall, Status};

/// Where the VM is in the lifecycle of a native call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CallState {
    #[default]
    Idle,
    /// Resolving the call target.
    Dispatching,
    /// The bound function is running.
    Executing,
    /// Checking results before control goes back to the interpreter.
    Returning,
}

/// What the interpreter gets back from a call-native instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The native ran. The status is passed through verbatim.
    Returned(Status),
    /// The call faulted and the VM is still runnable; the interpreter should
    /// raise a guest-visible trap.
    Trapped(RuntimeError),
}

impl Vm {
    pub fn call_state(&self) -> CallState {
        self.state
    }

    fn transition(&mut self, next: CallState) {
        trace!(from = ?self.state, to = ?next, "call state");
        self.state = next;
    }

    pub fn call_native(&mut self, symbol: &str) -> Result<Status, RuntimeError> {
        self.dispatch(NativeCall::Symbol(symbol))
    }

    pub fn call_native_index(&mut self, index: u16) -> Result<Status, RuntimeError> {
        self.dispatch(NativeCall::Index(index))
    }

    /// Resolve and run one native function.
    ///
    /// Faults come back as `Err` and never change registers the native did
    /// not write. A nonzero status is not a fault. The call state is `Idle`
    /// again on every exit path.
    pub fn dispatch(&mut self, call: NativeCall<'_>) -> Result<Status, RuntimeError> {
        if self.halted {
            return Err(RuntimeError::Halted);
        }
        // Natives cannot call back into the guest or into each other.
        if self.state != CallState::Idle {
            return Err(RuntimeError::NativeCallInProgress);
        }

        self.transition(CallState::Dispatching);
        // Copy out so the table borrow ends before the native gets `&mut self`.
        let (index, desc) = match self.natives.resolve(call) {
            Ok((index, desc)) => (index, *desc),
            Err(err) => {
                self.transition(CallState::Idle);
                return Err(err);
            }
        };

        if self.config.trace_calls {
            debug!(
                symbol = desc.name,
                index,
                blocking = desc.blocking,
                "native call"
            );
        }
        let before = self.config.verify_contracts.then(|| self.regs.clone());

        self.transition(CallState::Executing);
        let result = (desc.func)(self);
        self.transition(CallState::Returning);

        let result = result.and_then(|status| {
            if let Some(before) = &before {
                if let Some(register) = self
                    .regs
                    .changed_since(before)
                    .find(|&reg| !desc.declares_write(reg))
                {
                    return Err(RuntimeError::UndeclaredRegisterWrite {
                        symbol: desc.name.to_string(),
                        register,
                    });
                }
            }
            Ok(status)
        });

        self.transition(CallState::Idle);
        result
    }

    /// Entry point for the interpreter's call-native instruction. Applies
    /// the configured [`FaultPolicy`] to faults.
    pub fn service(&mut self, call: NativeCall<'_>) -> Result<Completion, RuntimeError> {
        match self.dispatch(call) {
            Ok(status) => Ok(Completion::Returned(status)),
            Err(RuntimeError::Halted) => Err(RuntimeError::Halted),
            Err(err) => match self.config.fault_policy {
                FaultPolicy::Abort => {
                    warn!(%call, error = %err, "native call fault, halting vm");
                    self.halted = true;
                    Err(err)
                }
                FaultPolicy::Trap => {
                    warn!(%call, error = %err, "native call fault, trapping");
                    Ok(Completion::Trapped(err))
                }
            },
        }
    }
}
