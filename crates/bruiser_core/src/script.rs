//! # Script Calls
//!
//! The host VM runs static script functions asynchronously and reports the
//! return value through a callback on one of its own threads. The helpers
//! here turn that into a plain blocking call for background tasks.
//!
//! Never call these from a host notification thread: the VM may need that
//! thread to make progress.

use crate::error::ScriptError;
use crate::sync::CompletionSignal;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A value crossing the script boundary.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ScriptValue {
    /// No value (functions returning nothing).
    #[default]
    None,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i32),
    /// Float.
    Float(f32),
    /// String.
    Str(String),
}

impl ScriptValue {
    /// The float payload, if any.
    #[must_use]
    pub const fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }
}

/// Receives a script function's return value.
pub trait StackCallback: Send + Sync {
    /// Called once by the VM with the result.
    fn call(&self, result: ScriptValue);
}

/// The host's script virtual machine.
pub trait ScriptVm: Send + Sync {
    /// Queues `class.function(args)`.
    ///
    /// Returns `false` if the VM refused; the callback then never runs.
    fn dispatch_static_call(
        &self,
        class: &str,
        function: &str,
        args: Vec<ScriptValue>,
        callback: Arc<dyn StackCallback>,
    ) -> bool;
}

// =============================================================================
// PENDING CALL
// =============================================================================

/// Callback that parks the result for a waiting thread.
#[derive(Debug, Default)]
pub struct PendingCall {
    result: Mutex<Option<ScriptValue>>,
    signal: CompletionSignal,
}

impl PendingCall {
    /// Creates an unanswered call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once the VM answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.signal.is_done()
    }

    /// Waits for the answer, forever if `timeout` is `None`.
    ///
    /// Returns `None` on timeout.
    pub fn wait(&self, timeout: Option<Duration>) -> Option<ScriptValue> {
        match timeout {
            Some(limit) => {
                if !self.signal.wait_timeout(limit) {
                    return None;
                }
            }
            None => self.signal.wait(),
        }
        Some(self.result.lock().take().unwrap_or_default())
    }
}

impl StackCallback for PendingCall {
    fn call(&self, result: ScriptValue) {
        *self.result.lock() = Some(result);
        self.signal.signal();
    }
}

// =============================================================================
// BLOCKING CALLS
// =============================================================================

/// Runs `class.function(args)` and blocks for the callback.
///
/// # Errors
///
/// [`ScriptError::DispatchRejected`] if the VM refused the call,
/// [`ScriptError::TimedOut`] if `timeout` elapsed first.
pub fn call_static(
    vm: &dyn ScriptVm,
    class: &str,
    function: &str,
    args: Vec<ScriptValue>,
    timeout: Option<Duration>,
) -> Result<ScriptValue, ScriptError> {
    let pending = Arc::new(PendingCall::new());
    let callback: Arc<dyn StackCallback> = pending.clone();

    if !vm.dispatch_static_call(class, function, args, callback) {
        return Err(ScriptError::DispatchRejected {
            class: class.to_string(),
            function: function.to_string(),
        });
    }

    tracing::trace!("Entering callback wait for {class}.{function}");
    let result = pending.wait(timeout).ok_or_else(|| ScriptError::TimedOut {
        class: class.to_string(),
        function: function.to_string(),
        waited: timeout.unwrap_or_default(),
    })?;
    tracing::trace!("Done callback wait for {class}.{function}");
    Ok(result)
}

/// [`call_static`] for functions returning a float.
///
/// # Errors
///
/// As [`call_static`], plus [`ScriptError::UnexpectedReturn`] when the VM
/// answers with anything but a float.
pub fn call_static_float(
    vm: &dyn ScriptVm,
    class: &str,
    function: &str,
    args: Vec<ScriptValue>,
    timeout: Option<Duration>,
) -> Result<f32, ScriptError> {
    let value = call_static(vm, class, function, args, timeout)?;
    value.as_float().ok_or_else(|| ScriptError::UnexpectedReturn {
        class: class.to_string(),
        function: function.to_string(),
        expected: "float",
        found: value.type_name(),
    })
}
