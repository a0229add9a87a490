//! Interpretation-mode stack with scoped guards.
//!
//! The dispatcher routes on the topmost mode. Modes are pushed and popped
//! strictly around the dynamic extent of one invocation: both guards restore
//! the stack in their `Drop`, so the outer mode survives early returns and
//! error paths without any cleanup code at the call sites.

use std::cell::RefCell;

/// Execution strategy selector for the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Real compute on dense tensors.
    Concrete,
    /// Shape/dtype-only compute on meta tensors.
    Abstract,
    /// Record one graph node instead of executing.
    Trace,
    /// Unwrap one functional layer and redispatch beneath it.
    Functionalize,
}

/// Stack-scoped mode state. Empty stack means concrete execution.
#[derive(Default)]
pub struct ModeStack {
    stack: RefCell<Vec<Mode>>,
}

impl ModeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mode governing the current call.
    pub fn current(&self) -> Mode {
        self.stack.borrow().last().copied().unwrap_or(Mode::Concrete)
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Push a mode for the extent of the returned guard.
    pub fn enter(&self, mode: Mode) -> ModeGuard<'_> {
        self.stack.borrow_mut().push(mode);
        ModeGuard { stack: self }
    }

    /// Pop the topmost mode for the extent of the returned guard; the guard
    /// restores it on drop. Used by the trace arm to suspend recording while
    /// it discovers output structure.
    pub fn suspend_top(&self) -> SuspendGuard<'_> {
        let suspended = self.stack.borrow_mut().pop();
        SuspendGuard { stack: self, suspended }
    }

    /// Like [`suspend_top`](Self::suspend_top), but only when the topmost
    /// mode equals `mode`. This is the redispatch-to-next-layer step of the
    /// call-site rewriter: it must not re-trigger its own functionalization.
    pub fn suspend_if(&self, mode: Mode) -> SuspendGuard<'_> {
        let suspended = {
            let mut stack = self.stack.borrow_mut();
            if stack.last() == Some(&mode) { stack.pop() } else { None }
        };
        SuspendGuard { stack: self, suspended }
    }
}

/// Pops the mode it pushed when dropped.
pub struct ModeGuard<'s> {
    stack: &'s ModeStack,
}

impl Drop for ModeGuard<'_> {
    fn drop(&mut self) {
        self.stack.stack.borrow_mut().pop();
    }
}

/// Restores the mode it suspended when dropped.
pub struct SuspendGuard<'s> {
    stack: &'s ModeStack,
    suspended: Option<Mode>,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        if let Some(mode) = self.suspended {
            self.stack.stack.borrow_mut().push(mode);
        }
    }
}
