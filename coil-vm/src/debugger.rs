//! Debugger kernel (component L, `SPEC_FULL.md` §4.L).
//!
//! This module holds the state an interactive debugger needs —
//! breakpoints and single-step mode — and the one decision it makes
//! every instruction (`should_break`). It does not read stdin or print
//! anything: the `coildbg` binary owns the REPL loop and drives an
//! [`Executor`](crate::executor::Executor) and a [`Debugger`] together,
//! the way `coilvm` drives an `Executor` alone.

use crate::error::Error;

/// Maximum number of simultaneously armed breakpoints.
pub const BREAKPOINT_CAPACITY: usize = 16;

/// Breakpoint and step-mode state for one debugging session.
#[derive(Debug, Default)]
pub struct Debugger {
    breakpoints: Vec<usize>,
    single_stepping: bool,
}

impl Debugger {
    /// A debugger with no breakpoints, not in step mode.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single_stepping(&self) -> bool {
        self.single_stepping
    }

    pub fn set_single_stepping(&mut self, on: bool) {
        self.single_stepping = on;
    }

    /// Arms a breakpoint at a stream offset. Fails once
    /// [`BREAKPOINT_CAPACITY`] breakpoints are already set; duplicate
    /// offsets are silently accepted (setting the same one twice is a
    /// no-op, not an error).
    pub fn set_breakpoint(&mut self, offset: usize) -> Result<(), Error> {
        if self.breakpoints.contains(&offset) {
            return Ok(());
        }
        if self.breakpoints.len() >= BREAKPOINT_CAPACITY {
            return Err(Error::BreakpointSetFull {
                capacity: BREAKPOINT_CAPACITY,
            });
        }
        self.breakpoints.push(offset);
        Ok(())
    }

    /// Removes the breakpoint at list index `idx` (the `delete <idx>`
    /// command addresses breakpoints positionally, matching
    /// `breakpoints`' listing order).
    pub fn remove_breakpoint(&mut self, idx: usize) -> Option<usize> {
        if idx < self.breakpoints.len() {
            Some(self.breakpoints.remove(idx))
        } else {
            None
        }
    }

    /// The armed breakpoints, in `breakpoints`/`delete` list order.
    pub fn breakpoints(&self) -> &[usize] {
        &self.breakpoints
    }

    /// Whether the debugger should stop and enter its command loop
    /// before executing the record at `offset` — either single-step
    /// mode is on, or `offset` matches an armed breakpoint
    /// (`SPEC_FULL.md` §4.L, steps 1-2).
    pub fn should_break(&self, offset: usize) -> bool {
        self.single_stepping || self.breakpoints.contains(&offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_stepping_always_breaks() {
        let mut d = Debugger::new();
        d.set_single_stepping(true);
        assert!(d.should_break(0));
        assert!(d.should_break(1234));
    }

    #[test]
    fn breakpoint_only_breaks_at_its_offset() {
        let mut d = Debugger::new();
        d.set_breakpoint(40).unwrap();
        assert!(d.should_break(40));
        assert!(!d.should_break(41));
    }

    #[test]
    fn breakpoint_set_rejects_past_capacity() {
        let mut d = Debugger::new();
        for i in 0..BREAKPOINT_CAPACITY {
            d.set_breakpoint(i).unwrap();
        }
        assert!(matches!(
            d.set_breakpoint(BREAKPOINT_CAPACITY),
            Err(Error::BreakpointSetFull { .. })
        ));
    }

    #[test]
    fn setting_the_same_breakpoint_twice_is_a_no_op() {
        let mut d = Debugger::new();
        d.set_breakpoint(5).unwrap();
        d.set_breakpoint(5).unwrap();
        assert_eq!(d.breakpoints().len(), 1);
    }

    #[test]
    fn remove_breakpoint_is_by_list_index() {
        let mut d = Debugger::new();
        d.set_breakpoint(1).unwrap();
        d.set_breakpoint(2).unwrap();
        assert_eq!(d.remove_breakpoint(0), Some(1));
        assert_eq!(d.breakpoints(), &[2]);
    }
}
