//! Line-oriented sink for solver warnings.
//!
//! Hosts that want warnings somewhere other than the `log` facade install
//! their own [`DiagnosticSink`] with
//! [`SimplexSolver::set_diagnostic_sink`](crate::SimplexSolver::set_diagnostic_sink).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Receives one formatted message per call.
pub trait DiagnosticSink: fmt::Debug {
    fn write_line(&mut self, line: &str);
}

/// Forwards every line to `log::warn!`. This is the default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn write_line(&mut self, line: &str) {
        log::warn!("{}", line);
    }
}

/// Collects lines into a buffer shared with the host.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}
