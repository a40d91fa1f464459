//! Console sinks used by the default `__proto__` tracer.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Destination for `console.trace`-style messages.
pub trait TraceSink: fmt::Debug {
    fn trace(&mut self, message: &str);
}

/// Prints `Trace: <message>` and a captured backtrace to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrTraceSink;

impl TraceSink for StderrTraceSink {
    fn trace(&mut self, message: &str) {
        let backtrace = Backtrace::force_capture();
        eprintln!("Trace: {message}\n{backtrace}");
    }
}

/// Keeps every message in memory. Clones share the same buffer, so a clone
/// handed to a realm can be inspected through the original.
#[derive(Debug, Default, Clone)]
pub struct RecordingTraceSink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl RecordingTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl TraceSink for RecordingTraceSink {
    fn trace(&mut self, message: &str) {
        self.lines.borrow_mut().push(message.to_string());
    }
}
