//! Line-oriented output sinks for engine progress.
//!
//! The engine writes human-readable progress to stdout while an operation
//! runs. Callers hand a sink to each lifecycle call and receive every line
//! in order, synchronously, as it is read.

use parking_lot::Mutex;

/// A writable-line interface.
pub trait OutputSink: Send + Sync {
    fn write_line(&self, line: &str);
}

impl<F> OutputSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn write_line(&self, line: &str) {
        self(line)
    }
}

/// Prints each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&self, line: &str) {
        println!("{}", line);
    }
}

/// Discards output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write_line(&self, _line: &str) {}
}

/// Records lines in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

impl OutputSink for CaptureSink {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
