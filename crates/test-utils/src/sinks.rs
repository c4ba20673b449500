use std::path::Path;
use std::sync::{Arc, Mutex};

use dupguard::exec::{OutputSink, OutputStream, TracingSink};
use dupguard::logging::StepSinkFactory;
use dupguard::summary::StepKind;

/// Sink that records every forwarded line, shareable with the test body.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    lines: Arc<Mutex<Vec<(OutputStream, String)>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(OutputStream, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Only the lines of one stream, in forwarding order.
    pub fn stream_lines(&self, stream: OutputStream) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, l)| l.clone())
            .collect()
    }
}

impl OutputSink for CaptureSink {
    fn line(&mut self, stream: OutputStream, line: &str) {
        self.lines.lock().unwrap().push((stream, line.to_string()));
    }
}

/// Step sink factory that skips log files entirely; pipeline tests don't
/// care about the on-disk artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSinks;

impl StepSinkFactory for TracingSinks {
    fn open_step(&self, _dir: &Path, _step: StepKind) -> anyhow::Result<Box<dyn OutputSink>> {
        Ok(Box::new(TracingSink))
    }
}
