//! Shared output streams for help and diagnostics.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

/// Cloneable handle to a writer shared by every dispatch level.
#[derive(Clone)]
pub struct Output {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Output {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Write one line. Write failures are logged, not propagated.
    pub fn line(&self, text: impl fmt::Display) {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(writer, "{text}") {
            warn!(error = %err, "failed to write output line");
        }
    }

    pub fn blank(&self) {
        self.line("");
    }

    pub fn flush(&self) {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writer.flush() {
            warn!(error = %err, "failed to flush output");
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

/// In-memory writer whose contents can be read back.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> Output {
        Output::new(self.clone())
    }

    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_collects_lines_across_clones() {
        let buffer = Buffer::new();
        let out = buffer.output();
        out.line("first");
        out.clone().blank();
        out.line(format_args!("{}-{}", "a", 1));
        assert_eq!(buffer.contents(), "first\n\na-1\n");
    }
}
