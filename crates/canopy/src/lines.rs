//! Incremental line splitting for subprocess output.
//!
//! Stdout arrives in arbitrary chunks, including splits mid-line and mid
//! UTF-8 sequence, so the pending tail is kept as raw bytes and only decoded
//! once a full line is available.

/// Splits a byte stream into complete lines, buffering the unterminated
/// tail between chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every line completed by it. Line endings
    /// (`\n` or `\r\n`) are stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Consume the splitter, yielding the unterminated tail if any.
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.pending).into_owned())
        }
    }
}
