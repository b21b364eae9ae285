//! Incremental decoder for `text/event-stream` bodies.
//!
//! Only the parts of the format the page feed uses are honoured: `data:`
//! fields are accumulated and dispatched on a blank line, comment lines
//! (leading `:`) are skipped, and every other field is ignored. Lines may end
//! in `\n` or `\r\n`. Chunk boundaries may fall anywhere, including inside a
//! multi-byte UTF-8 sequence, since decoding happens per complete line.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a body chunk and return every message it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut messages = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(message) = self.process_line(&line) {
                messages.push(message);
            }
        }
        messages
    }

    /// Bytes buffered that do not yet form a complete line.
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_owned());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let message = self.data.join("\n");
        self.data.clear();
        Some(message)
    }
}
