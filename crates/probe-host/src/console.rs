/// Output captured from one contract instance.
///
/// Writes past `limit` bytes are dropped and flagged; the kept prefix always
/// ends on a char boundary.
#[derive(Debug)]
pub struct Console {
    buf: String,
    limit: usize,
    truncated: bool,
}

impl Console {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: String::new(),
            limit,
            truncated: false,
        }
    }

    pub fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        tracing::debug!(target: "contract_console", "{}", text);

        let room = self.limit.saturating_sub(self.buf.len());
        if text.len() <= room {
            self.buf.push_str(text);
            return;
        }

        let mut end = room;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.buf.push_str(&text[..end]);
        self.truncated = true;
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Drains the buffer, returning the text and whether any was dropped.
    pub fn take(&mut self) -> (String, bool) {
        let truncated = std::mem::replace(&mut self.truncated, false);
        (std::mem::take(&mut self.buf), truncated)
    }
}

/// Per-store data seen by the host imports.
#[derive(Debug)]
pub struct HostState {
    pub console: Console,
}

impl HostState {
    pub fn new(max_console_bytes: usize) -> Self {
        Self {
            console: Console::new(max_console_bytes),
        }
    }
}
