//! Line and frame reassembly.
//!
//! Turns arbitrary text fragments into `event:`/`data:` frames. A frame is
//! dispatched when a blank line arrives; `finish` treats end of input as that
//! blank line.

/// One assembled `event:`/`data:` group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the last `event:` line, if any
    pub event: Option<String>,
    /// All `data:` values joined with `\n`
    pub data: String,
}

/// Incremental frame assembler.
///
/// Invariant: `line_buffer` never holds a line terminator.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    line_buffer: String,
    event_name: Option<String>,
    data_lines: Vec<String>,
    /// A chunk ended in `\r`; a `\n` opening the next chunk belongs to it.
    skip_leading_lf: bool,
    /// Whether any input has been seen (for BOM stripping).
    started: bool,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a text fragment, calling `on_frame` for every completed frame.
    pub fn push<F>(&mut self, chunk: &str, mut on_frame: F)
    where
        F: FnMut(SseFrame),
    {
        let mut rest = chunk;
        if rest.is_empty() {
            return;
        }
        if !self.started {
            self.started = true;
            rest = rest.strip_prefix('\u{feff}').unwrap_or(rest);
        }
        if self.skip_leading_lf {
            self.skip_leading_lf = false;
            rest = rest.strip_prefix('\n').unwrap_or(rest);
        }

        while let Some(pos) = rest.find(['\r', '\n']) {
            let terminator = rest.as_bytes()[pos];
            if self.line_buffer.is_empty() {
                self.process_line(&rest[..pos], &mut on_frame);
            } else {
                self.line_buffer.push_str(&rest[..pos]);
                let line = std::mem::take(&mut self.line_buffer);
                self.process_line(&line, &mut on_frame);
            }
            rest = &rest[pos + 1..];

            if terminator == b'\r' {
                if rest.is_empty() {
                    self.skip_leading_lf = true;
                } else {
                    rest = rest.strip_prefix('\n').unwrap_or(rest);
                }
            }
        }

        self.line_buffer.push_str(rest);
    }

    /// Resolve the buffered tail as a full line, then dispatch any frame still
    /// in assembly. A second call finds nothing left and emits nothing.
    pub fn finish<F>(&mut self, mut on_frame: F)
    where
        F: FnMut(SseFrame),
    {
        if !self.line_buffer.is_empty() {
            let line = std::mem::take(&mut self.line_buffer);
            self.process_line(&line, &mut on_frame);
        }
        self.dispatch(&mut on_frame);
    }

    /// Drop all buffered input.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Unterminated input waiting for its line end.
    pub fn pending_line(&self) -> &str {
        &self.line_buffer
    }

    /// Whether a frame has fields buffered but not yet dispatched.
    pub fn has_pending_frame(&self) -> bool {
        self.event_name.is_some() || !self.data_lines.is_empty()
    }

    fn process_line<F>(&mut self, line: &str, on_frame: &mut F)
    where
        F: FnMut(SseFrame),
    {
        if line.is_empty() {
            self.dispatch(on_frame);
            return;
        }

        // Comment / keep-alive
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_name = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            "id" | "retry" => {}
            other => {
                tracing::trace!(target: "uistream::decoder", field = %other, "ignoring unknown field");
            }
        }
    }

    fn dispatch<F>(&mut self, on_frame: &mut F)
    where
        F: FnMut(SseFrame),
    {
        if !self.has_pending_frame() {
            return;
        }
        let frame = SseFrame {
            event: self.event_name.take(),
            data: std::mem::take(&mut self.data_lines).join("\n"),
        };
        on_frame(frame);
    }
}
