use super::EventType;
use crate::{
    error::{ErrorContext, SseError},
    macros::generate_set_and_with,
    sse::EventDataWrite,
};

/// [`PatchSignals`] patches signals into the signal store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchSignals<T = String> {
    /// `signals` is a JSON object (or a pre-serialized JSON string)
    /// that will be merged into the client's signals.
    pub signals: T,
    /// Whether to merge the signal only if it does not already exist.
    ///
    /// If not provided, the Datastar client side will default to false,
    /// which will cause the data to be merged into the signals.
    pub only_if_missing: bool,
}

impl<T> PatchSignals<T> {
    pub const TYPE: EventType = EventType::PatchSignals;

    /// Create a new [`PatchSignals`] data blob.
    pub fn new(signals: T) -> Self {
        Self {
            signals,
            only_if_missing: false,
        }
    }

    generate_set_and_with! {
        /// Sets whether to merge the signal only if it does not already exist.
        pub fn only_if_missing(mut self, only_if_missing: bool) -> Self {
            self.only_if_missing = only_if_missing;
            self
        }
    }
}

impl<T: EventDataWrite> EventDataWrite for PatchSignals<T> {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        let mut splitter = SignalsWriteSplitter::new(w);
        self.signals.write_data(&mut splitter)?;
        if !splitter.wrote_any {
            return Err(SseError::missing_value("PatchSignals: signals"));
        }

        if self.only_if_missing {
            w.write_all(b"\nonlyIfMissing true")
                .context("PatchSignals: write onlyIfMissing")?;
        }

        Ok(())
    }
}

/// Prefixes every (non-empty) line of the signals document with the `signals ` keyword.
struct SignalsWriteSplitter<'a, W: std::io::Write> {
    inner: &'a mut W,
    at_line_start: bool,
    wrote_any: bool,
}

impl<'a, W: std::io::Write> SignalsWriteSplitter<'a, W> {
    fn new(inner: &'a mut W) -> Self {
        Self {
            inner,
            at_line_start: true,
            wrote_any: false,
        }
    }
}

impl<W: std::io::Write> std::io::Write for SignalsWriteSplitter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for chunk in buf.split_inclusive(|b| matches!(b, b'\n' | b'\r')) {
            let (line, has_break) = match chunk.split_last() {
                Some((b'\n' | b'\r', line)) => (line, true),
                _ => (chunk, false),
            };
            if !line.is_empty() {
                if self.at_line_start {
                    if self.wrote_any {
                        self.inner.write_all(b"\n")?;
                    }
                    self.inner.write_all(b"signals ")?;
                    self.at_line_start = false;
                    self.wrote_any = true;
                }
                self.inner.write_all(line)?;
            }
            if has_break {
                self.at_line_start = true;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
