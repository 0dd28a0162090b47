use bytes::{BufMut as _, Bytes, BytesMut};
use smol_str::SmolStr;
use std::time::Duration;

use super::EventDataWrite;
use crate::{error::SseError, macros::generate_set_and_with};

/// Server-sent event
///
/// Serialized as (in this order): comment lines, `event:`, `id:`, `retry:`,
/// the `data:` lines and a terminating blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<T = String> {
    event: Option<SmolStr>,
    id: Option<SmolStr>,
    retry: Option<Duration>,
    data: Option<T>,
    comments: Option<Vec<SmolStr>>,
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Event<T> {
    /// Create a new [`Event`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            event: None,
            id: None,
            retry: None,
            data: None,
            comments: None,
        }
    }

    /// Return the event's name field (`event: <event-name>`).
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    generate_set_and_with! {
        /// Set the event's name field (`event: <event-name>`).
        ///
        /// Previously set event will be overwritten.
        pub fn event(mut self, event: impl Into<SmolStr>) -> Result<Self, SseError> {
            let event = event.into();
            if event.contains(['\n', '\r']) {
                return Err(SseError::invalid_characters("event type", event));
            }
            self.event = Some(event);
            Ok(self)
        }
    }

    /// Return the event's identifier field (`id: <identifier>`).
    ///
    /// This corresponds to [`MessageEvent`'s `lastEventId` field].
    ///
    /// [`MessageEvent`'s `lastEventId` field]: https://developer.mozilla.org/en-US/docs/Web/API/MessageEvent/lastEventId
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    generate_set_and_with! {
        /// Set the event's identifier field (`id: <identifier>`).
        ///
        /// Previously set value will be overwritten.
        pub fn id(mut self, id: impl Into<SmolStr>) -> Result<Self, SseError> {
            let id = id.into();
            if id.contains(['\n', '\r', '\0']) {
                return Err(SseError::invalid_characters("event id", id));
            }
            self.id = Some(id);
            Ok(self)
        }
    }

    /// Return the event's retry timeout field (`retry: <timeout>`).
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    generate_set_and_with! {
        /// Set the event's retry timeout field (`retry: <timeout>`).
        ///
        /// This sets how long clients will wait before reconnecting if they are disconnected from the
        /// SSE endpoint. Note that this is just a hint: clients are free to wait for longer if they
        /// wish, such as if they implement exponential backoff.
        pub fn retry(mut self, retry: Duration) -> Self {
            self.retry = Some(retry);
            self
        }
    }

    /// Return the event's data field(s) (`data: <content>`).
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consume `self` and return the event's data.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    generate_set_and_with! {
        /// Set the event's data field(s) (`data: <content>`).
        ///
        /// The serialized data will automatically break newlines across `data: ` fields.
        pub fn data(mut self, data: T) -> Self {
            self.data = Some(data);
            self
        }
    }

    /// Return the event's comment fields (`: <comment-text>`).
    pub fn comment(&self) -> impl Iterator<Item = &str> {
        self.comments.iter().flatten().map(SmolStr::as_str)
    }

    generate_set_and_with! {
        /// Add a comment field (`: <comment-text>`).
        ///
        /// Unlike the other setters this one does not overwrite.
        pub fn comment(mut self, comment: impl Into<SmolStr>) -> Result<Self, SseError> {
            let comment = comment.into();
            if comment.contains(['\n', '\r']) {
                return Err(SseError::invalid_characters("comment", comment));
            }
            self.comments.get_or_insert_default().push(comment);
            Ok(self)
        }
    }
}

impl<T: EventDataWrite> Event<T> {
    /// Serialize this event into its SSE wire form.
    ///
    /// The output is deterministic: identical events produce identical bytes.
    pub fn serialize(&self) -> Result<Bytes, SseError> {
        let mut buffer = BytesMut::new();

        let mut serialize = |name: &[u8], value: &[u8]| {
            buffer.extend_from_slice(name);
            buffer.put_u8(b':');
            if !value.is_empty() {
                buffer.put_u8(b' ');
                buffer.extend_from_slice(value);
            }
            buffer.put_u8(b'\n');
        };

        for comment in self.comments.iter().flatten() {
            serialize(b"", comment.as_bytes());
        }

        if let Some(ref event) = self.event {
            serialize(b"event", event.as_bytes());
        }

        if let Some(ref id) = self.id {
            serialize(b"id", id.as_bytes());
        }

        if let Some(retry) = self.retry {
            let mut buf = itoa::Buffer::new();
            serialize(b"retry", buf.format(retry.as_millis()).as_bytes());
        }

        let mut buffer = match &self.data {
            Some(data) => {
                buffer.extend_from_slice(b"data: ");

                let mut buf_write = buffer.writer();
                data.write_data(&mut DataWriteSplitter::new(&mut buf_write))?;
                let mut buffer = buf_write.into_inner();
                buffer.put_u8(b'\n');
                buffer
            }
            None => buffer,
        };

        if !buffer.is_empty() {
            buffer.put_u8(b'\n');
        }

        Ok(buffer.freeze())
    }
}

/// Turns every line break (LF, CR or CRLF) into a new `data: ` line.
struct DataWriteSplitter<'a, W: std::io::Write> {
    inner: &'a mut W,
    pending_cr: bool,
}

impl<'a, W: std::io::Write> DataWriteSplitter<'a, W> {
    fn new(inner: &'a mut W) -> Self {
        Self {
            inner,
            pending_cr: false,
        }
    }
}

impl<W: std::io::Write> std::io::Write for DataWriteSplitter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut last_split = 0;
        for delimiter in memchr::memchr2_iter(b'\n', b'\r', buf) {
            if self.pending_cr && buf[delimiter] == b'\n' && delimiter == last_split {
                // second half of a CRLF pair
                self.pending_cr = false;
                last_split = delimiter + 1;
                continue;
            }
            self.inner.write_all(&buf[last_split..delimiter])?;
            self.inner.write_all(b"\ndata: ")?;
            self.pending_cr = buf[delimiter] == b'\r';
            last_split = delimiter + 1;
        }
        if last_split < buf.len() {
            self.inner.write_all(&buf[last_split..])?;
            self.pending_cr = false;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
