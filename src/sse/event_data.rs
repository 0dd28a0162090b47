use crate::error::{ErrorContext, SseError};
use std::borrow::Cow;

/// Data that can be written as the `data:` part of an [`Event`](super::Event).
///
/// Newlines written by an implementation start a new `data:` line.
pub trait EventDataWrite {
    /// Write the data to the given writer.
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError>;
}

impl EventDataWrite for str {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        w.write_all(self.as_bytes()).context("write str data")
    }
}

impl EventDataWrite for String {
    #[inline]
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        self.as_str().write_data(w)
    }
}

impl EventDataWrite for Cow<'_, str> {
    #[inline]
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        self.as_ref().write_data(w)
    }
}

impl<T: EventDataWrite + ?Sized> EventDataWrite for &T {
    #[inline]
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        (**self).write_data(w)
    }
}

impl EventDataWrite for serde_json::Map<String, serde_json::Value> {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        serde_json::to_writer(w, self).context("write json object data")
    }
}

impl EventDataWrite for serde_json::Value {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        serde_json::to_writer(w, self).context("write json value data")
    }
}

/// Wrapper to write any [`serde::Serialize`] value as compact JSON event data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonEventData<T>(pub T);

impl<T: serde::Serialize> EventDataWrite for JsonEventData<T> {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        serde_json::to_writer(w, &self.0).context("write json event data")
    }
}
