use super::EventType;
use crate::{
    error::{ErrorContext, SseError},
    sse::EventDataWrite,
};
use smol_str::SmolStr;

/// [`Location`] instructs the browser to navigate to another URI.
///
/// The URI can be absolute (`https://example.com/next`) or
/// relative to the current document (`/dashboard`, `?page=2`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// The URI the browser navigates to.
    pub uri: SmolStr,
}

impl Location {
    pub const TYPE: EventType = EventType::Location;

    /// Create a new [`Location`] data blob.
    pub fn new(uri: impl Into<SmolStr>) -> Self {
        Self { uri: uri.into() }
    }
}

impl EventDataWrite for Location {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(SseError::missing_value("Location: uri"));
        }
        if uri.contains(['\n', '\r']) {
            return Err(SseError::invalid_characters("Location: uri", uri));
        }
        write!(w, "uri {uri}").context("Location: write uri")
    }
}
