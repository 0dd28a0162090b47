use super::EventType;
use crate::{
    error::{ErrorContext, SseError},
    sse::EventDataWrite,
};
use smol_str::SmolStr;

/// [`RemoveElements`] sends a selector to the browser to remove elements from the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoveElements {
    /// `selector` is a CSS selector that represents the elements to be removed from the DOM.
    pub selector: SmolStr,
}

impl RemoveElements {
    pub const TYPE: EventType = EventType::RemoveElements;

    /// Create a new [`RemoveElements`] data blob.
    pub fn new(selector: impl Into<SmolStr>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

impl EventDataWrite for RemoveElements {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        if self.selector.trim().is_empty() {
            return Err(SseError::missing_value("RemoveElements: selector"));
        }
        if self.selector.contains(['\n', '\r']) {
            return Err(SseError::invalid_characters(
                "RemoveElements: selector",
                self.selector.clone(),
            ));
        }
        write!(w, "selector {}", self.selector).context("RemoveElements: write selector")
    }
}
