use super::{ElementPatchMode, EventType};
use crate::{
    error::{ErrorContext, SseError},
    macros::generate_set_and_with,
    sse::{self, EventDataWrite},
};
use smol_str::SmolStr;
use std::borrow::Cow;

/// [`PatchElements`] patches HTML elements into the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchElements {
    /// The elements to be patched into the DOM.
    pub elements: Cow<'static, str>,
    /// The CSS selector used to patch the elements.
    pub selector: Option<SmolStr>,
    /// The mode in which elements are patched into the DOM.
    ///
    /// If not provided the Datastar client side will default to [`ElementPatchMode::Outer`].
    pub mode: ElementPatchMode,
    /// Whether to use view transitions.
    ///
    /// If not provided the Datastar client side will default to `false`.
    pub use_view_transition: bool,
}

impl PatchElements {
    pub const TYPE: EventType = EventType::PatchElements;

    /// Create a new [`PatchElements`] data blob.
    pub fn new(elements: impl Into<Cow<'static, str>>) -> Self {
        Self {
            elements: elements.into(),
            selector: None,
            mode: ElementPatchMode::default(),
            use_view_transition: false,
        }
    }

    generate_set_and_with! {
        /// Set the CSS selector used to patch the elements.
        pub fn selector(mut self, selector: impl Into<SmolStr>) -> Self {
            self.selector = Some(selector.into());
            self
        }
    }

    generate_set_and_with! {
        /// Set mode in which elements are patched into the DOM.
        pub fn mode(mut self, mode: ElementPatchMode) -> Self {
            self.mode = mode;
            self
        }
    }

    generate_set_and_with! {
        /// Sets whether to use view transitions.
        pub fn use_view_transition(mut self, use_view_transition: bool) -> Self {
            self.use_view_transition = use_view_transition;
            self
        }
    }

    pub(super) fn validate(&self) -> Result<(), SseError> {
        if let Some(ref selector) = self.selector {
            if selector.trim().is_empty() {
                return Err(SseError::missing_value("PatchElements: selector"));
            }
            if selector.contains(['\n', '\r']) {
                return Err(SseError::invalid_characters(
                    "PatchElements: selector",
                    selector.clone(),
                ));
            }
        }
        if self.elements.trim().is_empty() {
            if self.mode != ElementPatchMode::Remove {
                return Err(SseError::missing_value("PatchElements: elements"));
            }
            if self.selector.is_none() {
                return Err(SseError::missing_value(
                    "PatchElements: selector (required to remove without elements)",
                ));
            }
        }
        Ok(())
    }
}

impl EventDataWrite for PatchElements {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        self.validate()?;

        let mut sep = "";

        if let Some(selector) = &self.selector {
            write!(w, "selector {selector}").context("PatchElements: write selector")?;
            sep = "\n";
        }

        if self.mode != ElementPatchMode::default() {
            write!(w, "{sep}mode {}", self.mode).context("PatchElements: write mode")?;
            sep = "\n";
        }

        if self.use_view_transition {
            write!(w, "{sep}useViewTransition true")
                .context("PatchElements: write view transition usage")?;
            sep = "\n";
        }

        if !self.elements.trim().is_empty() {
            for element in sse::lines(&self.elements) {
                write!(w, "{sep}elements {element}").context("PatchElements: write elements")?;
                sep = "\n";
            }
        }

        Ok(())
    }
}
