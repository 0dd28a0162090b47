use super::{ElementPatchMode, ScriptAttribute};
use crate::{error::SseError, macros::generate_set_and_with, sse::Event};
use serde::{Deserialize, Deserializer};
use smol_str::SmolStr;
use std::time::Duration;

/// Options shared by every datastar event.
///
/// Deserializes from the protocol's camelCase form,
/// e.g. `{"eventId": "e1", "retryDuration": 2000}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventOptions {
    /// Event id (`id:` line), used by clients to resume a stream.
    pub event_id: Option<SmolStr>,
    /// Reconnection hint (`retry:` line), written in milliseconds.
    #[serde(deserialize_with = "deserialize_millis")]
    pub retry_duration: Option<Duration>,
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

impl EventOptions {
    /// Create a new, empty, [`EventOptions`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    generate_set_and_with! {
        /// Set the event id.
        pub fn event_id(mut self, id: impl Into<SmolStr>) -> Self {
            self.event_id = Some(id.into());
            self
        }
    }

    generate_set_and_with! {
        /// Set the retry duration.
        pub fn retry_duration(mut self, retry: Duration) -> Self {
            self.retry_duration = Some(retry);
            self
        }
    }

    pub(crate) fn apply<T>(&self, mut event: Event<T>) -> Result<Event<T>, SseError> {
        if let Some(ref id) = self.event_id {
            event.try_set_id(id.clone())?;
        }
        if let Some(retry) = self.retry_duration {
            event.set_retry(retry);
        }
        Ok(event)
    }
}

macro_rules! event_option_setters {
    () => {
        generate_set_and_with! {
            /// Set the event id.
            pub fn event_id(mut self, id: impl Into<SmolStr>) -> Self {
                self.event.event_id = Some(id.into());
                self
            }
        }

        generate_set_and_with! {
            /// Set the retry duration.
            pub fn retry_duration(mut self, retry: Duration) -> Self {
                self.event.retry_duration = Some(retry);
                self
            }
        }
    };
}

/// Options for [`SseWriter::patch_elements`](crate::SseWriter::patch_elements).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatchElementsOptions {
    /// CSS selector of the target element(s).
    ///
    /// Without a selector the client targets elements by their id.
    pub selector: Option<SmolStr>,
    /// How the elements are merged into the DOM, [`ElementPatchMode::Outer`] by default.
    pub mode: ElementPatchMode,
    /// Whether the client wraps the patch in a view transition.
    pub use_view_transition: bool,
    /// Options shared by all events.
    #[serde(flatten)]
    pub event: EventOptions,
}

impl PatchElementsOptions {
    /// Create new default [`PatchElementsOptions`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    generate_set_and_with! {
        /// Set the CSS selector of the target element(s).
        pub fn selector(mut self, selector: impl Into<SmolStr>) -> Self {
            self.selector = Some(selector.into());
            self
        }
    }

    generate_set_and_with! {
        /// Set the [`ElementPatchMode`].
        pub fn mode(mut self, mode: ElementPatchMode) -> Self {
            self.mode = mode;
            self
        }
    }

    generate_set_and_with! {
        /// Set the [`ElementPatchMode`] from its protocol value,
        /// failing for unknown modes.
        pub fn mode(mut self, mode: &str) -> Result<Self, SseError> {
            self.mode = mode.parse()?;
            Ok(self)
        }
    }

    generate_set_and_with! {
        /// Set whether to use view transitions.
        pub fn use_view_transition(mut self, use_view_transition: bool) -> Self {
            self.use_view_transition = use_view_transition;
            self
        }
    }

    event_option_setters!();
}

/// Options for [`SseWriter::patch_signals`](crate::SseWriter::patch_signals).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatchSignalsOptions {
    /// Only patch signals which do not exist yet on the client.
    pub only_if_missing: bool,
    /// Options shared by all events.
    #[serde(flatten)]
    pub event: EventOptions,
}

impl PatchSignalsOptions {
    /// Create new default [`PatchSignalsOptions`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    generate_set_and_with! {
        /// Set whether signals are only patched when missing on the client.
        pub fn only_if_missing(mut self, only_if_missing: bool) -> Self {
            self.only_if_missing = only_if_missing;
            self
        }
    }

    event_option_setters!();
}

/// Options for [`SseWriter::execute_script`](crate::SseWriter::execute_script).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecuteScriptOptions {
    /// Whether the client removes the script element after running it.
    ///
    /// The client defaults to `true`.
    pub auto_remove: Option<bool>,
    /// Attributes of the script element.
    #[serde(skip)]
    pub attributes: Vec<ScriptAttribute>,
    /// Options shared by all events.
    #[serde(flatten)]
    pub event: EventOptions,
}

impl ExecuteScriptOptions {
    /// Create new default [`ExecuteScriptOptions`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    generate_set_and_with! {
        /// Set whether the script is removed after execution.
        pub fn auto_remove(mut self, auto_remove: bool) -> Self {
            self.auto_remove = Some(auto_remove);
            self
        }
    }

    generate_set_and_with! {
        /// Add an attribute to the script element.
        pub fn attribute(mut self, attribute: ScriptAttribute) -> Self {
            self.attributes.push(attribute);
            self
        }
    }

    generate_set_and_with! {
        /// Add multiple attributes to the script element.
        pub fn attributes(mut self, attributes: impl IntoIterator<Item = ScriptAttribute>) -> Self {
            self.attributes.extend(attributes);
            self
        }
    }

    event_option_setters!();
}
