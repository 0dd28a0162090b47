//! [🚀 Datastar] event types.
//!
//! Datastar helps you build reactive web applications with the simplicity
//! of server-side rendering and the power of a full-stack SPA framework.
//!
//! It's the combination of a small js library which makes use of SSE among other utilities,
//! this module implements the event data types sent from the server-side to that library.
//! Each event is a closed [`EventData`] variant, serialized through a generic
//! SSE [`Event`].
//!
//! [🚀 Datastar]: https://data-star.dev/

mod enums;
pub use enums::{ElementPatchMode, EventType};

mod options;
pub use options::{EventOptions, ExecuteScriptOptions, PatchElementsOptions, PatchSignalsOptions};

mod patch_elements;
pub use patch_elements::PatchElements;

mod patch_signals;
pub use patch_signals::PatchSignals;

mod remove_elements;
pub use remove_elements::RemoveElements;

pub mod execute_script;
pub use execute_script::{ExecuteScript, ScriptAttribute, ScriptType};

mod location;
pub use location::Location;

use crate::{
    error::SseError,
    sse::{Event, EventDataWrite},
};

/// Query parameter carrying the signals of a datastar (GET) request.
pub const DATASTAR_KEY: &str = "datastar";

/// Header set by the datastar client on every request it makes.
pub const DATASTAR_REQUEST_HEADER: &str = "datastar-request";

/// A datastar event ready to be serialized.
pub type DatastarEvent<T = String> = Event<EventData<T>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// The closed set of datastar events a server can emit.
pub enum EventData<T = String> {
    /// [`PatchElements`]: patches HTML elements into the DOM
    PatchElements(PatchElements),
    /// [`PatchSignals`]: patches signals into the signal store
    PatchSignals(PatchSignals<T>),
    /// [`RemoveElements`]: removes elements from the DOM
    RemoveElements(RemoveElements),
    /// [`ExecuteScript`]: runs a script in the browser
    ExecuteScript(ExecuteScript),
    /// [`Location`]: navigates the browser
    Location(Location),
}

macro_rules! into_event_data {
    ($($t:ident),+ $(,)?) => {
        $(
            impl<T> From<$t> for EventData<T> {
                fn from(value: $t) -> Self {
                    EventData::$t(value)
                }
            }
        )+
    };
}

into_event_data! {
    PatchElements,
    RemoveElements,
    ExecuteScript,
    Location,
}

impl<T> From<PatchSignals<T>> for EventData<T> {
    fn from(value: PatchSignals<T>) -> Self {
        Self::PatchSignals(value)
    }
}

impl<T> EventData<T> {
    /// Return the [`EventType`] for the current data
    pub fn event_type(&self) -> EventType {
        match self {
            Self::PatchElements(_) => PatchElements::TYPE,
            Self::PatchSignals(_) => PatchSignals::<T>::TYPE,
            Self::RemoveElements(_) => RemoveElements::TYPE,
            Self::ExecuteScript(_) => ExecuteScript::TYPE,
            Self::Location(_) => Location::TYPE,
        }
    }

    /// Consume `self` as a [`DatastarEvent`], applying the shared [`EventOptions`].
    pub fn try_into_datastar_event(
        self,
        options: &EventOptions,
    ) -> Result<DatastarEvent<T>, SseError> {
        let event = Event::new()
            .try_with_event(self.event_type().as_smol_str())?
            .with_data(self);
        options.apply(event)
    }
}

impl<T: EventDataWrite> EventDataWrite for EventData<T> {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        match self {
            Self::PatchElements(patch_elements) => patch_elements.write_data(w),
            Self::PatchSignals(patch_signals) => patch_signals.write_data(w),
            Self::RemoveElements(remove_elements) => remove_elements.write_data(w),
            Self::ExecuteScript(execute_script) => execute_script.write_data(w),
            Self::Location(location) => location.write_data(w),
        }
    }
}
