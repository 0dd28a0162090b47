use crate::macros::enum_builder;

enum_builder! {
    #[derive(Default)]
    /// The mode in which elements are patched into the DOM.
    pub enum ElementPatchMode {
        #[default]
        /// Morph entire element, preserving state
        Outer => "outer",
        /// Morph inner HTML only, preserving state
        Inner => "inner",
        /// Remove target element from DOM
        Remove => "remove",
        /// Replace entire element, reset state
        Replace => "replace",
        /// Insert at beginning inside target
        Prepend => "prepend",
        /// Insert at end inside target
        Append => "append",
        /// Insert before target element
        Before => "before",
        /// Insert after target element
        After => "after",
    }
}

enum_builder! {
    /// The event types of the protocol on top of SSE which allows for
    /// push based communication between the server and the client.
    pub enum EventType {
        /// Patches HTML elements into the DOM
        PatchElements => "patch-elements",
        /// Patches signals into the signal store
        PatchSignals => "patch-signals",
        /// Removes elements from the DOM
        RemoveElements => "remove-elements",
        /// Executes a script in the browser
        ExecuteScript => "execute-script",
        /// Navigates the browser to another location
        Location => "location",
    }
}
