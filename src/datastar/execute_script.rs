//! Datastar script execution event and its script element attributes.

use super::EventType;
use crate::{
    error::{ErrorContext, SseError},
    macros::{enum_builder, generate_set_and_with},
    sse::{self, EventDataWrite},
};
use mime::Mime;
use smol_str::SmolStr;
use std::borrow::Cow;

/// [`ExecuteScript`] executes JavaScript in the browser
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecuteScript {
    /// `script` is the JavaScript to be executed by the browser.
    pub script: Cow<'static, str>,
    /// Whether to remove the script after execution.
    ///
    /// If not provided the Datastar client side will default to `true`.
    pub auto_remove: Option<bool>,
    /// A list of attributes to add to the script element.
    ///
    /// If empty the Datastar client side will default to `type module`.
    pub attributes: Vec<ScriptAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Valid attributes for scripts that can be attached to a [`ExecuteScript`].
pub enum ScriptAttribute {
    /// Any valid URL or relative path to a .js file.
    ///
    /// If omitted, the script content is inline.
    Src(String),
    /// Type of script.
    Type(ScriptType),
    /// Script is fetched and executed as soon as possible (non-blocking).
    Async,
    /// Script is fetched asynchronously but executed after HTML parsing completes.
    Defer,
    /// Used to deliver fallback scripts to older browsers.
    NoModule,
    /// A valid SRI hash.
    ///
    /// Cfr: <https://developer.mozilla.org/en-US/docs/Web/Security/Subresource_Integrity>
    Integrity(String),
    /// CORS request
    CrossOrigin(CrossOriginKind),
    /// Controls what Referer is sent when fetching the script.
    ReferrerPolicy(ReferrerPolicy),
    /// Largely ignored by modern browsers; use UTF-8 everywhere.
    Charset(SmolStr),
    /// Any other custom script attribute
    Custom { key: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
/// Possible values for [`ScriptAttribute::Type`].
pub enum ScriptType {
    #[default]
    /// ES Modules, enables top-level import/export.
    Module,
    /// Only for import maps (not script logic).
    ImportMap,
    /// [`mime::TEXT_JAVASCRIPT`] is the default for scripts,
    /// but [`ScriptType::Module`] is the default value in a datastar context.
    Mime(Mime),
}

enum_builder! {
    /// Possible values for [`ScriptAttribute::CrossOrigin`].
    pub enum CrossOriginKind {
        /// No credentials (cookies, headers).
        Anonymous => "anonymous",
        /// Include credentials.
        UseCredentials => "use-credentials",
    }
}

enum_builder! {
    /// Possible values for [`ScriptAttribute::ReferrerPolicy`].
    pub enum ReferrerPolicy {
        NoReferrer => "no-referrer",
        NoReferrerWhenDowngrade => "no-referrer-when-downgrade",
        Origin => "origin",
        OriginWhenCrossOrigin => "origin-when-cross-origin",
        SameOrigin => "same-origin",
        StrictOrigin => "strict-origin",
        StrictOriginWhenCrossOrigin => "strict-origin-when-cross-origin",
        UnsafeUrl => "unsafe-url",
    }
}

impl ScriptAttribute {
    fn key(&self) -> &str {
        match self {
            Self::Src(_) => "src",
            Self::Type(_) => "type",
            Self::Async => "async",
            Self::Defer => "defer",
            Self::NoModule => "nomodule",
            Self::Integrity(_) => "integrity",
            Self::CrossOrigin(_) => "crossorigin",
            Self::ReferrerPolicy(_) => "referrerpolicy",
            Self::Charset(_) => "charset",
            Self::Custom { key, .. } => key.as_str(),
        }
    }

    fn value(&self) -> &str {
        match self {
            Self::Src(value) | Self::Integrity(value) => value.as_str(),
            Self::Type(ScriptType::Module) => "module",
            Self::Type(ScriptType::ImportMap) => "importmap",
            Self::Type(ScriptType::Mime(mime)) => mime.as_ref(),
            Self::Async | Self::Defer | Self::NoModule | Self::Custom { value: None, .. } => {
                "true"
            }
            Self::CrossOrigin(kind) => kind.as_str(),
            Self::ReferrerPolicy(policy) => policy.as_str(),
            Self::Charset(charset) => charset.as_str(),
            Self::Custom {
                value: Some(value), ..
            } => value.as_str(),
        }
    }

    fn is_default(&self) -> bool {
        matches!(self, Self::Type(ScriptType::Module))
    }
}

impl ExecuteScript {
    pub const TYPE: EventType = EventType::ExecuteScript;

    /// Create a new [`ExecuteScript`] data blob.
    pub fn new(script: impl Into<Cow<'static, str>>) -> Self {
        Self {
            script: script.into(),
            auto_remove: None,
            attributes: Vec::new(),
        }
    }

    generate_set_and_with! {
        /// Set whether to remove the script after execution.
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
        /// Set the list of attributes to add to the script element,
        /// replacing any previously added attributes.
        pub fn attributes(mut self, attributes: impl IntoIterator<Item = ScriptAttribute>) -> Self {
            self.attributes = attributes.into_iter().collect();
            self
        }
    }
}

impl EventDataWrite for ExecuteScript {
    fn write_data(&self, w: &mut impl std::io::Write) -> Result<(), SseError> {
        if self.script.trim().is_empty() {
            return Err(SseError::missing_value("ExecuteScript: script"));
        }

        let mut sep = "";

        if self.auto_remove == Some(false) {
            w.write_all(b"autoRemove false")
                .context("ExecuteScript: write autoRemove")?;
            sep = "\n";
        }

        if !(self.attributes.len() == 1 && self.attributes[0].is_default()) {
            for attribute in &self.attributes {
                let key = attribute.key();
                let value = attribute.value();
                if key.is_empty() || key.contains(char::is_whitespace) {
                    return Err(SseError::invalid_characters(
                        "ExecuteScript: attribute key",
                        key,
                    ));
                }
                if value.contains(['\n', '\r']) {
                    return Err(SseError::invalid_characters(
                        "ExecuteScript: attribute value",
                        value,
                    ));
                }
                write!(w, "{sep}attributes {key} {value}")
                    .context("ExecuteScript: write attribute")?;
                sep = "\n";
            }
        }

        for line in sse::lines(&self.script) {
            write!(w, "{sep}script {line}").context("ExecuteScript: write script line")?;
            sep = "\n";
        }

        Ok(())
    }
}
