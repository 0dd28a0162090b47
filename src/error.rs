//! Error types for rama-datastar.

use smol_str::SmolStr;
use std::{error::Error as StdError, fmt};

/// Alias for a type-erased error type.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Error returned by the SSE writer and the datastar event builders.
///
/// Validation failures are raised before anything is written to the
/// transport. Transport failures mean the stream is no longer usable.
pub struct SseError {
    kind: SseErrorKind,
}

/// The category of an [`SseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An input value was rejected: an unknown enumeration value,
    /// a value containing forbidden characters or a missing required value.
    InvalidValue,
    /// An event payload could not be serialized.
    Serialize,
    /// Writing to the response transport failed, or the stream
    /// already failed before.
    Transport,
}

enum SseErrorKind {
    InvalidEnumValue {
        ty: &'static str,
        value: SmolStr,
    },
    InvalidCharacter {
        field: &'static str,
        value: SmolStr,
    },
    MissingValue(&'static str),
    Serialize {
        context: &'static str,
        source: BoxError,
    },
    Transport(BoxError),
    StreamClosed,
}

impl SseError {
    pub(crate) fn invalid_enum_value(ty: &'static str, value: impl Into<SmolStr>) -> Self {
        Self {
            kind: SseErrorKind::InvalidEnumValue {
                ty,
                value: value.into(),
            },
        }
    }

    pub(crate) fn invalid_characters(field: &'static str, value: impl Into<SmolStr>) -> Self {
        Self {
            kind: SseErrorKind::InvalidCharacter {
                field,
                value: value.into(),
            },
        }
    }

    pub(crate) fn missing_value(field: &'static str) -> Self {
        Self {
            kind: SseErrorKind::MissingValue(field),
        }
    }

    pub(crate) fn serialize(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self {
            kind: SseErrorKind::Serialize {
                context,
                source: source.into(),
            },
        }
    }

    pub(crate) fn transport(source: impl Into<BoxError>) -> Self {
        Self {
            kind: SseErrorKind::Transport(source.into()),
        }
    }

    pub(crate) fn stream_closed() -> Self {
        Self {
            kind: SseErrorKind::StreamClosed,
        }
    }

    /// Return the [`ErrorKind`] of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.kind {
            SseErrorKind::InvalidEnumValue { .. }
            | SseErrorKind::InvalidCharacter { .. }
            | SseErrorKind::MissingValue(_) => ErrorKind::InvalidValue,
            SseErrorKind::Serialize { .. } => ErrorKind::Serialize,
            SseErrorKind::Transport(_) | SseErrorKind::StreamClosed => ErrorKind::Transport,
        }
    }

    /// Returns `true` if the input was rejected before any I/O happened.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::InvalidValue
    }

    /// Returns `true` if the response transport failed.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

impl fmt::Debug for SseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SseErrorKind::InvalidEnumValue { ty, value } => f
                .debug_struct("InvalidEnumValue")
                .field("ty", ty)
                .field("value", value)
                .finish(),
            SseErrorKind::InvalidCharacter { field, value } => f
                .debug_struct("InvalidCharacter")
                .field("field", field)
                .field("value", value)
                .finish(),
            SseErrorKind::MissingValue(field) => {
                f.debug_tuple("MissingValue").field(field).finish()
            }
            SseErrorKind::Serialize { context, source } => f
                .debug_struct("Serialize")
                .field("context", context)
                .field("source", source)
                .finish(),
            SseErrorKind::Transport(source) => f.debug_tuple("Transport").field(source).finish(),
            SseErrorKind::StreamClosed => f.write_str("StreamClosed"),
        }
    }
}

impl fmt::Display for SseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SseErrorKind::InvalidEnumValue { ty, value } => {
                write!(f, "invalid enumeration value for {ty}: {value:?}")
            }
            SseErrorKind::InvalidCharacter { field, value } => {
                write!(f, "invalid character(s) in {field}: {value:?}")
            }
            SseErrorKind::MissingValue(field) => write!(f, "missing value: {field}"),
            SseErrorKind::Serialize { context, source } => {
                write!(f, "serialize error: {context}: {source}")
            }
            SseErrorKind::Transport(source) => write!(f, "transport error: {source}"),
            SseErrorKind::StreamClosed => {
                f.write_str("transport error: sse stream is closed after an earlier failure")
            }
        }
    }
}

impl StdError for SseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            SseErrorKind::Serialize { source, .. } | SseErrorKind::Transport(source) => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}

/// Attach a static context to a fallible serialization step.
pub(crate) trait ErrorContext<T> {
    fn context(self, context: &'static str) -> Result<T, SseError>;
}

impl<T, E: Into<BoxError>> ErrorContext<T> for Result<T, E> {
    fn context(self, context: &'static str) -> Result<T, SseError> {
        self.map_err(|err| SseError::serialize(context, err))
    }
}
