//! [🚀 Datastar] server-sent event emission
//!
//! Bind an [`SseWriter`] to an inbound request and an outbound response
//! to read the client's signals and stream datastar events back:
//! element patches, signal patches, element removals, script executions
//! and browser navigations.
//!
//! The writer negotiates the SSE response headers on its first emission
//! and returns the exact bytes of every frame it writes.
//! The HTTP collaborators are abstracted by the traits of the [`transport`]
//! module, with ready-made implementations for [`http::Request`] and a
//! channel-backed streaming [`http::Response`].
//!
//! ```
//! use rama_datastar::{
//!     SseWriter,
//!     datastar::PatchElementsOptions,
//!     transport::ChannelResponse,
//! };
//! # async fn handle(request: http::Request<http_body_util::Empty<bytes::Bytes>>) -> Result<(), rama_datastar::SseError> {
//! let (response, _pending) = ChannelResponse::with_default_capacity();
//! let mut sse = SseWriter::new(request, response);
//!
//! let signals = sse.read_signals().await;
//! let count = signals.get("count").and_then(|v| v.as_u64()).unwrap_or_default();
//!
//! sse.patch_elements(
//!     format!(r#"<span id="count">{count}</span>"#),
//!     PatchElementsOptions::new(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [🚀 Datastar]: https://data-star.dev/

#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]

mod macros;

mod error;
pub use error::{BoxError, ErrorKind, SseError};

pub mod datastar;
pub mod sse;
pub mod transport;

mod signals;
pub use signals::{DEFAULT_BODY_LIMIT, SignalSet, parse_signals, read_signals};

mod writer;
pub use writer::SseWriter;

pub mod dep {
    //! Dependencies for rama datastar modules.
    //!
    //! Exported for your convenience.

    pub mod bytes {
        //! Re-export of the [`bytes`](https://docs.rs/bytes) crate.
        #[doc(inline)]
        pub use bytes::*;
    }

    pub mod http {
        //! Re-export of the [`http`](https://docs.rs/http) crate.
        #[doc(inline)]
        pub use http::*;
    }

    pub mod mime {
        //! Re-export of the [`mime`](https://docs.rs/mime) crate.
        #[doc(inline)]
        pub use mime::*;
    }

    pub mod serde_json {
        //! Re-export of the [`serde_json`](https://docs.rs/serde_json) crate.
        #[doc(inline)]
        pub use serde_json::*;
    }
}
