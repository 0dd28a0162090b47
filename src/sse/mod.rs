//! SSE support
//!
//! Generic server-sent event frames and the trait used to
//! write event data into them. The datastar events found in
//! [`crate::datastar`] are serialized through these types.

mod event;
mod event_data;

#[doc(inline)]
pub use {
    event::Event,
    event_data::{EventDataWrite, JsonEventData},
};

/// Comment frame written once when a stream is opened,
/// before any real event, so clients and proxies see the stream
/// established right away.
pub const STREAM_OPEN_FRAME: &[u8] = b":\n\n";

/// Split text on LF, CRLF and lone CR line breaks.
///
/// Like [`str::lines`], a trailing line break does not yield an empty last line.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest.take().filter(|s| !s.is_empty())?;
        let bytes = current.as_bytes();
        match memchr::memchr2(b'\n', b'\r', bytes) {
            Some(index) => {
                let next = match (bytes[index], bytes.get(index + 1)) {
                    (b'\r', Some(b'\n')) => index + 2,
                    _ => index + 1,
                };
                rest = Some(&current[next..]);
                Some(&current[..index])
            }
            None => Some(current),
        }
    })
}
