//! Reading the client's datastar signals from an inbound request.

use crate::{datastar::DATASTAR_KEY, transport::SseRequest};
use serde_json::Value;

/// The client's signals: string keys mapped to arbitrary JSON values.
pub type SignalSet = serde_json::Map<String, Value>;

/// Default maximum size of a request body read as signals (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Read the signals sent with the request.
///
/// The [`DATASTAR_KEY`] query parameter is used when present and non-empty,
/// otherwise the raw body is read (at most `body_limit` bytes).
///
/// This never fails: an absent, malformed, oversized or non-object payload
/// results in an empty [`SignalSet`].
pub async fn read_signals<R: SseRequest>(request: &mut R, body_limit: usize) -> SignalSet {
    if let Some(query) = request.query_param(DATASTAR_KEY)
        && !query.is_empty()
    {
        return parse_signals(query.as_bytes());
    }

    match request.read_body(body_limit).await {
        Ok(body) => parse_signals(&body),
        Err(err) => {
            tracing::debug!(%err, "failed to read request body as datastar signals");
            SignalSet::new()
        }
    }
}

/// Parse a JSON document as a [`SignalSet`].
///
/// A JSON array is turned into a map keyed by the element indices.
/// Anything else that is not a JSON object yields an empty set.
pub fn parse_signals(input: &[u8]) -> SignalSet {
    if input.iter().all(u8::is_ascii_whitespace) {
        return SignalSet::new();
    }

    match serde_json::from_slice::<Value>(input) {
        Ok(Value::Object(signals)) => signals,
        Ok(Value::Array(values)) => values
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect(),
        Ok(value) => {
            tracing::debug!(
                "ignore datastar signals: expected JSON object or array, got: {value}"
            );
            SignalSet::new()
        }
        Err(err) => {
            tracing::debug!(%err, "failed to parse datastar signals as JSON");
            SignalSet::new()
        }
    }
}
