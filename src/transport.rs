//! The HTTP collaborator seam of the SSE writer.
//!
//! [`SseRequest`] and [`SseResponse`] abstract the inbound request and the
//! outbound response the [`SseWriter`](crate::SseWriter) is bound to.
//! Implementations are provided for [`http::Request`] and for a
//! channel-backed [`ChannelResponse`] which streams into an
//! [`http::Response`] through [`SseResponseBody`].

use crate::{datastar::DATASTAR_REQUEST_HEADER, error::BoxError};
use bytes::{Buf as _, Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Version};
use http_body::{Body, Frame, SizeHint};
use http_body_util::BodyExt as _;
use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::{mpsc, oneshot};

/// The inbound request side of an SSE exchange.
pub trait SseRequest: Send {
    /// The raw (still percent-encoded) query string, if any.
    fn query(&self) -> Option<&str>;

    /// The negotiated HTTP version, `None` if unknown.
    fn version(&self) -> Option<Version>;

    /// Look up a request header value by (case-insensitive) name.
    fn header(&self, name: &str) -> Option<&str>;

    /// Read the raw request body, failing if it exceeds `limit` bytes.
    ///
    /// A body can only be consumed once: reading it again yields whatever
    /// was left, usually nothing.
    fn read_body(&mut self, limit: usize) -> impl Future<Output = Result<Bytes, BoxError>> + Send;

    /// Look up a decoded query parameter by key.
    fn query_param(&self, key: &str) -> Option<String> {
        let query = self.query()?;
        match serde_html_form::from_str::<Vec<(String, String)>>(query) {
            Ok(params) => params
                .into_iter()
                .find_map(|(k, v)| (k == key).then_some(v)),
            Err(err) => {
                tracing::debug!(%err, "failed to parse request query string");
                None
            }
        }
    }

    /// Returns `true` if the request was made by the datastar client.
    fn is_datastar_request(&self) -> bool {
        self.header(DATASTAR_REQUEST_HEADER).is_some()
    }
}

impl<B> SseRequest for http::Request<B>
where
    B: Body<Data: Send, Error: Into<BoxError>> + Unpin + Send,
{
    fn query(&self) -> Option<&str> {
        self.uri().query()
    }

    fn version(&self) -> Option<Version> {
        Some(http::Request::version(self))
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    async fn read_body(&mut self, limit: usize) -> Result<Bytes, BoxError> {
        let body = self.body_mut();
        let mut buffer = BytesMut::new();
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(Into::into)?;
            if let Ok(mut data) = frame.into_data() {
                let chunk = data.copy_to_bytes(data.remaining());
                if buffer.len() + chunk.len() > limit {
                    return Err(format!("request body exceeds limit of {limit} bytes").into());
                }
                buffer.extend_from_slice(&chunk);
            }
        }
        Ok(buffer.freeze())
    }
}

/// The outbound response side of an SSE exchange.
pub trait SseResponse: Send {
    /// Set a response header.
    ///
    /// Only effective before the first body bytes are written.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Write raw bytes to the open response body.
    ///
    /// Returns an error if the connection is gone.
    fn write(&mut self, data: Bytes) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// An [`SseResponse`] feeding a bounded channel,
/// which is drained by the [`SseResponseBody`] of a [`PendingResponse`].
///
/// Headers are buffered until the first write, at which point the
/// response head is committed and [`PendingResponse::into_response`] resolves.
pub struct ChannelResponse {
    headers: HeaderMap,
    head_tx: Option<oneshot::Sender<HeaderMap>>,
    body_tx: mpsc::Sender<Bytes>,
}

/// Channel capacity used by [`ChannelResponse::with_default_capacity`].
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

impl fmt::Debug for ChannelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelResponse")
            .field("headers", &self.headers)
            .field("committed", &self.head_tx.is_none())
            .finish()
    }
}

impl ChannelResponse {
    /// Create a new [`ChannelResponse`] and the [`PendingResponse`]
    /// which receives its head and body.
    ///
    /// `capacity` is the number of writes buffered before
    /// [`SseResponse::write`] waits for the body to be polled.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                headers: HeaderMap::new(),
                head_tx: Some(head_tx),
                body_tx,
            },
            PendingResponse { head_rx, body_rx },
        )
    }

    /// Same as [`ChannelResponse::new`] using [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn with_default_capacity() -> (Self, PendingResponse) {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Returns `true` once the response head has been committed.
    pub fn is_committed(&self) -> bool {
        self.head_tx.is_none()
    }

    /// The headers buffered (or committed) so far.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl SseResponse for ChannelResponse {
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.is_committed() {
            tracing::trace!(
                header.name = %name,
                "ignore header: response head already committed"
            );
            return;
        }
        self.headers.insert(name, value);
    }

    async fn write(&mut self, data: Bytes) -> Result<(), BoxError> {
        if let Some(head_tx) = self.head_tx.take()
            && head_tx.send(self.headers.clone()).is_err()
        {
            return Err("sse response dropped before head was committed".into());
        }
        self.body_tx
            .send(data)
            .await
            .map_err(|_closed| BoxError::from("sse response body closed by peer"))
    }
}

/// The receiving half of a [`ChannelResponse`].
#[derive(Debug)]
pub struct PendingResponse {
    head_rx: oneshot::Receiver<HeaderMap>,
    body_rx: mpsc::Receiver<Bytes>,
}

impl PendingResponse {
    /// Wait until the response head is committed and return the streaming response.
    ///
    /// Fails if the [`ChannelResponse`] was dropped without ever writing.
    pub async fn into_response(self) -> Result<http::Response<SseResponseBody>, BoxError> {
        let headers = self
            .head_rx
            .await
            .map_err(|_closed| BoxError::from("sse writer dropped before sending headers"))?;
        let mut response = http::Response::new(SseResponseBody {
            body_rx: self.body_rx,
        });
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// A streaming [`Body`] carrying the frames written to a [`ChannelResponse`].
///
/// The body ends once the [`ChannelResponse`] is dropped.
#[derive(Debug)]
pub struct SseResponseBody {
    body_rx: mpsc::Receiver<Bytes>,
}

impl Body for SseResponseBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.get_mut()
            .body_rx
            .poll_recv(cx)
            .map(|data| data.map(|data| Ok(Frame::data(data))))
    }

    fn is_end_stream(&self) -> bool {
        self.body_rx.is_closed() && self.body_rx.is_empty()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};

    #[test]
    fn test_http_request_query_param() {
        let req = http::Request::builder()
            .uri("/feed?page=2&datastar=%7B%22a%22%3A1%7D")
            .header("Datastar-Request", "true")
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(req.query_param("datastar").as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(req.query_param("page").as_deref(), Some("2"));
        assert_eq!(req.query_param("missing"), None);
        assert!(req.is_datastar_request());
    }

    #[tokio::test]
    async fn test_http_request_read_body() {
        let mut req = http::Request::builder()
            .method("POST")
            .uri("/feed")
            .body(Full::new(Bytes::from_static(br#"{"count":1}"#)))
            .unwrap();
        assert!(!req.is_datastar_request());
        assert_eq!(
            req.read_body(1024).await.unwrap(),
            Bytes::from_static(br#"{"count":1}"#)
        );
        // the body can only be consumed once
        assert!(req.read_body(1024).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_http_request_read_body_limit() {
        let mut req = http::Request::new(Full::new(Bytes::from_static(b"0123456789")));
        req.read_body(4).await.unwrap_err();
    }

    #[tokio::test]
    async fn test_channel_response_commits_head_on_first_write() {
        let (mut res, pending) = ChannelResponse::new(4);
        res.set_header(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream"),
        );
        assert!(!res.is_committed());
        res.write(Bytes::from_static(b":\n\n")).await.unwrap();
        assert!(res.is_committed());

        // ignored: head already committed
        res.set_header(
            http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        );
        res.write(Bytes::from_static(b"data: hi\n\n")).await.unwrap();
        drop(res);

        let response = pending.into_response().await.unwrap();
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        assert!(response.headers().get(http::header::CACHE_CONTROL).is_none());

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b":\n\ndata: hi\n\n"));
    }

    #[tokio::test]
    async fn test_channel_response_dropped_without_write() {
        let (res, pending) = ChannelResponse::new(1);
        drop(res);
        pending.into_response().await.unwrap_err();
    }

    #[tokio::test]
    async fn test_channel_response_write_after_body_dropped() {
        let (mut res, pending) = ChannelResponse::new(1);
        res.write(Bytes::from_static(b":\n\n")).await.unwrap();
        drop(pending.into_response().await.unwrap());
        res.write(Bytes::from_static(b"data: x\n\n"))
            .await
            .unwrap_err();
    }
}
