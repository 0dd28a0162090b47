use crate::{
    datastar::{
        EventData, EventOptions, ExecuteScript, ExecuteScriptOptions, Location, PatchElements,
        PatchElementsOptions, PatchSignals, PatchSignalsOptions, RemoveElements,
    },
    error::SseError,
    macros::generate_set_and_with,
    signals::{DEFAULT_BODY_LIMIT, SignalSet, read_signals},
    sse::{Event, EventDataWrite, STREAM_OPEN_FRAME},
    transport::{SseRequest, SseResponse},
};
use bytes::Bytes;
use http::{
    HeaderName, HeaderValue, Version,
    header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
};
use smol_str::SmolStr;
use std::borrow::Cow;

static X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Writer of a single datastar SSE stream, bound to one request/response exchange.
///
/// The response headers and an initial comment frame are sent once, on the first
/// emission (or an explicit [`SseWriter::send_headers`]). Every emission returns the
/// exact bytes it wrote.
///
/// A writer is not meant to be shared: callers emitting from multiple tasks
/// must serialize access themselves (e.g. by owning the writer in a single task).
/// Once a write to the transport fails the writer is closed and all further
/// emissions fail with a transport error.
#[derive(Debug)]
pub struct SseWriter<Req, Res> {
    request: Req,
    response: Res,
    headers_sent: bool,
    closed: bool,
    body_limit: usize,
    signals: Option<SignalSet>,
}

impl<Req, Res> SseWriter<Req, Res> {
    /// Create a new [`SseWriter`] owning the given request and response.
    pub fn new(request: Req, response: Res) -> Self {
        Self {
            request,
            response,
            headers_sent: false,
            closed: false,
            body_limit: DEFAULT_BODY_LIMIT,
            signals: None,
        }
    }

    generate_set_and_with! {
        /// Set the maximum number of body bytes read as signals.
        ///
        /// Defaults to [`DEFAULT_BODY_LIMIT`].
        pub fn body_limit(mut self, limit: usize) -> Self {
            self.body_limit = limit;
            self
        }
    }

    /// Returns `true` once the headers and initial frame were sent.
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Returns `true` if an earlier transport failure closed this stream.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reference to the request this writer is bound to.
    pub fn request(&self) -> &Req {
        &self.request
    }

    /// Reference to the response this writer is bound to.
    pub fn response(&self) -> &Res {
        &self.response
    }

    /// Consume the writer, returning the request and response.
    ///
    /// Dropping the response is what ends the stream for most transports.
    pub fn into_parts(self) -> (Req, Res) {
        (self.request, self.response)
    }
}

impl<Req: SseRequest, Res: SseResponse> SseWriter<Req, Res> {
    /// Returns the signals sent with the request.
    ///
    /// The request is read only once, later calls return the cached result.
    /// See [`read_signals`] for the parsing rules.
    pub async fn read_signals(&mut self) -> SignalSet {
        if let Some(ref signals) = self.signals {
            return signals.clone();
        }
        let signals = read_signals(&mut self.request, self.body_limit).await;
        self.signals = Some(signals.clone());
        signals
    }

    /// Set the SSE response headers and open the stream, if not already done.
    ///
    /// `Connection: keep-alive` is only set for HTTP/1.1 requests, as
    /// connection-specific headers are not allowed in HTTP/2 and above.
    pub async fn send_headers(&mut self) -> Result<(), SseError> {
        if self.headers_sent {
            return Ok(());
        }
        if self.closed {
            return Err(SseError::stream_closed());
        }

        self.response
            .set_header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        self.response
            .set_header(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        // disable proxy buffering (nginx)
        self.response
            .set_header(X_ACCEL_BUFFERING.clone(), HeaderValue::from_static("no"));
        if self.request.version() == Some(Version::HTTP_11) {
            self.response
                .set_header(CONNECTION, HeaderValue::from_static("keep-alive"));
        }

        self.write(Bytes::from_static(STREAM_OPEN_FRAME)).await?;
        self.headers_sent = true;
        tracing::trace!(
            http.version = ?self.request.version(),
            "datastar sse stream opened"
        );
        Ok(())
    }

    /// Patch HTML elements into the DOM.
    pub async fn patch_elements(
        &mut self,
        elements: impl Into<Cow<'static, str>>,
        options: PatchElementsOptions,
    ) -> Result<Bytes, SseError> {
        let PatchElementsOptions {
            selector,
            mode,
            use_view_transition,
            event,
        } = options;
        let data = PatchElements {
            elements: elements.into(),
            selector,
            mode,
            use_view_transition,
        };
        self.send_event::<String>(data.into(), &event).await
    }

    /// Patch signals into the client's signal store.
    ///
    /// `signals` is typically a [`SignalSet`], a pre-serialized JSON string
    /// or any serde value wrapped in [`JsonEventData`](crate::sse::JsonEventData).
    pub async fn patch_signals<T: EventDataWrite>(
        &mut self,
        signals: T,
        options: PatchSignalsOptions,
    ) -> Result<Bytes, SseError> {
        let data = PatchSignals::new(signals).with_only_if_missing(options.only_if_missing);
        self.send_event(data.into(), &options.event).await
    }

    /// Remove the elements matching the CSS selector from the DOM.
    pub async fn remove_elements(
        &mut self,
        selector: impl Into<SmolStr>,
        options: EventOptions,
    ) -> Result<Bytes, SseError> {
        self.send_event::<String>(RemoveElements::new(selector).into(), &options)
            .await
    }

    /// Execute a script in the browser.
    pub async fn execute_script(
        &mut self,
        script: impl Into<Cow<'static, str>>,
        options: ExecuteScriptOptions,
    ) -> Result<Bytes, SseError> {
        let ExecuteScriptOptions {
            auto_remove,
            attributes,
            event,
        } = options;
        let data = ExecuteScript {
            script: script.into(),
            auto_remove,
            attributes,
        };
        self.send_event::<String>(data.into(), &event).await
    }

    /// Navigate the browser to the given (absolute or relative) URI.
    pub async fn location(
        &mut self,
        uri: impl Into<SmolStr>,
        options: EventOptions,
    ) -> Result<Bytes, SseError> {
        self.send_event::<String>(Location::new(uri).into(), &options)
            .await
    }

    /// Send a comment frame, ignored by clients.
    ///
    /// Useful as a keep-alive ping scheduled by the caller.
    pub async fn comment(&mut self, text: impl Into<SmolStr>) -> Result<Bytes, SseError> {
        let output = Event::<String>::new().try_with_comment(text)?.serialize()?;
        self.send_headers().await?;
        self.write(output.clone()).await?;
        Ok(output)
    }

    async fn send_event<T: EventDataWrite>(
        &mut self,
        data: EventData<T>,
        options: &EventOptions,
    ) -> Result<Bytes, SseError> {
        let event_type = data.event_type();
        // serialize first: invalid input never reaches the transport
        let output = data.try_into_datastar_event(options)?.serialize()?;

        self.send_headers().await?;
        self.write(output.clone()).await?;

        tracing::trace!(
            event.type = %event_type,
            event.bytes = output.len(),
            "datastar event written"
        );
        Ok(output)
    }

    async fn write(&mut self, data: Bytes) -> Result<(), SseError> {
        if self.closed {
            return Err(SseError::stream_closed());
        }
        if let Err(err) = self.response.write(data).await {
            tracing::debug!(%err, "sse transport write failed: closing stream");
            self.closed = true;
            return Err(SseError::transport(err));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        datastar::{ElementPatchMode, ScriptAttribute},
        error::BoxError,
        sse::JsonEventData,
    };
    use serde_json::json;
    use std::time::Duration;
    use tracing_test::traced_test;

    #[derive(Debug, Default)]
    struct MockRequest {
        version: Option<Version>,
        query: Option<&'static str>,
        body: Option<Bytes>,
        body_reads: usize,
    }

    impl SseRequest for MockRequest {
        fn query(&self) -> Option<&str> {
            self.query
        }

        fn version(&self) -> Option<Version> {
            self.version
        }

        fn header(&self, _name: &str) -> Option<&str> {
            None
        }

        async fn read_body(&mut self, _limit: usize) -> Result<Bytes, BoxError> {
            self.body_reads += 1;
            Ok(self.body.take().unwrap_or_default())
        }
    }

    #[derive(Debug, Default)]
    struct RecordingResponse {
        headers: Vec<(HeaderName, HeaderValue)>,
        writes: Vec<Bytes>,
        fail: bool,
    }

    impl RecordingResponse {
        fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
            self.headers
                .iter()
                .find_map(|(k, v)| (k == name).then_some(v))
        }

        fn output(&self) -> String {
            self.writes
                .iter()
                .map(|data| std::str::from_utf8(data).unwrap())
                .collect()
        }
    }

    impl SseResponse for RecordingResponse {
        fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
            self.headers.push((name, value));
        }

        async fn write(&mut self, data: Bytes) -> Result<(), BoxError> {
            if self.fail {
                return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into());
            }
            self.writes.push(data);
            Ok(())
        }
    }

    fn writer(version: Option<Version>) -> SseWriter<MockRequest, RecordingResponse> {
        SseWriter::new(
            MockRequest {
                version,
                ..Default::default()
            },
            RecordingResponse::default(),
        )
    }

    #[tokio::test]
    async fn test_send_headers_idempotent() {
        let mut sse = writer(Some(Version::HTTP_11));
        assert!(!sse.headers_sent());
        for _ in 0..3 {
            sse.send_headers().await.unwrap();
        }
        assert!(sse.headers_sent());

        let response = sse.response();
        assert_eq!(response.headers.len(), 4);
        assert_eq!(response.writes, vec![Bytes::from_static(b":\n\n")]);
        assert_eq!(response.header(&CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(response.header(&CONTENT_TYPE).unwrap(), "text/event-stream");
        assert_eq!(response.header(&X_ACCEL_BUFFERING).unwrap(), "no");
    }

    #[tokio::test]
    async fn test_emissions_send_headers_once() {
        let mut sse = writer(Some(Version::HTTP_11));
        sse.patch_elements("<p>1</p>", PatchElementsOptions::new())
            .await
            .unwrap();
        sse.location("/next", EventOptions::new()).await.unwrap();

        let response = sse.response();
        assert_eq!(response.headers.len(), 4);
        assert_eq!(response.writes.len(), 3);
        assert_eq!(response.writes[0], Bytes::from_static(STREAM_OPEN_FRAME));
    }

    #[tokio::test]
    async fn test_connection_header_only_for_http_11() {
        let mut sse = writer(Some(Version::HTTP_11));
        sse.send_headers().await.unwrap();
        assert_eq!(sse.response().header(&CONNECTION).unwrap(), "keep-alive");

        for version in [
            Some(Version::HTTP_2),
            Some(Version::HTTP_3),
            Some(Version::HTTP_10),
            None,
        ] {
            let mut sse = writer(version);
            sse.send_headers().await.unwrap();
            assert!(sse.response().header(&CONNECTION).is_none(), "{version:?}");
            assert_eq!(sse.response().headers.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_patch_elements_multi_line_framing() {
        let mut sse = writer(None);
        let output = sse
            .patch_elements("<div>\nfoo\n</div>", PatchElementsOptions::new())
            .await
            .unwrap();
        let output = std::str::from_utf8(&output).unwrap();

        assert_eq!(
            output,
            "event: patch-elements\ndata: elements <div>\ndata: elements foo\ndata: elements </div>\n\n"
        );
        assert_eq!(
            output.lines().filter(|l| l.starts_with("data:")).count(),
            3
        );
        assert_eq!(sse.response().output(), format!(":\n\n{output}"));
    }

    #[tokio::test]
    async fn test_lone_carriage_return_keeps_keyword() {
        let mut sse = writer(None);
        let output = sse
            .patch_elements("<div>\rfoo</div>", PatchElementsOptions::new())
            .await
            .unwrap();
        assert_eq!(
            &output[..],
            b"event: patch-elements\ndata: elements <div>\ndata: elements foo</div>\n\n"
        );

        let output = sse
            .patch_elements("<div>\r", PatchElementsOptions::new())
            .await
            .unwrap();
        assert_eq!(&output[..], b"event: patch-elements\ndata: elements <div>\n\n");

        let output = sse
            .execute_script("a();\rb();", ExecuteScriptOptions::new())
            .await
            .unwrap();
        assert_eq!(
            &output[..],
            b"event: execute-script\ndata: script a();\ndata: script b();\n\n"
        );
    }

    #[tokio::test]
    async fn test_patch_elements_default_mode_omitted() {
        let mut sse = writer(None);
        let implicit = sse
            .patch_elements("<div/>", PatchElementsOptions::new())
            .await
            .unwrap();
        let explicit = sse
            .patch_elements(
                "<div/>",
                PatchElementsOptions::new().with_mode(ElementPatchMode::Outer),
            )
            .await
            .unwrap();
        assert_eq!(implicit, explicit);
        assert!(!std::str::from_utf8(&implicit).unwrap().contains("mode"));
    }

    #[tokio::test]
    async fn test_patch_elements_all_options() {
        let mut sse = writer(None);
        let output = sse
            .patch_elements(
                r#"<li id="item-1">one</li>"#,
                PatchElementsOptions::new()
                    .with_selector("#list")
                    .with_mode(ElementPatchMode::Append)
                    .with_use_view_transition(true)
                    .with_event_id("e7")
                    .with_retry_duration(Duration::from_millis(500)),
            )
            .await
            .unwrap();
        assert_eq!(
            &output[..],
            br#"event: patch-elements
id: e7
retry: 500
data: selector #list
data: mode append
data: useViewTransition true
data: elements <li id="item-1">one</li>

"#
        );
    }

    #[tokio::test]
    async fn test_invalid_mode_rejected_before_transport() {
        let mut sse = writer(Some(Version::HTTP_11));
        let err = PatchElementsOptions::new()
            .try_with_mode("sideways")
            .unwrap_err();
        assert!(err.is_validation());

        let options: Result<PatchElementsOptions, _> =
            serde_json::from_value(json!({"mode": "sideways"}));
        assert!(options.is_err());

        // invalid input detected during serialization doesn't touch the transport either
        let err = sse
            .patch_elements("", PatchElementsOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(!sse.headers_sent());
        assert!(sse.response().headers.is_empty());
        assert!(sse.response().writes.is_empty());
    }

    #[tokio::test]
    async fn test_remove_elements_deterministic() {
        let mut sse = writer(None);
        let options = EventOptions::new()
            .with_event_id("e1")
            .with_retry_duration(Duration::from_millis(2000));
        let first = sse
            .remove_elements("#row-5", options.clone())
            .await
            .unwrap();
        let second = sse.remove_elements("#row-5", options).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            &first[..],
            b"event: remove-elements\nid: e1\nretry: 2000\ndata: selector #row-5\n\n"
        );
    }

    #[tokio::test]
    async fn test_patch_signals() {
        let mut sse = writer(None);

        let mut signals = SignalSet::new();
        signals.insert("count".to_owned(), json!(1));
        let output = sse
            .patch_signals(&signals, PatchSignalsOptions::new())
            .await
            .unwrap();
        assert_eq!(
            &output[..],
            b"event: patch-signals\ndata: signals {\"count\":1}\n\n"
        );

        let output = sse
            .patch_signals(
                "{\n  \"open\": true\n}",
                PatchSignalsOptions::new().with_only_if_missing(true),
            )
            .await
            .unwrap();
        assert_eq!(
            &output[..],
            b"event: patch-signals\ndata: signals {\ndata: signals   \"open\": true\ndata: signals }\ndata: onlyIfMissing true\n\n"
        );

        let output = sse
            .patch_signals(
                JsonEventData(json!({"user": {"name": "ada"}})),
                PatchSignalsOptions::new().with_event_id("s1"),
            )
            .await
            .unwrap();
        assert_eq!(
            &output[..],
            b"event: patch-signals\nid: s1\ndata: signals {\"user\":{\"name\":\"ada\"}}\n\n"
        );
    }

    #[tokio::test]
    async fn test_execute_script_and_location() {
        let mut sse = writer(None);
        let output = sse
            .execute_script(
                "console.log('hi');",
                ExecuteScriptOptions::new()
                    .with_auto_remove(false)
                    .with_attribute(ScriptAttribute::Defer),
            )
            .await
            .unwrap();
        assert_eq!(
            &output[..],
            b"event: execute-script\ndata: autoRemove false\ndata: attributes defer true\ndata: script console.log('hi');\n\n"
        );

        let output = sse
            .location("https://example.com/done", EventOptions::new())
            .await
            .unwrap();
        assert_eq!(
            &output[..],
            b"event: location\ndata: uri https://example.com/done\n\n"
        );
    }

    #[tokio::test]
    async fn test_comment() {
        let mut sse = writer(None);
        let output = sse.comment("ping").await.unwrap();
        assert_eq!(&output[..], b": ping\n\n");
        assert_eq!(sse.response().output(), ":\n\n: ping\n\n");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_transport_failure_propagates_and_closes() {
        let mut sse = writer(Some(Version::HTTP_11));
        sse.response.fail = true;

        let err = sse.send_headers().await.unwrap_err();
        assert!(err.is_transport());
        assert!(!sse.headers_sent());
        assert!(sse.is_closed());
        assert!(logs_contain("sse transport write failed"));
        assert_eq!(sse.response().headers.len(), 4);

        // the stream stays unusable, even if the transport would recover
        sse.response.fail = false;
        let err = sse.send_headers().await.unwrap_err();
        assert!(err.is_transport());
        let err = sse
            .patch_elements("<p/>", PatchElementsOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_transport());
        let err = sse.comment("ping").await.unwrap_err();
        assert!(err.is_transport());

        assert!(!sse.headers_sent());
        assert_eq!(sse.response().headers.len(), 4);
        assert!(sse.response().writes.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_after_headers() {
        let mut sse = writer(None);
        sse.send_headers().await.unwrap();
        sse.response.fail = true;
        let err = sse
            .remove_elements("#gone", EventOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(sse.is_closed());
        // still a no-op: headers were sent before the failure
        sse.send_headers().await.unwrap();
    }

    #[tokio::test]
    async fn test_read_signals_cached() {
        let mut sse = SseWriter::new(
            MockRequest {
                body: Some(Bytes::from_static(br#"{"count":1}"#)),
                ..Default::default()
            },
            RecordingResponse::default(),
        );
        assert_eq!(json!(sse.read_signals().await), json!({"count": 1}));
        assert_eq!(json!(sse.read_signals().await), json!({"count": 1}));
        assert_eq!(sse.request().body_reads, 1);
    }

    #[tokio::test]
    async fn test_read_signals_query_precedence() {
        let mut sse = SseWriter::new(
            MockRequest {
                query: Some("datastar={not valid json"),
                body: Some(Bytes::from_static(br#"{"count":1}"#)),
                ..Default::default()
            },
            RecordingResponse::default(),
        );
        assert!(sse.read_signals().await.is_empty());
        assert_eq!(sse.request().body_reads, 0);
    }
}
