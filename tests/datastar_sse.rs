use bytes::Bytes;
use http::{
    Version,
    header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
};
use http_body_util::{BodyExt, Full};
use rama_datastar::{
    BoxError, SignalSet, SseWriter,
    datastar::{ElementPatchMode, EventOptions, PatchElementsOptions, PatchSignalsOptions},
    transport::{ChannelResponse, SseResponse},
};
use serde_json::json;
use tokio_test::{assert_pending, assert_ready_ok};

fn request(version: Version, uri: &str, body: &'static str) -> http::Request<Full<Bytes>> {
    http::Request::builder()
        .version(version)
        .uri(uri)
        .header("datastar-request", "true")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

#[tokio::test]
async fn test_counter_stream_over_http_11() -> Result<(), BoxError> {
    let (response, pending) = ChannelResponse::with_default_capacity();
    let mut sse = SseWriter::new(
        request(
            Version::HTTP_11,
            "/counter?datastar=%7B%22count%22%3A41%7D",
            "",
        ),
        response,
    );

    let handle = tokio::spawn(async move {
        let signals = sse.read_signals().await;
        let count = signals["count"].as_u64().unwrap_or_default() + 1;

        let mut patch = SignalSet::new();
        patch.insert("count".to_owned(), json!(count));
        sse.patch_signals(&patch, PatchSignalsOptions::new())
            .await?;
        sse.patch_elements(
            format!("<span>{count}</span>"),
            PatchElementsOptions::new()
                .with_selector("#count")
                .with_mode(ElementPatchMode::Inner)
                .with_event_id("1"),
        )
        .await?;
        sse.comment("keep-alive").await?;
        Ok::<_, BoxError>(())
    });

    let response = pending.into_response().await?;
    assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers()["x-accel-buffering"], "no");
    assert_eq!(response.headers()[CONNECTION], "keep-alive");

    let body = response.into_body().collect().await?.to_bytes();
    handle.await??;

    assert_eq!(
        std::str::from_utf8(&body)?,
        ":\n\n\
         event: patch-signals\ndata: signals {\"count\":42}\n\n\
         event: patch-elements\nid: 1\ndata: selector #count\ndata: mode inner\ndata: elements <span>42</span>\n\n\
         : keep-alive\n\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_post_signals_over_http_2() -> Result<(), BoxError> {
    let (response, pending) = ChannelResponse::with_default_capacity();
    let mut sse = SseWriter::new(
        request(
            Version::HTTP_2,
            "/todos",
            r#"{"todos": ["write docs"], "filter": "all"}"#,
        ),
        response,
    );
    assert!(sse.request().headers().contains_key("datastar-request"));

    let signals = sse.read_signals().await;
    assert_eq!(signals["todos"], json!(["write docs"]));
    assert_eq!(signals["filter"], json!("all"));

    sse.remove_elements("#todo-0", EventOptions::new()).await?;
    sse.location("/todos?filter=all", EventOptions::new())
        .await?;
    drop(sse);

    let response = pending.into_response().await?;
    assert!(!response.headers().contains_key(CONNECTION));

    let body = response.into_body().collect().await?.to_bytes();
    assert_eq!(
        &body[..],
        b":\n\nevent: remove-elements\ndata: selector #todo-0\n\nevent: location\ndata: uri /todos?filter=all\n\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_response_head_waits_for_first_frame() -> Result<(), BoxError> {
    let (response, pending) = ChannelResponse::with_default_capacity();
    let mut head = tokio_test::task::spawn(pending.into_response());
    let mut sse = SseWriter::new(request(Version::HTTP_11, "/", ""), response);

    assert_pending!(head.poll());
    assert!(!sse.response().is_committed());

    sse.send_headers().await?;
    assert!(sse.response().is_committed());

    let response = assert_ready_ok!(head.poll());
    assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");

    Ok(())
}

#[tokio::test]
async fn test_client_disconnect_closes_writer() -> Result<(), BoxError> {
    let (response, pending) = ChannelResponse::new(1);
    let mut sse = SseWriter::new(request(Version::HTTP_11, "/", ""), response);
    sse.send_headers().await?;

    drop(pending.into_response().await?);

    let err = sse
        .patch_elements("<p>gone</p>", PatchElementsOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(sse.is_closed());

    let (_request, mut response) = sse.into_parts();
    response.write(Bytes::from_static(b": ping\n\n")).await.unwrap_err();

    Ok(())
}
