#![allow(clippy::unwrap_used)]
// Integration tests for `Reader` against a wiremock backend.

use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast;
use url::Url;
use wiremock::matchers::{body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mangaview_core::{
    ChapterId, ChapterKind, CoreError, MemorySurface, Reader, ReaderConfig, ReaderEvent,
    ViewerState,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(tweak: impl FnOnce(&mut ReaderConfig)) -> (MockServer, Reader<MemorySurface>) {
    let server = MockServer::start().await;
    let base = Url::parse(&format!("{}/ac/", server.uri())).unwrap();
    let mut config = ReaderConfig::new(base, 7);
    config.record_history = false;
    config.stream_timeout = Duration::from_secs(5);
    tweak(&mut config);

    let reader = Reader::new(config, MemorySurface::new()).unwrap();
    (server, reader)
}

async fn mount_chapters(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ac/api/chapters"))
        .and(query_param("manga_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Chapter": [
                { "id": 1, "title": "Ch1" },
                { "id": 2, "title": "Ch2" },
                { "id": 3, "title": "Ch3" }
            ]
        })))
        .mount(server)
        .await;
}

fn feed_body(pages: &[(usize, usize, &str)]) -> String {
    let mut body: String = pages
        .iter()
        .map(|(idx, total, pic)| {
            format!(
                "data: {}\n\n",
                json!({ "idx": idx, "total": total, "pic_path": pic })
            )
        })
        .collect();
    body.push_str("data: {}\n\n");
    body
}

fn sse(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/event-stream")
}

async fn mount_pages(server: &MockServer, chapter_id: i64, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/ac/api/pages"))
        .and(query_param("chapter_id", chapter_id.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Collect events until `done` matches one, failing after five seconds.
async fn until(
    events: &mut broadcast::Receiver<ReaderEvent>,
    mut done: impl FnMut(&ReaderEvent) -> bool,
) -> Vec<ReaderEvent> {
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            let finished = done(&event);
            seen.push(event);
            if finished {
                break;
            }
        }
    })
    .await
    .expect("timed out waiting for reader event");
    seen
}

// ── Index ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_index_renders_chapter_list() {
    let (server, reader) = setup(|_| {}).await;
    mount_chapters(&server).await;

    let index = reader.load_index().await.unwrap();
    assert_eq!(index.group(ChapterKind::Chapter).len(), 3);

    let tabs = reader.inspect(|v| v.surface().tabs().to_vec()).await;
    assert_eq!(tabs[0].1, vec!["Ch1", "Ch2", "Ch3"]);
}

#[tokio::test]
async fn test_load_index_fetch_error() {
    let (server, reader) = setup(|_| {}).await;
    Mock::given(method("GET"))
        .and(path("/ac/api/chapters"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
        .mount(&server)
        .await;

    let err = reader.load_index().await.unwrap_err();
    assert!(
        matches!(err, CoreError::Fetch { status: Some(500), .. }),
        "expected Fetch error, got: {err:?}"
    );
}

#[tokio::test]
async fn test_invalid_selection_opens_nothing() {
    let (server, reader) = setup(|_| {}).await;
    mount_chapters(&server).await;
    reader.load_index().await.unwrap();

    let err = reader.select_chapter(ChapterKind::Misc, 0).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidSelection { .. }));
    assert_eq!(*reader.state().borrow(), ViewerState::Idle);
}

// ── Streaming ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_chapter_then_next() {
    let (server, reader) = setup(|_| {}).await;
    mount_chapters(&server).await;
    mount_pages(
        &server,
        2,
        sse(feed_body(&[
            (2, 3, "/downloaded/c.png"),
            (0, 3, "/downloaded/a.png"),
            (1, 3, "/downloaded/b.png"),
        ])),
    )
    .await;
    mount_pages(&server, 3, sse(feed_body(&[(0, 1, "/downloaded/d.png")]))).await;

    reader.load_index().await.unwrap();
    let mut events = reader.events();

    let ticket = reader.select_chapter(ChapterKind::Chapter, 1).await.unwrap();
    assert_eq!(ticket.chapter.id, ChapterId::new(2));

    let seen = until(&mut events, |e| matches!(e, ReaderEvent::ChapterComplete { .. })).await;
    assert!(matches!(seen[0], ReaderEvent::SessionOpened { .. }));
    let rendered = seen
        .iter()
        .filter(|e| matches!(e, ReaderEvent::PageRendered { .. }))
        .count();
    assert_eq!(rendered, 3);

    reader.wait_idle().await.unwrap();
    let pages = reader
        .inspect(|v| {
            v.surface()
                .rendered_pages()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .await;
    assert_eq!(pages, vec!["/static/a.png", "/static/b.png", "/static/c.png"]);

    let next = reader.next().await.expect("Ch3 follows Ch2");
    assert_eq!(next.chapter.title, "Ch3");
    until(&mut events, |e| {
        matches!(e, ReaderEvent::ChapterComplete { session, .. } if *session == next.session)
    })
    .await;

    assert!(reader.next().await.is_none(), "Ch3 is the last chapter");
    let cursor = reader.inspect(|v| v.cursor()).await.unwrap();
    assert_eq!(cursor.position, 2);
}

#[tokio::test]
async fn test_selection_preempts_running_stream() {
    let (server, reader) = setup(|_| {}).await;
    mount_chapters(&server).await;
    mount_pages(
        &server,
        1,
        sse(feed_body(&[(0, 1, "/downloaded/slow.png")])).set_delay(Duration::from_secs(3)),
    )
    .await;
    mount_pages(&server, 2, sse(feed_body(&[(0, 1, "/downloaded/fast.png")]))).await;

    reader.load_index().await.unwrap();
    let mut events = reader.events();

    let first = reader.select_chapter(ChapterKind::Chapter, 0).await.unwrap();
    let second = reader.select_chapter(ChapterKind::Chapter, 1).await.unwrap();
    assert!(second.session > first.session);

    let seen = until(&mut events, |e| matches!(e, ReaderEvent::ChapterComplete { .. })).await;
    assert!(seen.iter().all(|e| !matches!(
        e,
        ReaderEvent::PageRendered { session, .. } | ReaderEvent::StreamFailed { session, .. }
            if *session == first.session
    )));

    let pages = reader
        .inspect(|v| v.surface().rendered_pages().join(","))
        .await;
    assert_eq!(pages, "/static/fast.png");
}

#[tokio::test]
async fn test_close_stops_the_stream() {
    let (server, reader) = setup(|_| {}).await;
    mount_chapters(&server).await;
    mount_pages(
        &server,
        1,
        sse(feed_body(&[(0, 1, "/downloaded/a.png")])).set_delay(Duration::from_secs(2)),
    )
    .await;

    reader.load_index().await.unwrap();
    reader.select_chapter(ChapterKind::Chapter, 0).await.unwrap();
    assert!(!reader.state().borrow().is_idle());

    reader.close().await;
    assert!(reader.state().borrow().is_idle());
    assert!(reader.inspect(|v| v.session().is_none()).await);
    assert_eq!(reader.inspect(|v| v.surface().filled()).await, 0);
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_timeout_fails_the_session() {
    let (server, reader) = setup(|c| c.stream_timeout = Duration::from_millis(200)).await;
    mount_chapters(&server).await;
    mount_pages(
        &server,
        1,
        sse(feed_body(&[(0, 1, "/downloaded/a.png")])).set_delay(Duration::from_secs(3)),
    )
    .await;

    reader.load_index().await.unwrap();
    let mut events = reader.events();
    reader.select_chapter(ChapterKind::Chapter, 0).await.unwrap();

    let seen = until(&mut events, |e| matches!(e, ReaderEvent::StreamFailed { .. })).await;
    let Some(ReaderEvent::StreamFailed {
        error, timed_out, ..
    }) = seen.last()
    else {
        panic!("expected StreamFailed");
    };
    assert!(*timed_out);
    assert!(error.contains("200ms"), "unexpected error: {error}");
    reader.wait_idle().await.unwrap();
}

#[tokio::test]
async fn test_feed_without_end_marker_fails() {
    let (server, reader) = setup(|_| {}).await;
    mount_chapters(&server).await;
    mount_pages(
        &server,
        1,
        sse("data: {\"idx\":0,\"total\":2,\"pic_path\":\"/downloaded/a.png\"}\n\n"),
    )
    .await;

    reader.load_index().await.unwrap();
    let mut events = reader.events();
    reader.select_chapter(ChapterKind::Chapter, 0).await.unwrap();

    let seen = until(&mut events, |e| matches!(e, ReaderEvent::StreamFailed { .. })).await;
    assert!(seen.iter().any(|e| matches!(e, ReaderEvent::PageRendered { idx: 0, .. })));
    reader.wait_idle().await.unwrap();
    assert_eq!(
        reader.inspect(|v| v.surface().rendered_pages().len()).await,
        1,
        "pages placed before the failure stay on screen"
    );
}

#[tokio::test]
async fn test_malformed_event_fails_the_session() {
    let (server, reader) = setup(|_| {}).await;
    mount_chapters(&server).await;
    mount_pages(&server, 1, sse("data: {\"idx\":0}\n\ndata: {}\n\n")).await;

    reader.load_index().await.unwrap();
    let mut events = reader.events();
    reader.select_chapter(ChapterKind::Chapter, 0).await.unwrap();

    let seen = until(&mut events, |e| matches!(e, ReaderEvent::StreamFailed { .. })).await;
    assert!(!seen.iter().any(|e| matches!(e, ReaderEvent::ChapterComplete { .. })));
    reader.wait_idle().await.unwrap();
}

#[tokio::test]
async fn test_oversized_page_total_fails_the_session() {
    let (server, reader) = setup(|_| {}).await;
    mount_chapters(&server).await;
    mount_pages(
        &server,
        1,
        sse(feed_body(&[(0, usize::MAX, "/downloaded/a.png")])),
    )
    .await;

    reader.load_index().await.unwrap();
    let mut events = reader.events();
    reader.select_chapter(ChapterKind::Chapter, 0).await.unwrap();

    let seen = until(&mut events, |e| matches!(e, ReaderEvent::StreamFailed { .. })).await;
    let Some(ReaderEvent::StreamFailed {
        error, timed_out, ..
    }) = seen.last()
    else {
        unreachable!()
    };
    assert!(error.contains("exceeds"), "{error}");
    assert!(!timed_out);
    reader.wait_idle().await.unwrap();

    // The reader stays usable after the rejected feed.
    mount_pages(&server, 2, sse(feed_body(&[(0, 1, "/downloaded/b.png")]))).await;
    reader.select_chapter(ChapterKind::Chapter, 1).await.unwrap();
    until(&mut events, |e| matches!(e, ReaderEvent::ChapterComplete { .. })).await;
}

// ── History ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_opening_a_chapter_records_history() {
    let (server, reader) = setup(|c| c.record_history = true).await;
    mount_chapters(&server).await;
    mount_pages(&server, 2, sse(feed_body(&[(0, 1, "/downloaded/a.png")]))).await;

    Mock::given(method("PUT"))
        .and(path("/ac/user/history"))
        .and(body_string("manga_id=7&chapter_id=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": 1, "manga_id": 7, "chapter_id": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ac/api/manga"))
        .and(query_param("manga_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "One Piece",
            "last_read_chapter": { "id": 2, "title": "Ch2" }
        })))
        .mount(&server)
        .await;

    reader.load_index().await.unwrap();
    let mut events = reader.events();
    reader.select_chapter(ChapterKind::Chapter, 1).await.unwrap();

    let seen = until(&mut events, |e| matches!(e, ReaderEvent::LastRead(_))).await;
    assert!(seen.contains(&ReaderEvent::HistoryRecorded {
        chapter_id: ChapterId::new(2)
    }));
    let Some(ReaderEvent::LastRead(Some(last))) = seen.last() else {
        panic!("expected LastRead");
    };
    assert_eq!(last.title.as_deref(), Some("Ch2"));
}

#[tokio::test]
async fn test_history_failure_does_not_affect_reading() {
    let (server, reader) = setup(|c| c.record_history = true).await;
    mount_chapters(&server).await;
    mount_pages(&server, 1, sse(feed_body(&[(0, 1, "/downloaded/a.png")]))).await;
    Mock::given(method("PUT"))
        .and(path("/ac/user/history"))
        .respond_with(ResponseTemplate::new(401).set_body_string("login required"))
        .mount(&server)
        .await;

    reader.load_index().await.unwrap();
    let mut events = reader.events();
    reader.select_chapter(ChapterKind::Chapter, 0).await.unwrap();

    until(&mut events, |e| matches!(e, ReaderEvent::ChapterComplete { .. })).await;
    assert_eq!(reader.inspect(|v| v.surface().filled()).await, 1);
}

// ── Series reads ────────────────────────────────────────────────────

#[tokio::test]
async fn test_meta_rewrites_thumbnail() {
    let (server, reader) = setup(|_| {}).await;
    Mock::given(method("GET"))
        .and(path("/ac/api/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "manga_id": 7,
            "last_update": "2024-03-01T12:30:00",
            "finished": false,
            "thum_img": "/downloaded/site/op/thum_img.jpg",
            "latest_chapter": { "id": 3, "title": "Ch3" }
        })))
        .mount(&server)
        .await;

    let meta = reader.meta().await.unwrap();
    assert_eq!(meta.thumbnail.as_deref(), Some("/static/site/op/thum_img.jpg"));
    assert_eq!(meta.last_update_date().as_deref(), Some("2024-03-01"));
}
