//! SearchController tests against a scripted in-memory source.
//!
//! Tokio's clock is paused, so debounce windows and response delays are
//! deterministic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use rxstorage_core::{
    Cursor, Direction, Error, Identifiable, Page, PageInfo, PageRequest, PageSource, Result,
};
use rxstorage_search::{LoadOutcome, SearchConfig, SearchController};

#[derive(Debug, Clone, PartialEq)]
struct Part {
    id: u32,
    name: String,
}

impl Identifiable for Part {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

type Request = PageRequest<Option<u32>>;

struct Reply {
    delay: Duration,
    result: Result<Page<Part>>,
}

type Responder = Box<dyn Fn(&Request) -> Reply + Send + Sync>;

/// Records every request and answers through a closure.
struct ScriptedSource {
    requests: Arc<Mutex<Vec<Request>>>,
    respond: Responder,
}

#[async_trait]
impl PageSource for ScriptedSource {
    type Item = Part;
    type Filter = Option<u32>;

    async fn fetch_page(&self, request: &Request) -> Result<Page<Part>> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = (self.respond)(request);
        sleep(reply.delay).await;
        reply.result
    }
}

fn parts(ids: impl IntoIterator<Item = u32>) -> Vec<Part> {
    ids.into_iter()
        .map(|id| Part {
            id,
            name: format!("part-{id}"),
        })
        .collect()
}

fn page(ids: impl IntoIterator<Item = u32>, next: Option<&str>) -> Page<Part> {
    Page {
        data: parts(ids),
        pagination: PageInfo {
            next_cursor: next.map(Cursor::new),
            has_next_page: next.is_some(),
            ..PageInfo::default()
        },
    }
}

fn ok(page: Page<Part>) -> Reply {
    Reply {
        delay: Duration::ZERO,
        result: Ok(page),
    }
}

fn controller(
    respond: impl Fn(&Request) -> Reply + Send + Sync + 'static,
) -> (
    SearchController<ScriptedSource>,
    Arc<Mutex<Vec<Request>>>,
) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let source = ScriptedSource {
        requests: Arc::clone(&requests),
        respond: Box::new(respond),
    };
    (
        SearchController::new(source, SearchConfig::default().with_page_limit(Some(20))),
        requests,
    )
}

fn ids(controller: &SearchController<ScriptedSource>) -> Vec<u32> {
    controller.state().items.iter().map(|p| p.id).collect()
}

// ============================================================================
// Debounce
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_debounce_dispatches_only_latest_query() {
    let (list, requests) = controller(|req| {
        let first = if req.search.as_deref() == Some("abc") { 10 } else { 90 };
        ok(page([first], None))
    });

    list.set_query("a");
    sleep(Duration::from_millis(100)).await;
    list.set_query("ab");
    sleep(Duration::from_millis(100)).await;
    list.set_query("abc");
    sleep(Duration::from_millis(400)).await;

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].search.as_deref(), Some("abc"));
    assert_eq!(requests[0].limit, Some(20));
    assert_eq!(ids(&list), vec![10]);
    assert_eq!(list.state().active_query(), Some("abc"));
}

#[tokio::test(start_paused = true)]
async fn test_identical_query_is_not_redispatched() {
    let (list, requests) = controller(|_| ok(page([1], None)));

    list.set_query("drill");
    sleep(Duration::from_millis(400)).await;

    // Type and erase within the window; the settled text is unchanged.
    list.set_query("drills");
    sleep(Duration::from_millis(50)).await;
    list.set_query("drill");
    sleep(Duration::from_millis(400)).await;

    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_blank_query_searches_without_text() {
    let (list, requests) = controller(|_| ok(page([1, 2], None)));

    list.set_query("   ");
    sleep(Duration::from_millis(400)).await;

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].search, None);
}

// ============================================================================
// Load more
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_load_more_without_next_page_is_noop() {
    let (list, requests) = controller(|_| ok(page([1, 2, 3], None)));

    assert!(list.load_initial().await.is_applied());
    let before = list.state().items;

    assert!(matches!(list.load_more().await, LoadOutcome::Skipped));
    assert_eq!(requests.lock().unwrap().len(), 1);
    assert_eq!(list.state().items, before);
}

#[tokio::test(start_paused = true)]
async fn test_load_more_before_any_load_is_noop() {
    let (list, requests) = controller(|_| ok(page([1], Some("c"))));

    assert!(matches!(list.load_more().await, LoadOutcome::Skipped));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_load_more_appends_only_new_ids() {
    let (list, requests) = controller(|req| match req.cursor.as_ref().map(Cursor::as_str) {
        None => ok(page([1, 2, 3], Some("c1"))),
        Some("c1") => ok(page([3, 4, 2, 5], Some("c2"))),
        Some(_) => ok(page([6], None)),
    });

    list.submit_query("bolt").await;
    let outcome = list.load_more().await;

    assert!(matches!(outcome, LoadOutcome::Applied { added: 2 }));
    assert_eq!(ids(&list), vec![1, 2, 3, 4, 5]);
    assert_eq!(list.state().next_cursor, Some(Cursor::new("c2")));

    let requests = requests.lock().unwrap();
    assert_eq!(requests[1].cursor, Some(Cursor::new("c1")));
    assert_eq!(requests[1].direction, Some(Direction::Next));
    assert_eq!(requests[1].search.as_deref(), Some("bolt"));
}

#[tokio::test(start_paused = true)]
async fn test_last_page_clears_has_next_page() {
    let (list, _) = controller(|req| match req.cursor {
        None => ok(page([1], Some("c1"))),
        Some(_) => ok(page([2], None)),
    });

    list.load_initial().await;
    list.load_more().await;

    let state = list.state();
    assert!(!state.has_next_page);
    assert_eq!(state.next_cursor, None);
    assert!(matches!(list.load_more().await, LoadOutcome::Skipped));
}

#[tokio::test(start_paused = true)]
async fn test_rapid_load_more_fetches_once() {
    let (list, requests) = controller(|req| match req.cursor {
        None => ok(page([1, 2], Some("c1"))),
        Some(_) => Reply {
            delay: Duration::from_millis(100),
            result: Ok(page([3, 4], None)),
        },
    });

    list.load_initial().await;
    let (first, second) = tokio::join!(list.load_more(), list.load_more());

    assert!(matches!(first, LoadOutcome::Applied { added: 2 }));
    assert!(matches!(second, LoadOutcome::Skipped));
    assert_eq!(requests.lock().unwrap().len(), 2);
    assert_eq!(ids(&list), vec![1, 2, 3, 4]);
}

// ============================================================================
// Ordering and cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stale_initial_response_is_discarded() {
    let (list, _) = controller(|req| match req.search.as_deref() {
        Some("slow") => Reply {
            delay: Duration::from_millis(500),
            result: Ok(page([100], None)),
        },
        _ => Reply {
            delay: Duration::from_millis(10),
            result: Ok(page([200], None)),
        },
    });

    let (slow, fast) = tokio::join!(list.submit_query("slow"), async {
        sleep(Duration::from_millis(5)).await;
        list.submit_query("fast").await
    });

    assert!(matches!(slow, LoadOutcome::Stale));
    assert!(fast.is_applied());
    assert_eq!(ids(&list), vec![200]);
    assert!(!list.state().is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_new_initial_load_discards_pending_load_more() {
    let (list, _) = controller(|req| match (&req.cursor, req.filter) {
        (None, None) => ok(page([1, 2], Some("c1"))),
        (Some(_), _) => Reply {
            delay: Duration::from_millis(200),
            result: Ok(page([3], None)),
        },
        (None, Some(_)) => ok(page([9], None)),
    });

    list.load_initial().await;
    let (more, filtered) = tokio::join!(list.load_more(), async {
        sleep(Duration::from_millis(10)).await;
        list.set_filter(Some(7)).await
    });

    assert!(matches!(more, LoadOutcome::Stale));
    assert!(filtered.is_applied());
    assert_eq!(ids(&list), vec![9]);
    assert!(!list.state().is_loading_more);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_in_flight_load() {
    let (list, _) = controller(|_| Reply {
        delay: Duration::from_millis(200),
        result: Ok(page([1], None)),
    });

    let (outcome, _) = tokio::join!(list.load_initial(), async {
        sleep(Duration::from_millis(20)).await;
        list.cancel();
    });

    assert!(matches!(outcome, LoadOutcome::Stale));
    let state = list.state();
    assert!(state.items.is_empty());
    assert!(!state.is_loading);
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_pending_debounce() {
    let (list, requests) = controller(|_| ok(page([1], None)));

    list.set_query("tape");
    sleep(Duration::from_millis(100)).await;
    list.cancel();
    sleep(Duration::from_millis(500)).await;

    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_retyped_query_reloads_after_aborted_dispatch() {
    let (list, requests) = controller(|_| Reply {
        delay: Duration::from_millis(200),
        result: Ok(page([7], None)),
    });

    list.set_query("abc");
    sleep(Duration::from_millis(350)).await;
    // The first dispatch is mid-fetch; restarting the timer aborts it.
    list.set_query("abc");
    sleep(Duration::from_secs(2)).await;

    assert_eq!(requests.lock().unwrap().len(), 2);
    assert_eq!(ids(&list), vec![7]);
    let state = list.state();
    assert_eq!(state.active_query(), Some("abc"));
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_same_query_reloads_after_cancel() {
    let (list, requests) = controller(|_| Reply {
        delay: Duration::from_millis(200),
        result: Ok(page([3], None)),
    });

    list.set_query("tape");
    sleep(Duration::from_millis(350)).await;
    list.cancel();
    assert_eq!(list.state().active_query(), None);

    list.set_query("tape");
    sleep(Duration::from_secs(2)).await;

    assert_eq!(requests.lock().unwrap().len(), 2);
    assert_eq!(ids(&list), vec![3]);
    assert_eq!(list.state().active_query(), Some("tape"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_query_is_retried_when_retyped() {
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let (list, requests) = controller(move |_| {
        let mut calls = counter.lock().unwrap();
        *calls += 1;
        if *calls == 1 {
            Reply {
                delay: Duration::ZERO,
                result: Err(Error::from(rxstorage_core::ApiError::ServerError(
                    "timeout upstream".into(),
                ))),
            }
        } else {
            ok(page([5], None))
        }
    });

    list.set_query("glue");
    sleep(Duration::from_millis(400)).await;
    assert!(list.state().error.is_some());
    assert_eq!(list.state().active_query(), None);

    list.set_query("glue");
    sleep(Duration::from_millis(400)).await;

    assert_eq!(requests.lock().unwrap().len(), 2);
    assert_eq!(ids(&list), vec![5]);
    assert!(list.state().error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_load_resets_loading_flag() {
    let (list, _) = controller(|_| Reply {
        delay: Duration::from_secs(5),
        result: Ok(page([1], None)),
    });

    let timed_out = tokio::time::timeout(Duration::from_millis(50), list.load_initial()).await;

    assert!(timed_out.is_err());
    assert!(!list.state().is_loading);
}

// ============================================================================
// Error policy
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancellation_error_is_silent() {
    let (list, _) = controller(|_| Reply {
        delay: Duration::ZERO,
        result: Err(Error::Cancelled),
    });

    let outcome = list.load_initial().await;

    assert!(matches!(outcome, LoadOutcome::Cancelled));
    let state = list.state();
    assert!(state.error.is_none());
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_recorded_and_keeps_items() {
    let (list, _) = controller(|req| match req.filter {
        None => ok(page([1, 2], None)),
        Some(_) => Reply {
            delay: Duration::ZERO,
            result: Err(Error::from(rxstorage_core::ApiError::ServerError(
                "database unavailable".into(),
            ))),
        },
    });

    list.load_initial().await;
    let outcome = list.set_filter(Some(3)).await;

    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    let state = list.state();
    assert_eq!(ids(&list), vec![1, 2]);
    assert!(!state.is_loading);
    let error = state.error.expect("error recorded");
    assert!(error.to_string().contains("database unavailable"));
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_filter_does_not_reload() {
    let (list, requests) = controller(|_| ok(page([1], None)));

    list.load_initial().await;
    assert!(matches!(list.set_filter(None).await, LoadOutcome::Skipped));
    assert_eq!(requests.lock().unwrap().len(), 1);
}

// ============================================================================
// Prefetch hint
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_should_load_more_near_end() {
    let (list, _) = controller(|req| match req.cursor {
        None => ok(page(1..=10, Some("c1"))),
        Some(_) => ok(page(11..=12, None)),
    });

    list.load_initial().await;

    assert!(!list.should_load_more(&1));
    assert!(!list.should_load_more(&7));
    assert!(list.should_load_more(&8));
    assert!(list.should_load_more(&10));
    assert!(!list.should_load_more(&99));

    list.load_more().await;
    assert!(!list.should_load_more(&12));
}

#[tokio::test(start_paused = true)]
async fn test_should_load_more_false_while_loading() {
    let (list, _) = controller(|req| match req.cursor {
        None => ok(page(1..=4, Some("c1"))),
        Some(_) => Reply {
            delay: Duration::from_millis(100),
            result: Ok(page([5], None)),
        },
    });

    list.load_initial().await;
    let (_, during) = tokio::join!(list.load_more(), async {
        sleep(Duration::from_millis(10)).await;
        list.should_load_more(&4)
    });

    assert!(!during);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_loading_transitions() {
    let (list, _) = controller(|_| Reply {
        delay: Duration::from_millis(50),
        result: Ok(page([1], None)),
    });
    let mut rx = list.subscribe();

    let (_, saw_loading) = tokio::join!(list.load_initial(), async {
        rx.wait_for(|s| s.is_loading).await.is_ok()
    });

    assert!(saw_loading);
    assert!(!rx.borrow_and_update().is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_initial_filter_is_sent_with_first_load() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let source = ScriptedSource {
        requests: Arc::clone(&requests),
        respond: Box::new(|_| ok(page([1], None))),
    };
    let list = SearchController::with_filter(source, SearchConfig::default(), Some(4));

    assert!(requests.lock().unwrap().is_empty());
    list.submit_query("hammer").await;

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].filter, Some(4));
    assert_eq!(requests[0].search.as_deref(), Some("hammer"));
}
