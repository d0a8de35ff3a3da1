//! Session-level tests against mock capabilities on a paused clock.
//!
//! The virtual clock makes the timing assertions exact: a slot scheduled at
//! +200ms is observed at +200ms, not "roughly".

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use ghostwalk::behavior::actions::ActionKind;
use ghostwalk::behavior::rng::{self, SeededRandom};
use ghostwalk::behavior::scheduler::{CancelToken, Dispatcher};
use ghostwalk::browser::{BrowserLauncher, PageDriver, SessionHandle};
use ghostwalk::core::types::{Cue, RunParams, SessionError, Viewport};
use ghostwalk::features::sound::SoundSink;
use ghostwalk::session::{run_session, SessionContext, SessionOptions};

#[derive(Clone, Default)]
struct Log {
    events: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl Log {
    fn record(&self, label: impl Into<String>) {
        self.events
            .lock()
            .unwrap()
            .push((label.into(), Instant::now()));
    }

    fn count(&self, label: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l == label)
            .count()
    }

    /// Millisecond offsets (from `start`) of every event whose label is in
    /// `labels`, sorted ascending.
    fn offsets_ms(&self, start: Instant, labels: &[&str]) -> Vec<u64> {
        let mut out: Vec<u64> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| labels.contains(&l.as_str()))
            .map(|(_, t)| t.duration_since(start).as_millis() as u64)
            .collect();
        out.sort_unstable();
        out
    }
}

// Every action kind records exactly one of these labels at its fire time:
// Move -> mouse_move, Scroll -> scroll, Click -> mouse_down, Wait -> cue:wait.
const FIRE_LABELS: &[&str] = &["mouse_move", "scroll", "mouse_down", "cue:wait"];

struct MockPage {
    log: Log,
    fail_pointer: bool,
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        self.log.record(format!("goto:{}", url));
        Ok(())
    }

    async fn wait_settled(&self, _timeout: Duration) -> Result<(), SessionError> {
        self.log.record("settle");
        Ok(())
    }

    async fn mouse_move(&self, _x: f64, _y: f64) -> Result<(), SessionError> {
        if self.fail_pointer {
            return Err(SessionError::Capability("page already closed".into()));
        }
        self.log.record("mouse_move");
        Ok(())
    }

    async fn mouse_down(&self) -> Result<(), SessionError> {
        if self.fail_pointer {
            return Err(SessionError::Capability("page already closed".into()));
        }
        self.log.record("mouse_down");
        Ok(())
    }

    async fn mouse_up(&self) -> Result<(), SessionError> {
        self.log.record("mouse_up");
        Ok(())
    }

    async fn scroll_by(&self, _dy: f64) -> Result<(), SessionError> {
        self.log.record("scroll");
        Ok(())
    }

    async fn evaluate(&self, _js: &str) -> Result<(), SessionError> {
        self.log.record("evaluate");
        Ok(())
    }

    async fn install_on_new_document(&self, _js: &str) -> Result<(), SessionError> {
        self.log.record("overlay");
        Ok(())
    }
}

struct MockSession {
    page: Arc<MockPage>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl SessionHandle for MockSession {
    fn page(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.page) as Arc<dyn PageDriver>
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockLauncher {
    log: Log,
    closes: Arc<AtomicUsize>,
    launches: AtomicUsize,
}

impl MockLauncher {
    fn new(log: Log) -> Self {
        Self {
            log,
            closes: Arc::new(AtomicUsize::new(0)),
            launches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self) -> Result<Box<dyn SessionHandle>, SessionError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            page: Arc::new(MockPage {
                log: self.log.clone(),
                fail_pointer: false,
            }),
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct RecordingSink {
    log: Log,
}

impl SoundSink for RecordingSink {
    fn play(&self, cue: Cue) {
        self.log.record(format!("cue:{}", cue.as_str()));
    }
}

fn options() -> SessionOptions {
    SessionOptions {
        viewport: Viewport::default(),
        show_cursor: true,
        settle_timeout: Duration::from_secs(5),
    }
}

fn context(log: &Log, fail_pointer: bool) -> Arc<SessionContext> {
    Arc::new(SessionContext {
        page: Arc::new(MockPage {
            log: log.clone(),
            fail_pointer,
        }),
        viewport: Viewport::default(),
        sound: Arc::new(RecordingSink { log: log.clone() }),
        rng: rng::shared(SeededRandom::new(7)),
    })
}

#[tokio::test(start_paused = true)]
async fn three_action_session_fires_on_schedule_and_closes_once() {
    let log = Log::default();
    let launcher = MockLauncher::new(log.clone());
    let params = RunParams {
        url: "https://example.com".to_string(),
        action_count: 3,
        timeout: Duration::from_millis(100),
    };

    let start = Instant::now();
    let report = run_session(
        &launcher,
        &params,
        &options(),
        Arc::new(RecordingSink { log: log.clone() }),
        rng::shared(SeededRandom::new(7)),
    )
    .await
    .expect("session should succeed");

    assert_eq!(start.elapsed(), Duration::from_millis(600));
    assert_eq!(report.dispatched, 3);
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    assert_eq!(log.count("goto:https://example.com"), 1);
    assert_eq!(log.count("overlay"), 1);

    // Each slot fires exactly one fire-time event: 0, 200, 400.
    assert_eq!(log.offsets_ms(start, FIRE_LABELS), vec![0, 200, 400]);
}

#[tokio::test(start_paused = true)]
async fn zero_actions_complete_immediately() {
    let log = Log::default();
    let launcher = MockLauncher::new(log.clone());
    let params = RunParams {
        url: "https://example.com".to_string(),
        action_count: 0,
        timeout: Duration::from_millis(500),
    };

    let start = Instant::now();
    let report = run_session(
        &launcher,
        &params,
        &options(),
        Arc::new(RecordingSink { log: log.clone() }),
        rng::shared(SeededRandom::new(1)),
    )
    .await
    .expect("empty session should succeed");

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(report.dispatched, 0);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
    assert!(log.offsets_ms(start, FIRE_LABELS).is_empty());
}

#[tokio::test(start_paused = true)]
async fn dispatcher_resolves_at_the_deadline() {
    let log = Log::default();
    let ctx = context(&log, false);
    let dispatcher = Dispatcher::new(
        vec![ActionKind::Move, ActionKind::Move, ActionKind::Move],
        Duration::from_millis(100),
    );
    assert_eq!(dispatcher.total_duration(), Duration::from_millis(600));

    let start = Instant::now();
    let (_token, cancel_rx) = CancelToken::new();
    let dispatched = dispatcher.dispatch(ctx, cancel_rx).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(600));
    assert_eq!(dispatched, 3);
    assert_eq!(log.offsets_ms(start, &["mouse_move"]), vec![0, 200, 400]);
}

#[tokio::test(start_paused = true)]
async fn long_suspension_does_not_delay_later_slots_or_completion() {
    let log = Log::default();
    let ctx = context(&log, false);
    // Wait suspends for 5T = 500ms, well past slot 1's fire time (200ms) and
    // the completion deadline (400ms).
    let dispatcher = Dispatcher::new(
        vec![ActionKind::Wait, ActionKind::Move],
        Duration::from_millis(100),
    );

    let start = Instant::now();
    let (_token, cancel_rx) = CancelToken::new();
    let dispatched = dispatcher.dispatch(ctx, cancel_rx).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(400));
    assert_eq!(dispatched, 2);
    assert_eq!(log.offsets_ms(start, &["cue:wait"]), vec![0]);
    assert_eq!(log.offsets_ms(start, &["mouse_move"]), vec![200]);
}

#[tokio::test(start_paused = true)]
async fn cancelled_dispatch_skips_effects_but_still_completes() {
    let log = Log::default();
    let ctx = context(&log, false);
    let dispatcher = Dispatcher::new(vec![ActionKind::Move], Duration::from_millis(100));

    let (token, cancel_rx) = CancelToken::new();
    token.cancel();

    let start = Instant::now();
    dispatcher.dispatch(ctx, cancel_rx).await.unwrap();

    // The deadline always fires; only the slot effects are skipped.
    assert_eq!(start.elapsed(), Duration::from_millis(200));
    assert!(log.offsets_ms(start, FIRE_LABELS).is_empty());
}

#[tokio::test(start_paused = true)]
async fn capability_failure_propagates_out_of_dispatch() {
    let log = Log::default();
    let ctx = context(&log, true);
    let dispatcher = Dispatcher::new(vec![ActionKind::Move], Duration::from_millis(100));

    let (_token, cancel_rx) = CancelToken::new();
    let err = dispatcher.dispatch(ctx, cancel_rx).await.unwrap_err();
    assert!(matches!(err, SessionError::Capability(_)));
}

#[tokio::test(start_paused = true)]
async fn click_releases_before_its_cue() {
    let log = Log::default();
    let ctx = context(&log, false);
    let dispatcher = Dispatcher::new(vec![ActionKind::Click], Duration::from_millis(100));

    let start = Instant::now();
    let (_token, cancel_rx) = CancelToken::new();
    dispatcher.dispatch(ctx, cancel_rx).await.unwrap();

    assert_eq!(log.offsets_ms(start, &["mouse_down"]), vec![0]);
    assert_eq!(log.offsets_ms(start, &["mouse_up"]), vec![100]);
    assert_eq!(log.offsets_ms(start, &["cue:click"]), vec![100]);
}
