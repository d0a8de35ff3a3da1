//! Session runner: one complete visit-and-interact cycle against one site.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::behavior::rng::{RandomSource, SharedRandom};
use crate::behavior::scheduler::{CancelToken, Dispatcher};
use crate::behavior::sequence;
use crate::browser::{BrowserLauncher, PageDriver};
use crate::core::types::{RunParams, SessionError, SessionReport, Viewport};
use crate::features::cursor;
use crate::features::sound::SoundSink;

/// Ephemeral bundle handed to every action in a session: the live page, the
/// configured viewport, the sound sink, and the shared random source. Owned
/// by exactly one session; dropped when the session closes.
pub struct SessionContext {
    pub page: Arc<dyn PageDriver>,
    pub viewport: Viewport,
    pub sound: Arc<dyn SoundSink>,
    pub rng: SharedRandom,
}

impl SessionContext {
    /// Runs one draw against the shared random source. The lock is held only
    /// for the closure, never across an await.
    pub fn draw<T>(
        &self,
        f: impl FnOnce(&mut dyn RandomSource) -> T,
    ) -> Result<T, SessionError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| SessionError::Generation("random source poisoned".into()))?;
        Ok(f(&mut *rng))
    }
}

/// How every session is furnished. Fixed at startup from config.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub viewport: Viewport,
    pub show_cursor: bool,
    pub settle_timeout: Duration,
}

/// Runs one session: launch → overlay → navigate → generate → dispatch →
/// close. Each step is a hard precondition for the next; any failure
/// propagates without a local catch. The session handle is closed exactly
/// once, after the dispatch deadline fires.
pub async fn run_session(
    launcher: &dyn BrowserLauncher,
    params: &RunParams,
    opts: &SessionOptions,
    sound: Arc<dyn SoundSink>,
    rng: SharedRandom,
) -> Result<SessionReport, SessionError> {
    info!(
        "session start: {} ({} actions, {}ms base timeout)",
        params.url,
        params.action_count,
        params.timeout.as_millis()
    );

    let mut session = launcher.launch().await?;
    let page = session.page();

    if opts.show_cursor {
        cursor::install_cursor_overlay(page.as_ref()).await?;
    }

    page.goto(&params.url).await?;
    page.wait_settled(opts.settle_timeout).await?;

    let actions = {
        let mut rng_guard = rng
            .lock()
            .map_err(|_| SessionError::Generation("random source poisoned".into()))?;
        sequence::generate(params.action_count, &mut *rng_guard)
    };
    info!("sequence ready: {} actions", actions.len());

    let ctx = Arc::new(SessionContext {
        page,
        viewport: opts.viewport,
        sound,
        rng,
    });

    let dispatcher = Dispatcher::new(actions, params.timeout);
    let (_cancel, cancel_rx) = CancelToken::new();
    let dispatched = dispatcher.dispatch(ctx, cancel_rx).await?;

    info!("actions done, closing session");
    session.close().await?;

    Ok(SessionReport { dispatched })
}
