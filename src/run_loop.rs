//! Process-wide run loop: pick a site and parameters, run one session, and
//! start over — forever.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::behavior::rng::{pick, SharedRandom};
use crate::browser::BrowserLauncher;
use crate::core::types::{RunParams, SessionError};
use crate::features::sound::SoundSink;
use crate::session::{run_session, SessionOptions};
use crate::sites::SitePool;

pub struct RunLoop {
    sites: SitePool,
    action_counts: Vec<usize>,
    timeouts_ms: Vec<u64>,
    opts: SessionOptions,
    launcher: Arc<dyn BrowserLauncher>,
    sound: Arc<dyn SoundSink>,
    rng: SharedRandom,
}

impl RunLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sites: SitePool,
        action_counts: Vec<usize>,
        timeouts_ms: Vec<u64>,
        opts: SessionOptions,
        launcher: Arc<dyn BrowserLauncher>,
        sound: Arc<dyn SoundSink>,
        rng: SharedRandom,
    ) -> Self {
        Self {
            sites,
            action_counts,
            timeouts_ms,
            opts,
            launcher,
            sound,
            rng,
        }
    }

    /// Draws one session's parameters from the candidate pools.
    pub fn draw_params(&self) -> Result<RunParams, SessionError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| SessionError::Generation("random source poisoned".into()))?;
        let url = self.sites.choose(&mut *rng).to_string();
        let action_count = *pick(&mut *rng, &self.action_counts);
        let timeout = Duration::from_millis(*pick(&mut *rng, &self.timeouts_ms));
        Ok(RunParams {
            url,
            action_count,
            timeout,
        })
    }

    /// Runs sessions back to back until the process dies. Sessions never
    /// overlap: the next one starts only after the previous completion
    /// signal. There is no backoff and no iteration cap; the first session
    /// failure is not caught here — it unwinds to `main` and stops the loop.
    pub async fn run(&self) -> Result<(), SessionError> {
        loop {
            let params = self.draw_params()?;
            info!("url selected: {}", params.url);
            let report = run_session(
                self.launcher.as_ref(),
                &params,
                &self.opts,
                Arc::clone(&self.sound),
                Arc::clone(&self.rng),
            )
            .await?;
            info!("session complete: {} actions dispatched", report.dispatched);
        }
    }
}
