//! Delayed-dispatch scheduler.
//!
//! Timing model: slot `i` of a sequence of length `n` fires at relative time
//! `i * 2T`; the session's completion deadline is `n * 2T` and fires
//! unconditionally. Slots are independent fire-and-forget tasks — an action
//! whose own suspension outlives the inter-slot spacing overlaps the next
//! slot instead of delaying it. Fire order is ascending by slot; completion
//! order of the suspensions is not guaranteed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;

use super::actions::ActionKind;
use crate::core::types::SessionError;
use crate::session::SessionContext;

/// Relative fire time of a dispatch slot. Slot 0 fires the moment dispatch
/// starts and never gets a timer of its own.
pub fn fire_offset(slot: usize, timeout: Duration) -> Duration {
    timeout * (2 * slot as u32)
}

/// Up-front session length, independent of any action's own suspension time.
pub fn total_duration(n: usize, timeout: Duration) -> Duration {
    timeout * (2 * n as u32)
}

/// Cancellation handle for a dispatch in flight. Nothing triggers it today;
/// it exists so a stuck session could be unwound without a redesign. The
/// completion deadline itself is not cancellable — once dispatch begins it
/// always fires.
pub struct CancelToken {
    tx: watch::Sender<bool>,
}

impl CancelToken {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    /// Stops slots that have not fired yet. Already-fired slots run to the
    /// end of their own suspension.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct Dispatcher {
    sequence: Vec<ActionKind>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(sequence: Vec<ActionKind>, timeout: Duration) -> Self {
        Self { sequence, timeout }
    }

    pub fn total_duration(&self) -> Duration {
        total_duration(self.sequence.len(), self.timeout)
    }

    /// Fires every slot on its offset and resolves at the completion
    /// deadline, whether or not individual suspensions have finished.
    ///
    /// Returns the number of dispatched slots. Failures from slots that
    /// completed before the deadline propagate; slots still suspended at the
    /// deadline are left to finish (or fail) on their own.
    pub async fn dispatch(
        self,
        ctx: Arc<SessionContext>,
        cancel: watch::Receiver<bool>,
    ) -> Result<usize, SessionError> {
        let Dispatcher { sequence, timeout } = self;
        let n = sequence.len();
        if n == 0 {
            return Ok(0);
        }

        let deadline = total_duration(n, timeout);
        let mut slots = Vec::with_capacity(n);
        for (i, action) in sequence.into_iter().enumerate() {
            let ctx = Arc::clone(&ctx);
            let cancel = cancel.clone();
            let offset = fire_offset(i, timeout);
            slots.push(tokio::spawn(async move {
                if offset > Duration::ZERO {
                    sleep(offset).await;
                }
                if *cancel.borrow() {
                    debug!("slot {} cancelled before firing", i);
                    return Ok(());
                }
                debug!("slot {} firing {:?} at +{:?}", i, action, offset);
                action.execute(&ctx, timeout).await
            }));
        }

        sleep(deadline).await;

        let mut dispatched = 0;
        for (i, handle) in slots.into_iter().enumerate() {
            if handle.is_finished() {
                match handle.await {
                    Ok(Ok(())) => dispatched += 1,
                    Ok(Err(e)) => return Err(e),
                    Err(e) => {
                        return Err(SessionError::Capability(format!(
                            "dispatch slot {} panicked: {}",
                            i, e
                        )))
                    }
                }
            } else {
                // Fired but still inside its own suspension; fire-and-forget.
                dispatched += 1;
                drop(handle);
            }
        }
        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_double_the_timeout_per_slot() {
        let t = Duration::from_millis(100);
        assert_eq!(fire_offset(0, t), Duration::ZERO);
        for i in 1..10 {
            assert_eq!(fire_offset(i, t), Duration::from_millis(200 * i as u64));
        }
    }

    #[test]
    fn total_is_n_times_twice_the_timeout() {
        let t = Duration::from_millis(550);
        for n in 0..50 {
            assert_eq!(total_duration(n, t), t * 2 * n as u32);
        }
    }
}
