//! Action catalog: the four atomic human-like interactions.
//!
//! Each action performs exactly one observable browser-side effect, signals
//! its audio cue, then suspends for a kind-specific duration before returning
//! control. Actions hold no state between invocations; failures from the page
//! capability propagate uncaught.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use super::rng::{uniform_1_to, RandomSource};
use crate::core::types::{Cue, SessionError, Viewport};
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Move,
    Scroll,
    Click,
    Wait,
}

impl ActionKind {
    pub fn cue(self) -> Cue {
        match self {
            ActionKind::Move => Cue::Move,
            ActionKind::Scroll => Cue::Scroll,
            ActionKind::Click => Cue::Click,
            ActionKind::Wait => Cue::Wait,
        }
    }

    pub async fn execute(
        self,
        ctx: &SessionContext,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        match self {
            ActionKind::Move => {
                let (x, y) = ctx.draw(|rng| pointer_target(rng, ctx.viewport))?;
                debug!("action move -> ({}, {})", x, y);
                ctx.page.mouse_move(x, y).await?;
                ctx.sound.play(Cue::Move);
                sleep(timeout).await;
            }
            ActionKind::Scroll => {
                let delta = ctx.draw(|rng| scroll_delta(rng, ctx.viewport.height))?;
                debug!("action scroll -> {}px", delta);
                ctx.page.scroll_by(delta).await?;
                ctx.sound.play(Cue::Scroll);
                sleep(timeout).await;
            }
            ActionKind::Click => {
                debug!("action click");
                ctx.page.mouse_down().await?;
                sleep(timeout).await;
                ctx.page.mouse_up().await?;
                // Cue only once the press has actually been released.
                ctx.sound.play(Cue::Click);
            }
            ActionKind::Wait => {
                debug!("action wait");
                ctx.sound.play(Cue::Wait);
                sleep(timeout * 5).await;
            }
        }
        Ok(())
    }
}

/// Random pointer target in the viewport's top-left quadrant:
/// x in `[1, width/2]`, y in `[1, height/2]`.
pub fn pointer_target(rng: &mut dyn RandomSource, viewport: Viewport) -> (f64, f64) {
    let x = uniform_1_to(rng, viewport.width / 2);
    let y = uniform_1_to(rng, viewport.height / 2);
    (f64::from(x), f64::from(y))
}

/// Signed smooth-scroll delta: direction is a fair coin, magnitude is
/// `floor(r * height / 2) + 50` CSS pixels.
pub fn scroll_delta(rng: &mut dyn RandomSource, viewport_height: u32) -> f64 {
    let direction = if rng.next_f64() < 0.5 { -1.0 } else { 1.0 };
    let magnitude = (rng.next_f64() * f64::from(viewport_height) / 2.0).floor() + 50.0;
    direction * magnitude
}
