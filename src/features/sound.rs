//! Audio cue sink.
//!
//! Cues are fire-and-forget: playback happens on a detached thread and the
//! caller never learns whether it succeeded. If audio output is unavailable
//! the cue is silently dropped.

use std::time::Duration;

use rodio::{OutputStreamBuilder, Sink, Source};

use crate::core::types::Cue;

pub trait SoundSink: Send + Sync {
    /// Fire-and-forget audio cue; never blocks the caller.
    fn play(&self, cue: Cue);
}

/// Sine-tone sink: one pitch per cue so the four action kinds are audibly
/// distinct while a session runs.
pub struct TonePlayer;

impl TonePlayer {
    fn tone(cue: Cue) -> (f32, u64) {
        match cue {
            Cue::Move => (440.0, 150),
            Cue::Scroll => (330.0, 200),
            Cue::Click => (880.0, 90),
            Cue::Wait => (262.0, 300),
        }
    }
}

impl SoundSink for TonePlayer {
    fn play(&self, cue: Cue) {
        let (freq, dur_ms) = Self::tone(cue);
        std::thread::spawn(move || {
            let Ok(mut stream) = OutputStreamBuilder::open_default_stream() else {
                return;
            };
            stream.log_on_drop(false);
            let sink = Sink::connect_new(stream.mixer());
            let src = rodio::source::SineWave::new(freq)
                .take_duration(Duration::from_millis(dur_ms))
                .amplify(0.20);
            sink.append(src);
            sink.sleep_until_end();
        });
    }
}

/// Used when sound is disabled in config.
pub struct NullSink;

impl SoundSink for NullSink {
    fn play(&self, _cue: Cue) {}
}
