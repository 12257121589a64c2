//! Audio playback for phase completion.

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to initialize audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("Failed to play audio: {0}")]
    Play(#[from] rodio::PlayError),
}

pub struct AudioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioPlayer {
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Plays the completion tone. Failures are logged, never returned.
    pub fn play_chime(&self) {
        if let Err(e) = self.play_tone() {
            warn!(error = %e, "Could not play notification sound");
        }
    }

    /// Half a second of 800 Hz that fades out.
    fn play_tone(&self) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)?;

        let mut tone = SineWave::new(800.0).take_duration(Duration::from_millis(500));
        tone.set_filter_fadeout();

        sink.append(tone.amplify(0.3));
        sink.detach();

        Ok(())
    }
}
