//! Voice and avatar assist: best-effort companions to the chat flow.
//!
//! Neither feature may block or fail the conversation. Synthesis and
//! generation failures are logged and swallowed; the user simply hears or
//! sees nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use kindred_core::persona::Gender;

use crate::error::SynthesisError;
use crate::provider::{ImageCapability, SpeechCapability};

/// Sample rate of the synthesis capability's PCM output.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Decoded audio ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

/// The playback device, injected by the presentation layer.
///
/// `play` resolves when playback finishes (or is handed off to the platform
/// mixer); the voice assist holds its single-playback slot until then.
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, buffer: AudioBuffer) -> Result<(), SynthesisError>;
}

/// Decodes little-endian 16-bit PCM into normalized float samples.
pub fn decode_pcm16(data: &[u8], sample_rate: u32, channels: u16) -> AudioBuffer {
    let samples = data
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();
    AudioBuffer {
        sample_rate,
        channels,
        samples,
    }
}

/// Speaks text with a persona's voice, one playback at a time.
pub struct VoiceAssist {
    speech: Arc<dyn SpeechCapability>,
    sink: Arc<dyn AudioSink>,
    playing: AtomicBool,
}

impl VoiceAssist {
    pub fn new(speech: Arc<dyn SpeechCapability>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            speech,
            sink,
            playing: AtomicBool::new(false),
        }
    }

    /// Whether a playback is currently in flight.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Synthesizes `text` and plays it. Best-effort: never returns an error.
    ///
    /// Playbacks never overlap: a `speak` issued while one is in flight is
    /// dropped before the synthesis call.
    pub async fn speak(&self, text: &str, voice: &str) {
        if self.playing.swap(true, Ordering::SeqCst) {
            debug!("playback already in progress, dropping speak request");
            return;
        }

        if let Err(err) = self.speak_inner(text, voice).await {
            warn!("speech synthesis failed: {err}");
        }
        self.playing.store(false, Ordering::SeqCst);
    }

    async fn speak_inner(&self, text: &str, voice: &str) -> Result<(), SynthesisError> {
        let pcm = self.speech.synthesize(text, voice).await?;
        let buffer = decode_pcm16(&pcm, SPEECH_SAMPLE_RATE, 1);
        self.sink.play(buffer).await
    }
}

/// Generates avatar portraits for the persona editor.
pub struct AvatarAssist {
    images: Arc<dyn ImageCapability>,
}

impl AvatarAssist {
    pub fn new(images: Arc<dyn ImageCapability>) -> Self {
        Self { images }
    }

    /// Returns an inline image reference, or `None` when the capability
    /// produced nothing usable (callers fall back to a placeholder avatar).
    pub async fn generate(&self, name: &str, role: &str, gender: Gender) -> Option<String> {
        let prompt = avatar_prompt(name, role, gender);
        match self.images.generate(&prompt).await {
            Ok(image) => image,
            Err(err) => {
                warn!("avatar generation failed: {err}");
                None
            }
        }
    }
}

fn avatar_prompt(name: &str, role: &str, gender: Gender) -> String {
    format!(
        "A professional, high-quality profile picture avatar for a character named {name} who is a {role}.\n\
         The character is {gender}.\n\
         Style: Modern, clean, cinematic lighting, soft background, realistic but stylized.\n\
         The avatar should be centered and suitable for a chat application profile.",
        gender = gender.as_str(),
    )
}
