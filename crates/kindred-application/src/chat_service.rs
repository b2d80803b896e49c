//! Chat service: the function-call contract a presentation layer consumes.
//!
//! Coordinates the persona registry, session store, streaming engine,
//! transcript store, preferences and the voice/avatar assists. One instance
//! serves the whole single-user application.

use std::sync::Arc;

use log::warn;
use tokio::sync::RwLock;

use kindred_core::persona::{Gender, Persona, PersonaDraft, PersonaPatch, PersonaRegistry};
use kindred_core::preferences::{PreferenceRepository, Preferences};
use kindred_core::transcript::{DeliveryStatus, Message, MessagePatch, TranscriptStore};
use kindred_core::{ChatState, KindredError, Result};
use kindred_interaction::{AvatarAssist, ChatEngine, ChatError, SessionStore, VoiceAssist};

/// The scripted in-character reply shown when an exchange fails.
pub const APOLOGY_MESSAGE: &str = "Something went wrong. Let's try that again?";

pub struct ChatService {
    registry: Arc<PersonaRegistry>,
    transcripts: Arc<TranscriptStore>,
    sessions: Arc<SessionStore>,
    engine: ChatEngine,
    voice: Arc<VoiceAssist>,
    avatars: AvatarAssist,
    preferences: RwLock<Preferences>,
    preference_repo: Arc<dyn PreferenceRepository>,
}

impl ChatService {
    pub async fn new(
        registry: Arc<PersonaRegistry>,
        transcripts: Arc<TranscriptStore>,
        sessions: Arc<SessionStore>,
        voice: Arc<VoiceAssist>,
        avatars: AvatarAssist,
        preference_repo: Arc<dyn PreferenceRepository>,
    ) -> Result<Self> {
        let preferences = preference_repo.load().await?;
        Ok(Self {
            engine: ChatEngine::new(sessions.clone()),
            registry,
            transcripts,
            sessions,
            voice,
            avatars,
            preferences: RwLock::new(preferences),
            preference_repo,
        })
    }

    /// The effective persona list: overridden built-ins, then user personas.
    pub async fn personas(&self) -> Vec<Persona> {
        self.registry.list().await
    }

    pub async fn persona(&self, id: &str) -> Result<Persona> {
        self.registry.get(id).await
    }

    pub async fn create_persona(&self, draft: PersonaDraft) -> Result<Persona> {
        self.registry.create(draft).await
    }

    /// Applies an edit and drops the persona's session so the change takes
    /// effect on the next send.
    pub async fn update_persona(&self, id: &str, patch: PersonaPatch) -> Result<Persona> {
        let persona = self.registry.update(id, patch).await?;
        self.sessions.reset(id).await;
        Ok(persona)
    }

    /// Deletes a user persona together with its session and transcript.
    pub async fn delete_persona(&self, id: &str) -> Result<()> {
        self.registry.remove(id).await?;
        self.sessions.reset(id).await;
        self.transcripts.clear(id).await
    }

    /// Opens a persona's transcript, seeding the greeting when it is empty.
    pub async fn open_persona(&self, id: &str) -> Result<Vec<Message>> {
        let persona = self.registry.get(id).await?;
        self.transcripts.open(&persona.id, &persona.name).await
    }

    /// The persona's current conversation status.
    pub async fn chat_state(&self, id: &str) -> ChatState {
        self.engine.state(id).await
    }

    /// Sends a user message and streams the reply into the transcript.
    ///
    /// Returns the transcript after the exchange. A send issued while the
    /// persona is not idle is rejected and leaves the transcript untouched;
    /// a failed exchange contributes the fixed apology reply instead of an
    /// error.
    pub async fn send_message(&self, persona_id: &str, text: &str) -> Result<Vec<Message>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KindredError::invalid("message text is empty"));
        }

        let persona = self.registry.get(persona_id).await?;
        let outcome = self.engine.send(&persona, text).await;
        if let Err(ChatError::Busy { .. }) = &outcome {
            // Rejected sends leave the transcript untouched.
            return Err(KindredError::invalid(format!(
                "conversation with '{persona_id}' is busy"
            )));
        }

        let user_message = Message::user(text);
        self.transcripts
            .append(persona_id, user_message.clone())
            .await?;

        match outcome {
            Ok(mut stream) => {
                let mut reply: Option<Message> = None;
                let mut full_text = String::new();
                let mut failed = false;

                while let Some(item) = stream.next().await {
                    match item {
                        Ok(fragment) => {
                            full_text.push_str(&fragment);
                            match &reply {
                                None => {
                                    let message = Message::model(full_text.clone());
                                    self.transcripts
                                        .append(persona_id, message.clone())
                                        .await?;
                                    reply = Some(message);
                                }
                                Some(message) => {
                                    self.transcripts
                                        .update(
                                            persona_id,
                                            &message.id,
                                            MessagePatch::content(full_text.clone()),
                                        )
                                        .await?;
                                }
                            }
                        }
                        Err(err) => {
                            warn!("exchange with '{persona_id}' failed: {err}");
                            failed = true;
                            break;
                        }
                    }
                }

                if failed {
                    self.record_apology(persona_id, reply.as_ref()).await?;
                } else {
                    self.transcripts
                        .update(
                            persona_id,
                            &user_message.id,
                            MessagePatch::status(DeliveryStatus::Seen),
                        )
                        .await?;
                    if self.preferences.read().await.auto_speak && !full_text.is_empty() {
                        let voice = self.voice.clone();
                        let voice_name = persona.voice.clone();
                        tokio::spawn(async move {
                            voice.speak(&full_text, &voice_name).await;
                        });
                    }
                }
            }
            Err(err) => {
                warn!("exchange with '{persona_id}' failed to start: {err}");
                self.record_apology(persona_id, None).await?;
            }
        }

        Ok(self
            .transcripts
            .load(persona_id)
            .await?
            .unwrap_or_default())
    }

    /// A failed exchange ends with exactly one model message carrying the
    /// apology text: the partial reply is overwritten, or a fresh message is
    /// appended when no fragment ever arrived.
    async fn record_apology(&self, persona_id: &str, partial: Option<&Message>) -> Result<()> {
        match partial {
            Some(message) => {
                self.transcripts
                    .update(
                        persona_id,
                        &message.id,
                        MessagePatch::content(APOLOGY_MESSAGE),
                    )
                    .await?;
            }
            None => {
                self.transcripts
                    .append(persona_id, Message::model(APOLOGY_MESSAGE))
                    .await?;
            }
        }
        Ok(())
    }

    /// Speaks arbitrary transcript text with a persona's voice. Best-effort.
    pub async fn speak_message(&self, persona_id: &str, text: &str) -> Result<()> {
        let persona = self.registry.get(persona_id).await?;
        self.voice.speak(text, &persona.voice).await;
        Ok(())
    }

    pub async fn auto_speak(&self) -> bool {
        self.preferences.read().await.auto_speak
    }

    pub async fn set_auto_speak(&self, enabled: bool) -> Result<()> {
        let mut preferences = self.preferences.write().await;
        preferences.auto_speak = enabled;
        self.preference_repo.save(&preferences).await
    }

    /// Generates an avatar portrait, or `None` when the capability has
    /// nothing usable (callers fall back to a placeholder).
    pub async fn generate_avatar(
        &self,
        name: &str,
        role: &str,
        gender: Gender,
    ) -> Option<String> {
        self.avatars.generate(name, role, gender).await
    }
}
