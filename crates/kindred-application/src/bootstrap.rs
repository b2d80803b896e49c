//! Default wiring: Gemini provider + JSON persistence under the user config
//! directory.

use std::sync::Arc;

use anyhow::{Context, Result};

use kindred_core::persona::PersonaRegistry;
use kindred_core::transcript::TranscriptStore;
use kindred_infrastructure::{
    JsonFileStore, JsonOverrideRepository, JsonPreferenceRepository, JsonTranscriptRepository,
    JsonUserPersonaRepository, KindredPaths,
};
use kindred_interaction::{AudioSink, AvatarAssist, GeminiClient, SessionStore, VoiceAssist};

use crate::chat_service::ChatService;

/// Builds a [`ChatService`] over the default local stack.
///
/// Fails fast when the provider credential is missing; nothing works without
/// the chat capability. The audio sink is the one platform piece the caller
/// must supply.
pub async fn bootstrap(sink: Arc<dyn AudioSink>) -> Result<ChatService> {
    let state_dir = KindredPaths::state_dir().map_err(anyhow::Error::new)?;
    let store = JsonFileStore::new(state_dir);

    let registry = Arc::new(
        PersonaRegistry::load(
            Arc::new(JsonOverrideRepository::new(store.clone())),
            Arc::new(JsonUserPersonaRepository::new(store.clone())),
        )
        .await
        .context("loading persona collections")?,
    );
    let transcripts = Arc::new(TranscriptStore::new(Arc::new(
        JsonTranscriptRepository::new(store.clone()),
    )));

    let gemini = Arc::new(GeminiClient::from_config().context("resolving provider credentials")?);
    let sessions = Arc::new(SessionStore::new(gemini.clone()));
    let voice = Arc::new(VoiceAssist::new(gemini.clone(), sink));
    let avatars = AvatarAssist::new(gemini);

    let service = ChatService::new(
        registry,
        transcripts,
        sessions,
        voice,
        avatars,
        Arc::new(JsonPreferenceRepository::new(store)),
    )
    .await
    .context("loading preferences")?;
    Ok(service)
}
