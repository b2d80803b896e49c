//! End-to-end tests of the chat service over scripted capabilities and
//! in-memory or temp-dir persistence.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kindred_application::{APOLOGY_MESSAGE, ChatService};
use kindred_core::persona::{
    Gender, OverrideRepository, Persona, PersonaDraft, PersonaPatch, PersonaRegistry,
    UserPersonaRepository,
};
use kindred_core::preferences::{PreferenceRepository, Preferences};
use kindred_core::transcript::{
    DeliveryStatus, Message, MessageRole, TranscriptRepository, TranscriptStore,
};
use kindred_core::{ChatState, Result};
use kindred_infrastructure::{
    JsonFileStore, JsonOverrideRepository, JsonPreferenceRepository, JsonTranscriptRepository,
    JsonUserPersonaRepository,
};
use kindred_interaction::{
    AudioBuffer, AudioSink, AvatarAssist, ChatCapability, ChatError, GenerationError,
    ImageCapability, ReplyStream, SessionHandle, SessionStore, SpeechCapability, SynthesisError,
    VoiceAssist,
};

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Script {
    /// Stream these fragments, then end normally.
    Reply(Vec<&'static str>),
    /// Stream these fragments, then fail.
    FailAfter(Vec<&'static str>),
}

struct ScriptedChat {
    scripts: Mutex<VecDeque<Script>>,
    opened: AtomicUsize,
}

impl ScriptedChat {
    fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            opened: AtomicUsize::new(0),
        })
    }

    fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChatCapability for ScriptedChat {
    async fn open_session(
        &self,
        system_instruction: &str,
        temperature: f32,
    ) -> std::result::Result<SessionHandle, ChatError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(SessionHandle::new(system_instruction, temperature))
    }

    async fn stream_message(
        &self,
        _session: &SessionHandle,
        _text: &str,
    ) -> std::result::Result<ReplyStream, ChatError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Reply(vec!["Hey ", "you!"]));

        let (tx, stream) = ReplyStream::channel();
        tokio::spawn(async move {
            match script {
                Script::Reply(fragments) => {
                    for fragment in fragments {
                        if tx.send(Ok(fragment.to_string())).await.is_err() {
                            return;
                        }
                    }
                }
                Script::FailAfter(fragments) => {
                    for fragment in fragments {
                        if tx.send(Ok(fragment.to_string())).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx
                        .send(Err(ChatError::Interrupted("scripted failure".to_string())))
                        .await;
                }
            }
        });
        Ok(stream)
    }
}

struct SilentSpeech;

#[async_trait::async_trait]
impl SpeechCapability for SilentSpeech {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
    ) -> std::result::Result<Vec<u8>, SynthesisError> {
        Ok(vec![0x00, 0x00, 0xFF, 0x7F])
    }
}

#[derive(Default)]
struct RecordingSink {
    played: Mutex<Vec<AudioBuffer>>,
}

#[async_trait::async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, buffer: AudioBuffer) -> std::result::Result<(), SynthesisError> {
        self.played.lock().unwrap().push(buffer);
        Ok(())
    }
}

struct NoImages;

#[async_trait::async_trait]
impl ImageCapability for NoImages {
    async fn generate(
        &self,
        _prompt: &str,
    ) -> std::result::Result<Option<String>, GenerationError> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// In-memory persistence
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemOverrides(Mutex<HashMap<String, PersonaPatch>>);

#[async_trait::async_trait]
impl OverrideRepository for MemOverrides {
    async fn load(&self) -> Result<HashMap<String, PersonaPatch>> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn save(&self, overrides: &HashMap<String, PersonaPatch>) -> Result<()> {
        *self.0.lock().unwrap() = overrides.clone();
        Ok(())
    }
}

#[derive(Default)]
struct MemUsers(Mutex<Vec<Persona>>);

#[async_trait::async_trait]
impl UserPersonaRepository for MemUsers {
    async fn load(&self) -> Result<Vec<Persona>> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn save(&self, personas: &[Persona]) -> Result<()> {
        *self.0.lock().unwrap() = personas.to_vec();
        Ok(())
    }
}

#[derive(Default)]
struct MemTranscripts(Mutex<HashMap<String, Vec<Message>>>);

#[async_trait::async_trait]
impl TranscriptRepository for MemTranscripts {
    async fn load(&self, persona_id: &str) -> Result<Option<Vec<Message>>> {
        Ok(self.0.lock().unwrap().get(persona_id).cloned())
    }

    async fn save(&self, persona_id: &str, messages: &[Message]) -> Result<()> {
        self.0
            .lock()
            .unwrap()
            .insert(persona_id.to_string(), messages.to_vec());
        Ok(())
    }

    async fn delete(&self, persona_id: &str) -> Result<()> {
        self.0.lock().unwrap().remove(persona_id);
        Ok(())
    }
}

#[derive(Default)]
struct MemPreferences(Mutex<Preferences>);

#[async_trait::async_trait]
impl PreferenceRepository for MemPreferences {
    async fn load(&self) -> Result<Preferences> {
        Ok(*self.0.lock().unwrap())
    }

    async fn save(&self, preferences: &Preferences) -> Result<()> {
        *self.0.lock().unwrap() = *preferences;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

struct Harness {
    service: ChatService,
    chat: Arc<ScriptedChat>,
    sink: Arc<RecordingSink>,
    preference_repo: Arc<MemPreferences>,
}

async fn harness(scripts: Vec<Script>) -> Harness {
    let chat = ScriptedChat::new(scripts);
    let sink = Arc::new(RecordingSink::default());
    let preference_repo = Arc::new(MemPreferences::default());

    let registry = Arc::new(
        PersonaRegistry::load(
            Arc::new(MemOverrides::default()),
            Arc::new(MemUsers::default()),
        )
        .await
        .unwrap(),
    );
    let transcripts = Arc::new(TranscriptStore::new(Arc::new(MemTranscripts::default())));
    let sessions = Arc::new(SessionStore::new(chat.clone()));
    let voice = Arc::new(VoiceAssist::new(Arc::new(SilentSpeech), sink.clone()));
    let avatars = AvatarAssist::new(Arc::new(NoImages));

    let service = ChatService::new(
        registry,
        transcripts,
        sessions,
        voice,
        avatars,
        preference_repo.clone(),
    )
    .await
    .unwrap();

    Harness {
        service,
        chat,
        sink,
        preference_repo,
    }
}

fn friend_draft(name: &str) -> PersonaDraft {
    PersonaDraft {
        name: name.to_string(),
        role: "Best Friend".to_string(),
        gender: Gender::Female,
        description: "Always around.".to_string(),
        system_prompt: format!("You are {name}, the user's best friend."),
        avatar: None,
        color: None,
        voice: None,
    }
}

// ---------------------------------------------------------------------------
// Scenario: the husband conversation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_opening_husband_seeds_greeting() {
    let h = harness(vec![]).await;

    let messages = h.service.open_persona("husband").await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::Model);
    assert!(
        messages[0]
            .content
            .starts_with("Hi! it's me, Bilal Abbas Khan.")
    );

    // Idempotent: a second open returns the persisted message unchanged.
    let again = h.service.open_persona("husband").await.unwrap();
    assert_eq!(again, messages);
}

#[tokio::test]
async fn test_send_hi_completes_exchange() {
    let h = harness(vec![Script::Reply(vec!["Hey ", "honey! ", "How are you?"])]).await;

    h.service.open_persona("husband").await.unwrap();
    let messages = h.service.send_message("husband", "hi").await.unwrap();

    // Greeting + user message + streamed reply.
    assert_eq!(messages.len(), 3);

    let user = &messages[1];
    assert_eq!(user.role, MessageRole::User);
    assert_eq!(user.content, "hi");
    assert_eq!(user.status, Some(DeliveryStatus::Seen));

    let reply = &messages[2];
    assert_eq!(reply.role, MessageRole::Model);
    assert_eq!(reply.content, "Hey honey! How are you?");

    assert_eq!(h.service.chat_state("husband").await, ChatState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failed_exchange_leaves_apology_and_recovers() {
    let h = harness(vec![Script::FailAfter(vec![])]).await;

    h.service.open_persona("husband").await.unwrap();
    let messages = h.service.send_message("husband", "hi").await.unwrap();

    // Greeting + user message + the fixed apology reply.
    assert_eq!(messages.len(), 3);
    let apology = &messages[2];
    assert_eq!(apology.role, MessageRole::Model);
    assert_eq!(apology.content, APOLOGY_MESSAGE);

    assert_eq!(h.service.chat_state("husband").await, ChatState::Error);

    // The state machine auto-recovers after the fixed delay.
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(h.service.chat_state("husband").await, ChatState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_mid_stream_failure_replaces_partial_with_apology() {
    let h = harness(vec![Script::FailAfter(vec!["I was just thi"])]).await;

    h.service.open_persona("husband").await.unwrap();
    let messages = h.service.send_message("husband", "hi").await.unwrap();

    // The partial reply is replaced, not kept alongside the apology.
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].content, APOLOGY_MESSAGE);
    assert_eq!(
        messages
            .iter()
            .filter(|m| m.role == MessageRole::Model)
            .count(),
        2 // greeting + apology
    );
}

#[tokio::test]
async fn test_empty_send_is_rejected() {
    let h = harness(vec![]).await;
    h.service.open_persona("husband").await.unwrap();

    assert!(h.service.send_message("husband", "   ").await.is_err());
    let messages = h.service.open_persona("husband").await.unwrap();
    assert_eq!(messages.len(), 1);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_session_reused_across_sends() {
    let h = harness(vec![
        Script::Reply(vec!["one"]),
        Script::Reply(vec!["two"]),
    ])
    .await;

    h.service.open_persona("husband").await.unwrap();
    h.service.send_message("husband", "first").await.unwrap();
    h.service.send_message("husband", "second").await.unwrap();

    assert_eq!(h.chat.sessions_opened(), 1);
}

#[tokio::test]
async fn test_persona_edit_takes_effect_on_next_send() {
    let h = harness(vec![
        Script::Reply(vec!["one"]),
        Script::Reply(vec!["two"]),
    ])
    .await;

    h.service.open_persona("husband").await.unwrap();
    h.service.send_message("husband", "first").await.unwrap();

    h.service
        .update_persona(
            "husband",
            PersonaPatch {
                system_prompt: Some("You are in a hurry today.".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    h.service.send_message("husband", "second").await.unwrap();
    // The edit forced a fresh provider session.
    assert_eq!(h.chat.sessions_opened(), 2);
}

// ---------------------------------------------------------------------------
// Persona lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_delete_cascades_and_recreation_gets_new_id() {
    let h = harness(vec![Script::Reply(vec!["hi!"])]).await;

    let created = h.service.create_persona(friend_draft("Nadia")).await.unwrap();
    assert_eq!(h.service.personas().await.len(), 7);

    h.service.open_persona(&created.id).await.unwrap();
    h.service.send_message(&created.id, "hello").await.unwrap();

    h.service.delete_persona(&created.id).await.unwrap();
    assert_eq!(h.service.personas().await.len(), 6);
    assert!(h.service.persona(&created.id).await.is_err());

    // Re-creating with the same name yields a distinct identity with a
    // fresh (greeting-only) transcript.
    let recreated = h.service.create_persona(friend_draft("Nadia")).await.unwrap();
    assert_ne!(recreated.id, created.id);
    let messages = h.service.open_persona(&recreated.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].content.contains("Nadia"));
}

#[tokio::test]
async fn test_builtin_delete_is_rejected() {
    let h = harness(vec![]).await;
    let err = h.service.delete_persona("husband").await.unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(h.service.personas().await.len(), 6);
}

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn test_auto_speak_plays_completed_reply() {
    let h = harness(vec![Script::Reply(vec!["Hey you"])]).await;
    h.service.set_auto_speak(true).await.unwrap();

    h.service.open_persona("husband").await.unwrap();
    h.service.send_message("husband", "hi").await.unwrap();

    // Playback is fire-and-forget; give the spawned task a moment.
    for _ in 0..100 {
        if !h.sink.played.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.sink.played.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_auto_speak_off_by_default() {
    let h = harness(vec![Script::Reply(vec!["Hey you"])]).await;
    assert!(!h.service.auto_speak().await);

    h.service.open_persona("husband").await.unwrap();
    h.service.send_message("husband", "hi").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.sink.played.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_set_auto_speak_persists() {
    let h = harness(vec![]).await;
    h.service.set_auto_speak(true).await.unwrap();
    assert!(h.preference_repo.0.lock().unwrap().auto_speak);
    assert!(h.service.auto_speak().await);
}

// ---------------------------------------------------------------------------
// Persistence across restarts (JSON-backed stack)
// ---------------------------------------------------------------------------

async fn json_service(dir: &std::path::Path, chat: Arc<ScriptedChat>) -> ChatService {
    let store = JsonFileStore::new(dir);
    let registry = Arc::new(
        PersonaRegistry::load(
            Arc::new(JsonOverrideRepository::new(store.clone())),
            Arc::new(JsonUserPersonaRepository::new(store.clone())),
        )
        .await
        .unwrap(),
    );
    let transcripts = Arc::new(TranscriptStore::new(Arc::new(
        JsonTranscriptRepository::new(store.clone()),
    )));
    let sessions = Arc::new(SessionStore::new(chat));
    let voice = Arc::new(VoiceAssist::new(
        Arc::new(SilentSpeech),
        Arc::new(RecordingSink::default()),
    ));
    let avatars = AvatarAssist::new(Arc::new(NoImages));

    ChatService::new(
        registry,
        transcripts,
        sessions,
        voice,
        avatars,
        Arc::new(JsonPreferenceRepository::new(store)),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_transcript_and_personas_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let first = json_service(
        dir.path(),
        ScriptedChat::new(vec![Script::Reply(vec!["Hey love!"])]),
    )
    .await;
    let created = first.create_persona(friend_draft("Nadia")).await.unwrap();
    first.open_persona("husband").await.unwrap();
    let sent = first.send_message("husband", "hi").await.unwrap();
    first.set_auto_speak(true).await.unwrap();
    drop(first);

    // A new service over the same directory sees everything, in order.
    let second = json_service(dir.path(), ScriptedChat::new(vec![])).await;
    assert_eq!(second.personas().await.len(), 7);
    assert!(second.persona(&created.id).await.is_ok());
    assert!(second.auto_speak().await);

    let restored = second.open_persona("husband").await.unwrap();
    assert_eq!(restored, sent);
}
