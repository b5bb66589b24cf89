pub mod audio;
pub mod edit;
pub mod settings;
pub mod story;

use crate::ai::openai::{self, OpenAiConfig};
use crate::db::Database;
use crate::session::EditSessions;
use crate::tts::elevenlabs::{self, ElevenLabsConfig};
use std::collections::HashSet;
use std::sync::Mutex;

/// Managed state: edit sessions keyed by story id.
#[derive(Default)]
pub struct Sessions(pub Mutex<EditSessions>);

/// Managed state: stories with a synthesis call in flight.
#[derive(Default)]
pub struct PendingAudio(pub Mutex<HashSet<String>>);

pub(crate) fn openai_config(db: &Database) -> Result<OpenAiConfig, String> {
    let api_key = db
        .get_setting("openai_api_key")
        .ok()
        .flatten()
        .ok_or("OpenAI API key not configured")?;
    let base_url = db
        .get_setting("openai_base_url")
        .ok()
        .flatten()
        .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string());
    Ok(OpenAiConfig { api_key, base_url })
}

pub(crate) fn elevenlabs_config(db: &Database) -> Result<ElevenLabsConfig, String> {
    let api_key = db
        .get_setting("elevenlabs_api_key")
        .ok()
        .flatten()
        .ok_or("ElevenLabs API key not configured")?;
    let base_url = db
        .get_setting("elevenlabs_base_url")
        .ok()
        .flatten()
        .unwrap_or_else(|| elevenlabs::DEFAULT_BASE_URL.to_string());
    Ok(ElevenLabsConfig { api_key, base_url })
}
