use super::{elevenlabs_config, PendingAudio};
use crate::db::models::AudioFileInfo;
use crate::db::Database;
use crate::tts::{self, elevenlabs, TtsOptions, Voice};
use base64::Engine;
use log::warn;
use tauri::State;

const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

#[tauri::command]
pub async fn list_voices(db: State<'_, Database>) -> Result<Vec<Voice>, String> {
    let config = elevenlabs_config(&db)?;
    elevenlabs::get_voices(&config)
        .await
        .map_err(|e| e.to_string())
}

/// Narrates the current story content. One synthesis call per story
/// at a time; a second trigger while one is pending is refused.
#[tauri::command]
pub async fn generate_audio(
    db: State<'_, Database>,
    pending: State<'_, PendingAudio>,
    story_id: String,
) -> Result<AudioFileInfo, String> {
    if !pending.0.lock().unwrap().insert(story_id.clone()) {
        return Err("Audio generation already in progress for this story".to_string());
    }

    let result = synthesize_story(&db, &story_id).await;
    pending.0.lock().unwrap().remove(&story_id);
    result
}

async fn synthesize_story(db: &Database, story_id: &str) -> Result<AudioFileInfo, String> {
    let story = db
        .get_story(story_id)
        .map_err(|e| e.to_string())?
        .ok_or("Story not found")?;
    let config = elevenlabs_config(db)?;
    let voice_id = db
        .get_setting("selected_voice")
        .ok()
        .flatten()
        .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string());
    let options = TtsOptions::default();

    let payload = elevenlabs::synthesize(&config, &story.content, &voice_id, &options)
        .await
        .map_err(|e| {
            warn!("speech synthesis failed for story {story_id}: {e}");
            e.to_string()
        })?;

    let duration = tts::estimate_duration(payload.len(), &options.output_format);
    db.add_audio_file(
        story_id,
        &story.current_version_id,
        &voice_id,
        &payload,
        duration,
    )
    .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_audio_history(
    db: State<'_, Database>,
    story_id: String,
) -> Result<Vec<AudioFileInfo>, String> {
    db.list_audio_files(&story_id).map_err(|e| e.to_string())
}

/// Base64 payload for playback or download in the webview.
#[tauri::command]
pub fn get_audio_data(db: State<'_, Database>, audio_id: String) -> Result<String, String> {
    let data = db
        .get_audio_data(&audio_id)
        .map_err(|e| e.to_string())?
        .ok_or("Audio file not found")?;
    Ok(base64::engine::general_purpose::STANDARD.encode(data))
}
