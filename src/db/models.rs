use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub title: String,
    pub content: String,
    pub contextual_prompt: String,
    pub current_version_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Character range replaced by an edit, in char offsets into the
/// story content.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct EditedRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StoryVersion {
    pub id: String,
    pub story_id: String,
    pub content: String,
    pub edit_type: String,
    pub edit_prompt: Option<String>,
    pub edited_range: Option<EditedRange>,
    pub created_at: String,
}

/// Audio row metadata. The payload stays in the database and is
/// fetched separately via `get_audio_data`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AudioFileInfo {
    pub id: String,
    pub story_id: String,
    pub version_id: String,
    pub voice_id: String,
    pub duration: f64,
    pub created_at: String,
}
