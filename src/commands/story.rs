use crate::db::models::{Story, StoryVersion};
use crate::db::Database;
use tauri::State;

const DEFAULT_TITLE: &str = "Untitled Story";

#[tauri::command]
pub fn create_story(
    db: State<'_, Database>,
    title: Option<String>,
    content: Option<String>,
) -> Result<Story, String> {
    db.create_story(
        title.as_deref().unwrap_or(DEFAULT_TITLE),
        content.as_deref().unwrap_or(""),
    )
    .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_stories(db: State<'_, Database>) -> Result<Vec<Story>, String> {
    db.list_stories().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_story(db: State<'_, Database>, id: String) -> Result<Option<Story>, String> {
    db.get_story(&id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn rename_story(db: State<'_, Database>, id: String, title: String) -> Result<(), String> {
    db.rename_story(&id, &title).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_story(db: State<'_, Database>, id: String) -> Result<(), String> {
    db.delete_story(&id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_contextual_prompt(
    db: State<'_, Database>,
    id: String,
    prompt: String,
) -> Result<(), String> {
    db.set_contextual_prompt(&id, &prompt)
        .map_err(|e| e.to_string())
}

/// Debounced typing checkpoint. Appends a `user` version when the
/// autosave preference is on (the default); otherwise only the live
/// content is updated.
#[tauri::command]
pub fn save_checkpoint(
    db: State<'_, Database>,
    story_id: String,
    content: String,
) -> Result<Option<StoryVersion>, String> {
    let autosave = db
        .get_setting("auto_save")
        .ok()
        .flatten()
        .map(|v| v != "false")
        .unwrap_or(true);
    if autosave {
        db.append_version(&story_id, &content, "user", None, None)
            .map(Some)
            .map_err(|e| e.to_string())
    } else {
        db.update_story_content(&story_id, &content)
            .map(|_| None)
            .map_err(|e| e.to_string())
    }
}

#[tauri::command]
pub fn list_versions(
    db: State<'_, Database>,
    story_id: String,
) -> Result<Vec<StoryVersion>, String> {
    db.list_versions(&story_id).map_err(|e| e.to_string())
}

/// Re-applies a historical snapshot by appending a new version with
/// the same content. History is never truncated.
#[tauri::command]
pub fn revert_version(
    db: State<'_, Database>,
    story_id: String,
    version_id: String,
) -> Result<Story, String> {
    let version = db
        .get_version(&version_id)
        .map_err(|e| e.to_string())?
        .ok_or("Version not found")?;
    if version.story_id != story_id {
        return Err("Version does not belong to this story".to_string());
    }
    db.append_version(&story_id, &version.content, "user", None, None)
        .map_err(|e| e.to_string())?;
    db.get_story(&story_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Story not found".to_string())
}

fn step(db: &Database, story_id: &str, delta: i64) -> Result<Story, String> {
    let story = db
        .get_story(story_id)
        .map_err(|e| e.to_string())?
        .ok_or("Story not found")?;
    let versions = db
        .list_versions_chronological(story_id)
        .map_err(|e| e.to_string())?;
    let cursor = versions
        .iter()
        .position(|v| v.id == story.current_version_id)
        .ok_or("Current version missing from history")?;
    // Clamp at both ends; a step past the end is a no-op.
    let target = (cursor as i64 + delta).clamp(0, versions.len() as i64 - 1) as usize;
    if target != cursor {
        db.set_current_version(story_id, &versions[target].id)
            .map_err(|e| e.to_string())?;
    }
    db.get_story(story_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Story not found".to_string())
}

#[tauri::command]
pub fn step_back(db: State<'_, Database>, story_id: String) -> Result<Story, String> {
    step(&db, &story_id, -1)
}

#[tauri::command]
pub fn step_forward(db: State<'_, Database>, story_id: String) -> Result<Story, String> {
    step(&db, &story_id, 1)
}
