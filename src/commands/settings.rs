use crate::db::Database;
use std::collections::HashMap;
use tauri::State;

const SETTING_KEYS: &[&str] = &[
    "openai_api_key",
    "openai_base_url",
    "elevenlabs_api_key",
    "elevenlabs_base_url",
    "selected_voice",
    "auto_save",
    "max_version_history",
];

/// Keeps the first and last four chars of a stored key for display.
/// Char-based, since stored values are arbitrary strings; values of
/// eight chars or fewer are returned as-is.
fn mask_key(value: &str) -> Option<String> {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return None;
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    Some(format!("{head}...{tail}"))
}

#[tauri::command]
pub fn get_settings(db: State<'_, Database>) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();
    for key in SETTING_KEYS {
        if let Some(value) = db.get_setting(key).map_err(|e| e.to_string())? {
            // Mask API keys for display
            if key.ends_with("_api_key") {
                let masked = mask_key(&value).unwrap_or(value);
                map.insert(key.to_string(), masked);
            } else {
                map.insert(key.to_string(), value);
            }
        }
    }
    Ok(map)
}

#[tauri::command]
pub fn set_setting(db: State<'_, Database>, key: String, value: String) -> Result<(), String> {
    if !SETTING_KEYS.contains(&key.as_str()) {
        return Err(format!("Unknown setting key: {}", key));
    }
    db.set_setting(&key, &value).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_setting(db: State<'_, Database>, key: String) -> Result<(), String> {
    let conn = db.conn.lock().unwrap();
    conn.execute("DELETE FROM settings WHERE key = ?1", rusqlite::params![key])
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// Wipes stories, versions, audio files and settings.
#[tauri::command]
pub fn clear_database(db: State<'_, Database>) -> Result<(), String> {
    db.clear_all().map_err(|e| e.to_string())
}
