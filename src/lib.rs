mod ai;
mod commands;
mod db;
mod session;
mod text;
mod tts;

use commands::{PendingAudio, Sessions};
use db::Database;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .setup(|app| {
            let app_dir = app.path().app_data_dir()?;
            let database =
                Database::new(&app_dir).expect("Failed to initialize database");
            app.manage(database);
            app.manage(Sessions::default());
            app.manage(PendingAudio::default());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::story::create_story,
            commands::story::list_stories,
            commands::story::get_story,
            commands::story::rename_story,
            commands::story::delete_story,
            commands::story::set_contextual_prompt,
            commands::story::save_checkpoint,
            commands::story::list_versions,
            commands::story::revert_version,
            commands::story::step_back,
            commands::story::step_forward,
            commands::edit::locate_selection,
            commands::edit::restore_selection,
            commands::edit::begin_edit,
            commands::edit::request_edit,
            commands::edit::retry_edit,
            commands::edit::apply_edit,
            commands::edit::cancel_edit,
            commands::edit::slash_insert,
            commands::edit::generate_story,
            commands::audio::list_voices,
            commands::audio::generate_audio,
            commands::audio::list_audio_history,
            commands::audio::get_audio_data,
            commands::settings::get_settings,
            commands::settings::set_setting,
            commands::settings::delete_setting,
            commands::settings::clear_database,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
