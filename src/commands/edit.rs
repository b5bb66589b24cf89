use super::{openai_config, Sessions};
use crate::ai::openai;
use crate::db::models::{EditedRange, Story};
use crate::db::Database;
use crate::session::GenerationTicket;
use crate::text::{self, NodePosition};
use log::{info, warn};
use tauri::State;

/// Maps a selection anchor reported by the webview (text node index +
/// offset within that node) to a char offset into the story content.
#[tauri::command]
pub fn locate_selection(nodes: Vec<String>, position: NodePosition) -> usize {
    text::locate(&nodes, position)
}

/// Inverse of `locate_selection`, used to restore the caret after the
/// editor re-renders.
#[tauri::command]
pub fn restore_selection(nodes: Vec<String>, offset: usize) -> NodePosition {
    text::restore(&nodes, offset)
}

/// Opens an edit interaction for the selected text. Replaces any
/// previous interaction on the same story.
#[tauri::command]
pub fn begin_edit(
    sessions: State<'_, Sessions>,
    story_id: String,
    nodes: Vec<String>,
    anchor: NodePosition,
    selected_text: String,
) -> EditedRange {
    let start = text::locate(&nodes, anchor);
    let range = EditedRange {
        start,
        end: start + selected_text.chars().count(),
    };
    sessions
        .0
        .lock()
        .unwrap()
        .begin(&story_id, range, selected_text);
    range
}

async fn run_edit_generation(
    db: &Database,
    sessions: &Sessions,
    story_id: &str,
    ticket: GenerationTicket,
) -> Result<Option<String>, String> {
    let story = db
        .get_story(story_id)
        .map_err(|e| e.to_string())?
        .ok_or("Story not found")?;
    let config = openai_config(db)?;
    let contextual = (!story.contextual_prompt.is_empty()).then_some(story.contextual_prompt.as_str());

    let result = openai::edit_story(
        &config,
        &story.content,
        &ticket.selected_text,
        ticket.range.start,
        ticket.range.end,
        &ticket.instruction,
        contextual,
    )
    .await;

    match result {
        Ok(candidate) => {
            let mut sessions = sessions.0.lock().unwrap();
            if sessions.complete_generation(story_id, ticket.token, candidate.clone()) {
                Ok(Some(candidate))
            } else {
                info!("discarding stale edit generation for story {story_id}");
                Ok(None)
            }
        }
        Err(e) => {
            warn!("edit generation failed for story {story_id}: {e}");
            sessions
                .0
                .lock()
                .unwrap()
                .fail_generation(story_id, ticket.token);
            Err(e.to_string())
        }
    }
}

/// Requests a replacement for the current selection. Returns the
/// candidate text, or None when the interaction was canceled while
/// the request was in flight.
#[tauri::command]
pub async fn request_edit(
    db: State<'_, Database>,
    sessions: State<'_, Sessions>,
    story_id: String,
    instruction: String,
) -> Result<Option<String>, String> {
    let ticket = sessions
        .0
        .lock()
        .unwrap()
        .start_generation(&story_id, &instruction)
        .map_err(|e| e.to_string())?;
    run_edit_generation(&db, &sessions, &story_id, ticket).await
}

/// Discards the previewed candidate and regenerates with the same
/// instruction.
#[tauri::command]
pub async fn retry_edit(
    db: State<'_, Database>,
    sessions: State<'_, Sessions>,
    story_id: String,
) -> Result<Option<String>, String> {
    let ticket = sessions
        .0
        .lock()
        .unwrap()
        .retry(&story_id)
        .map_err(|e| e.to_string())?;
    run_edit_generation(&db, &sessions, &story_id, ticket).await
}

/// Splices the previewed candidate into the story and commits a `gpt`
/// version. The session is only closed once the append has persisted.
#[tauri::command]
pub fn apply_edit(
    db: State<'_, Database>,
    sessions: State<'_, Sessions>,
    story_id: String,
) -> Result<Story, String> {
    let edit = sessions
        .0
        .lock()
        .unwrap()
        .pending_edit(&story_id)
        .map_err(|e| e.to_string())?;
    let story = db
        .get_story(&story_id)
        .map_err(|e| e.to_string())?
        .ok_or("Story not found")?;
    let new_content = text::splice(&story.content, edit.range.start, edit.range.end, &edit.candidate);
    db.append_version(
        &story_id,
        &new_content,
        "gpt",
        edit.instruction.as_deref(),
        Some(edit.range),
    )
    .map_err(|e| e.to_string())?;
    sessions.0.lock().unwrap().cancel(&story_id);
    db.get_story(&story_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Story not found".to_string())
}

/// Dismisses the interaction. Any in-flight generation result will be
/// dropped when it resolves.
#[tauri::command]
pub fn cancel_edit(sessions: State<'_, Sessions>, story_id: String) {
    sessions.0.lock().unwrap().cancel(&story_id);
}

/// Slash-command insertion: generates content for a point in the
/// document and applies it immediately (no preview step). Returns
/// None when the interaction was canceled mid-flight.
#[tauri::command]
pub async fn slash_insert(
    db: State<'_, Database>,
    sessions: State<'_, Sessions>,
    story_id: String,
    nodes: Vec<String>,
    position: NodePosition,
    prompt: String,
) -> Result<Option<Story>, String> {
    let offset = text::locate(&nodes, position);
    let ticket = {
        let mut sessions = sessions.0.lock().unwrap();
        sessions.begin(
            &story_id,
            EditedRange {
                start: offset,
                end: offset,
            },
            String::new(),
        );
        sessions
            .start_generation(&story_id, &prompt)
            .map_err(|e| e.to_string())?
    };

    let story = db
        .get_story(&story_id)
        .map_err(|e| e.to_string())?
        .ok_or("Story not found")?;
    let config = openai_config(&db)?;
    let contextual = (!story.contextual_prompt.is_empty()).then_some(story.contextual_prompt.as_str());

    let result = openai::generate_with_context(&config, &prompt, &story.content, contextual).await;
    let generated = match result {
        Ok(generated) => generated,
        Err(e) => {
            warn!("slash generation failed for story {story_id}: {e}");
            sessions
                .0
                .lock()
                .unwrap()
                .cancel_generation(&story_id, ticket.token);
            return Err(e.to_string());
        }
    };

    {
        let mut sessions = sessions.0.lock().unwrap();
        if !sessions.complete_generation(&story_id, ticket.token, generated.clone()) {
            info!("discarding stale slash generation for story {story_id}");
            return Ok(None);
        }
    }

    let updated = apply_generated_insert(&db, &story_id, offset, &prompt, &generated)?;
    sessions.0.lock().unwrap().cancel(&story_id);
    Ok(Some(updated))
}

/// Splices generated text into the story at `offset` and commits a
/// `gpt` version. Re-reads the story first: a debounced typing
/// checkpoint can land while the generation request is in flight, and
/// the splice must build on whatever content is current by then.
fn apply_generated_insert(
    db: &Database,
    story_id: &str,
    offset: usize,
    prompt: &str,
    generated: &str,
) -> Result<Story, String> {
    let story = db
        .get_story(story_id)
        .map_err(|e| e.to_string())?
        .ok_or("Story not found")?;
    let new_content = text::splice(&story.content, offset, offset, generated);
    db.append_version(
        story_id,
        &new_content,
        "gpt",
        Some(prompt),
        Some(EditedRange {
            start: offset,
            end: offset,
        }),
    )
    .map_err(|e| e.to_string())?;
    db.get_story(story_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Story not found".to_string())
}

/// Whole-story generation for the empty-editor flow. The story
/// context is kept as the contextual prompt for later edits.
#[tauri::command]
pub async fn generate_story(
    db: State<'_, Database>,
    story_id: String,
    prompt: String,
    story_context: Option<String>,
) -> Result<Story, String> {
    let config = openai_config(&db)?;
    let generated = openai::generate_story(&config, &prompt, story_context.as_deref())
        .await
        .map_err(|e| e.to_string())?;

    if let Some(context) = story_context.as_deref() {
        db.set_contextual_prompt(&story_id, context)
            .map_err(|e| e.to_string())?;
    }
    db.append_version(&story_id, &generated, "gpt", Some(&prompt), None)
        .map_err(|e| e.to_string())?;
    db.get_story(&story_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Story not found".to_string())
}
