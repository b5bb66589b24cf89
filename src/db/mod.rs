pub mod models;

use models::{AudioFileInfo, EditedRange, Story, StoryVersion};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::sync::Mutex;

pub struct Database {
    pub conn: Mutex<Connection>,
}

fn story_from_row(row: &Row) -> rusqlite::Result<Story> {
    Ok(Story {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        contextual_prompt: row.get(3)?,
        current_version_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn version_from_row(row: &Row) -> rusqlite::Result<StoryVersion> {
    let start: Option<i64> = row.get(5)?;
    let end: Option<i64> = row.get(6)?;
    let edited_range = match (start, end) {
        (Some(s), Some(e)) => Some(EditedRange {
            start: s as usize,
            end: e as usize,
        }),
        _ => None,
    };
    Ok(StoryVersion {
        id: row.get(0)?,
        story_id: row.get(1)?,
        content: row.get(2)?,
        edit_type: row.get(3)?,
        edit_prompt: row.get(4)?,
        edited_range,
        created_at: row.get(7)?,
    })
}

const STORY_COLS: &str =
    "id, title, content, contextual_prompt, current_version_id, created_at, updated_at";
const VERSION_COLS: &str =
    "id, story_id, content, edit_type, edit_prompt, range_start, range_end, created_at";

impl Database {
    pub fn new(app_dir: &std::path::Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir).ok();
        let db_path = app_dir.join("scriptflow.db");
        let conn = Connection::open(db_path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS stories (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                contextual_prompt TEXT NOT NULL DEFAULT '',
                current_version_id TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS versions (
                id TEXT PRIMARY KEY,
                story_id TEXT NOT NULL,
                content TEXT NOT NULL,
                edit_type TEXT NOT NULL CHECK (edit_type IN ('initial', 'user', 'gpt')),
                edit_prompt TEXT,
                range_start INTEGER,
                range_end INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (story_id) REFERENCES stories(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS audio_files (
                id TEXT PRIMARY KEY,
                story_id TEXT NOT NULL,
                version_id TEXT NOT NULL,
                voice_id TEXT NOT NULL,
                data BLOB NOT NULL,
                duration REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (story_id) REFERENCES stories(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── Stories ──

    /// Creates a story together with its `initial` version in one
    /// transaction, so `current_version_id` is never dangling.
    pub fn create_story(&self, title: &str, content: &str) -> Result<Story> {
        let mut conn = self.conn.lock().unwrap();
        let story_id = uuid::Uuid::new_v4().to_string();
        let version_id = uuid::Uuid::new_v4().to_string();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO stories (id, title, content, current_version_id) VALUES (?1, ?2, ?3, ?4)",
            params![story_id, title, content, version_id],
        )?;
        tx.execute(
            "INSERT INTO versions (id, story_id, content, edit_type) VALUES (?1, ?2, ?3, 'initial')",
            params![version_id, story_id, content],
        )?;
        tx.commit()?;
        conn.query_row(
            &format!("SELECT {STORY_COLS} FROM stories WHERE id = ?1"),
            params![story_id],
            story_from_row,
        )
    }

    pub fn get_story(&self, id: &str) -> Result<Option<Story>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {STORY_COLS} FROM stories WHERE id = ?1"),
            params![id],
            story_from_row,
        )
        .optional()
    }

    pub fn list_stories(&self) -> Result<Vec<Story>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STORY_COLS} FROM stories ORDER BY updated_at DESC"
        ))?;
        let rows = stmt.query_map([], story_from_row)?;
        rows.collect()
    }

    pub fn rename_story(&self, id: &str, title: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE stories SET title = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![title, id],
        )?;
        Ok(())
    }

    pub fn set_contextual_prompt(&self, id: &str, prompt: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE stories SET contextual_prompt = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![prompt, id],
        )?;
        Ok(())
    }

    pub fn delete_story(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM stories WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Updates the live content without creating a version checkpoint.
    /// Used for keystrokes when autosave checkpoints are disabled.
    pub fn update_story_content(&self, id: &str, content: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE stories SET content = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![content, id],
        )?;
        Ok(())
    }

    // ── Versions ──

    /// Appends a full-content snapshot and moves the story head to it.
    /// Runs in a transaction: a failed append leaves both the version
    /// log and the story row untouched.
    pub fn append_version(
        &self,
        story_id: &str,
        content: &str,
        edit_type: &str,
        edit_prompt: Option<&str>,
        range: Option<EditedRange>,
    ) -> Result<StoryVersion> {
        let mut conn = self.conn.lock().unwrap();
        let version_id = uuid::Uuid::new_v4().to_string();
        let (range_start, range_end) = match range {
            Some(r) => (Some(r.start as i64), Some(r.end as i64)),
            None => (None, None),
        };
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO versions (id, story_id, content, edit_type, edit_prompt, range_start, range_end)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![version_id, story_id, content, edit_type, edit_prompt, range_start, range_end],
        )?;
        tx.execute(
            "UPDATE stories SET content = ?1, current_version_id = ?2, updated_at = datetime('now')
             WHERE id = ?3",
            params![content, version_id, story_id],
        )?;
        tx.commit()?;
        conn.query_row(
            &format!("SELECT {VERSION_COLS} FROM versions WHERE id = ?1"),
            params![version_id],
            version_from_row,
        )
    }

    pub fn get_version(&self, id: &str) -> Result<Option<StoryVersion>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {VERSION_COLS} FROM versions WHERE id = ?1"),
            params![id],
            version_from_row,
        )
        .optional()
    }

    /// Most-recent-first, for the history panel. rowid rather than
    /// created_at, since datetime('now') only has second resolution.
    pub fn list_versions(&self, story_id: &str) -> Result<Vec<StoryVersion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {VERSION_COLS} FROM versions WHERE story_id = ?1 ORDER BY rowid DESC"
        ))?;
        let rows = stmt.query_map(params![story_id], version_from_row)?;
        rows.collect()
    }

    /// Insertion order, for back/forward navigation.
    pub fn list_versions_chronological(&self, story_id: &str) -> Result<Vec<StoryVersion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {VERSION_COLS} FROM versions WHERE story_id = ?1 ORDER BY rowid ASC"
        ))?;
        let rows = stmt.query_map(params![story_id], version_from_row)?;
        rows.collect()
    }

    /// Re-applies an existing version as the live content without
    /// appending. Used by back/forward navigation only; revert goes
    /// through `append_version` so history never shrinks.
    pub fn set_current_version(&self, story_id: &str, version_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE stories
             SET content = (SELECT content FROM versions WHERE id = ?1),
                 current_version_id = ?1,
                 updated_at = datetime('now')
             WHERE id = ?2",
            params![version_id, story_id],
        )?;
        Ok(())
    }

    // ── Audio files ──

    pub fn add_audio_file(
        &self,
        story_id: &str,
        version_id: &str,
        voice_id: &str,
        data: &[u8],
        duration: f64,
    ) -> Result<AudioFileInfo> {
        let conn = self.conn.lock().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO audio_files (id, story_id, version_id, voice_id, data, duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, story_id, version_id, voice_id, data, duration],
        )?;
        conn.query_row(
            "SELECT id, story_id, version_id, voice_id, duration, created_at
             FROM audio_files WHERE id = ?1",
            params![id],
            |row| {
                Ok(AudioFileInfo {
                    id: row.get(0)?,
                    story_id: row.get(1)?,
                    version_id: row.get(2)?,
                    voice_id: row.get(3)?,
                    duration: row.get(4)?,
                    created_at: row.get(5)?,
                })
            },
        )
    }

    pub fn list_audio_files(&self, story_id: &str) -> Result<Vec<AudioFileInfo>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, story_id, version_id, voice_id, duration, created_at
             FROM audio_files WHERE story_id = ?1 ORDER BY rowid DESC",
        )?;
        let rows = stmt.query_map(params![story_id], |row| {
            Ok(AudioFileInfo {
                id: row.get(0)?,
                story_id: row.get(1)?,
                version_id: row.get(2)?,
                voice_id: row.get(3)?,
                duration: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        rows.collect()
    }

    pub fn get_audio_data(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT data FROM audio_files WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
    }

    // ── Settings ──

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Empties all four tables.
    pub fn clear_all(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            DELETE FROM audio_files;
            DELETE FROM versions;
            DELETE FROM stories;
            DELETE FROM settings;
            ",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        (db, dir)
    }

    #[test]
    fn create_story_points_at_initial_version() {
        let (db, _dir) = test_db();
        let story = db.create_story("Untitled Story", "Once upon a time").unwrap();
        let versions = db.list_versions(&story.id).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].edit_type, "initial");
        assert_eq!(versions[0].id, story.current_version_id);
        assert_eq!(versions[0].content, "Once upon a time");
    }

    #[test]
    fn append_versions_preserves_insertion_order() {
        let (db, _dir) = test_db();
        let story = db.create_story("t", "v0").unwrap();
        for i in 1..=4 {
            db.append_version(&story.id, &format!("v{i}"), "user", None, None)
                .unwrap();
        }
        let chrono = db.list_versions_chronological(&story.id).unwrap();
        assert_eq!(chrono.len(), 5);
        let contents: Vec<&str> = chrono.iter().map(|v| v.content.as_str()).collect();
        assert_eq!(contents, vec!["v0", "v1", "v2", "v3", "v4"]);

        // Display order is the reverse.
        let display = db.list_versions(&story.id).unwrap();
        assert_eq!(display[0].content, "v4");
        assert_eq!(display[4].content, "v0");

        let story = db.get_story(&story.id).unwrap().unwrap();
        assert_eq!(story.content, "v4");
        assert_eq!(story.current_version_id, chrono[4].id);
    }

    #[test]
    fn append_records_prompt_and_range() {
        let (db, _dir) = test_db();
        let story = db.create_story("t", "The cat sat.").unwrap();
        let v = db
            .append_version(
                &story.id,
                "The dog sat.",
                "gpt",
                Some("make it a dog"),
                Some(EditedRange { start: 4, end: 7 }),
            )
            .unwrap();
        assert_eq!(v.edit_type, "gpt");
        assert_eq!(v.edit_prompt.as_deref(), Some("make it a dog"));
        assert_eq!(v.edited_range, Some(EditedRange { start: 4, end: 7 }));
    }

    #[test]
    fn rejects_unknown_edit_type() {
        let (db, _dir) = test_db();
        let story = db.create_story("t", "x").unwrap();
        assert!(db
            .append_version(&story.id, "y", "robot", None, None)
            .is_err());
        // Failed append must not have moved the head.
        let story = db.get_story(&story.id).unwrap().unwrap();
        assert_eq!(story.content, "x");
        assert_eq!(db.list_versions(&story.id).unwrap().len(), 1);
    }

    #[test]
    fn revert_appends_instead_of_truncating() {
        let (db, _dir) = test_db();
        let story = db.create_story("t", "v0").unwrap();
        db.append_version(&story.id, "v1", "user", None, None).unwrap();
        db.append_version(&story.id, "v2", "gpt", Some("p"), None).unwrap();

        // Revert to the first snapshot: a new version carries its
        // content, nothing is removed or rewritten.
        let chrono = db.list_versions_chronological(&story.id).unwrap();
        let target = chrono[0].clone();
        db.append_version(&story.id, &target.content, "user", None, None)
            .unwrap();

        let after = db.list_versions_chronological(&story.id).unwrap();
        assert_eq!(after.len(), 4);
        assert_eq!(after[3].content, "v0");
        assert_eq!(after[3].edit_type, "user");
        assert_ne!(after[3].id, target.id);
        // The reverted-to version itself is untouched.
        assert_eq!(after[0].id, target.id);
        assert_eq!(after[0].content, "v0");
        assert_eq!(after[0].edit_type, "initial");

        let story = db.get_story(&story.id).unwrap().unwrap();
        assert_eq!(story.content, "v0");
        assert_eq!(story.current_version_id, after[3].id);
    }

    #[test]
    fn navigation_reapplies_without_appending() {
        let (db, _dir) = test_db();
        let story = db.create_story("t", "a").unwrap();
        db.append_version(&story.id, "b", "user", None, None).unwrap();
        let chrono = db.list_versions_chronological(&story.id).unwrap();
        db.set_current_version(&story.id, &chrono[0].id).unwrap();
        let story = db.get_story(&story.id).unwrap().unwrap();
        assert_eq!(story.content, "a");
        assert_eq!(story.current_version_id, chrono[0].id);
        assert_eq!(db.list_versions(&story.id).unwrap().len(), 2);
    }

    #[test]
    fn audio_history_is_most_recent_first() {
        let (db, _dir) = test_db();
        let story = db.create_story("t", "x").unwrap();
        let a = db
            .add_audio_file(&story.id, &story.current_version_id, "voice-1", &[1, 2, 3], 1.0)
            .unwrap();
        let b = db
            .add_audio_file(&story.id, &story.current_version_id, "voice-1", &[4, 5], 0.5)
            .unwrap();
        let history = db.list_audio_files(&story.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, b.id);
        assert_eq!(history[1].id, a.id);
        assert_eq!(db.get_audio_data(&a.id).unwrap().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn settings_roundtrip() {
        let (db, _dir) = test_db();
        assert_eq!(db.get_setting("selected_voice").unwrap(), None);
        db.set_setting("selected_voice", "21m00Tcm4TlvDq8ikWAM").unwrap();
        assert_eq!(
            db.get_setting("selected_voice").unwrap().as_deref(),
            Some("21m00Tcm4TlvDq8ikWAM")
        );
    }

    #[test]
    fn clear_all_empties_every_table() {
        let (db, _dir) = test_db();
        let story = db.create_story("t", "x").unwrap();
        db.add_audio_file(&story.id, &story.current_version_id, "v", &[0], 0.0)
            .unwrap();
        db.set_setting("auto_save", "true").unwrap();
        db.clear_all().unwrap();
        assert!(db.list_stories().unwrap().is_empty());
        assert!(db.list_versions(&story.id).unwrap().is_empty());
        assert!(db.list_audio_files(&story.id).unwrap().is_empty());
        assert_eq!(db.get_setting("auto_save").unwrap(), None);
    }
}
