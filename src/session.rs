//! Per-story AI edit interactions.
//!
//! An interaction walks AwaitingPrompt -> Generating -> Previewing and
//! ends with apply, retry or cancel. Completions carry a token minted
//! when the generation started; a completion whose token no longer
//! matches (the interaction was canceled, replaced or retried in the
//! meantime) is dropped without touching any state.

use crate::db::models::EditedRange;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPhase {
    AwaitingPrompt,
    Generating { token: u64 },
    Previewing { candidate: String },
}

#[derive(Debug, Clone)]
pub struct EditSession {
    pub range: EditedRange,
    pub selected_text: String,
    pub instruction: Option<String>,
    pub phase: EditPhase,
}

/// Data a caller needs to issue the network request for a generation.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub token: u64,
    pub range: EditedRange,
    pub selected_text: String,
    pub instruction: String,
}

/// Candidate ready to be spliced into the story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub range: EditedRange,
    pub instruction: Option<String>,
    pub candidate: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no active edit session for this story")]
    NoSession,
    #[error("a generation is already in flight")]
    AlreadyGenerating,
    #[error("no candidate to {0}")]
    NoCandidate(&'static str),
}

/// Edit sessions keyed by story id, at most one per story. Mutated
/// only under the managed-state mutex, never across an await.
#[derive(Default)]
pub struct EditSessions {
    sessions: HashMap<String, EditSession>,
    next_token: u64,
}

impl EditSessions {
    /// Opens a session for a selection, replacing (and thereby
    /// invalidating) any previous interaction on the same story.
    pub fn begin(&mut self, story_id: &str, range: EditedRange, selected_text: String) {
        self.sessions.insert(
            story_id.to_string(),
            EditSession {
                range,
                selected_text,
                instruction: None,
                phase: EditPhase::AwaitingPrompt,
            },
        );
    }

    /// Moves the session into Generating and hands back the request
    /// data plus the liveness token the completion must present.
    pub fn start_generation(
        &mut self,
        story_id: &str,
        instruction: &str,
    ) -> Result<GenerationTicket, SessionError> {
        let session = self
            .sessions
            .get_mut(story_id)
            .ok_or(SessionError::NoSession)?;
        if matches!(session.phase, EditPhase::Generating { .. }) {
            return Err(SessionError::AlreadyGenerating);
        }
        self.next_token += 1;
        let token = self.next_token;
        session.instruction = Some(instruction.to_string());
        session.phase = EditPhase::Generating { token };
        Ok(GenerationTicket {
            token,
            range: session.range,
            selected_text: session.selected_text.clone(),
            instruction: instruction.to_string(),
        })
    }

    /// Stores the generated candidate. Returns false (and changes
    /// nothing) when the token is stale.
    pub fn complete_generation(&mut self, story_id: &str, token: u64, candidate: String) -> bool {
        match self.sessions.get_mut(story_id) {
            Some(session) if session.phase == (EditPhase::Generating { token }) => {
                session.phase = EditPhase::Previewing { candidate };
                true
            }
            _ => false,
        }
    }

    /// Resets a failed generation back to AwaitingPrompt so the user
    /// can retry. Stale tokens are ignored the same way as in
    /// `complete_generation`.
    pub fn fail_generation(&mut self, story_id: &str, token: u64) {
        if let Some(session) = self.sessions.get_mut(story_id) {
            if session.phase == (EditPhase::Generating { token }) {
                session.phase = EditPhase::AwaitingPrompt;
            }
        }
    }

    /// Returns the candidate for splicing. Does not close the session:
    /// the caller closes it with [`cancel`](Self::cancel) once the
    /// resulting version has actually been persisted, so a failed
    /// append keeps the candidate around.
    pub fn pending_edit(&self, story_id: &str) -> Result<PendingEdit, SessionError> {
        match self.sessions.get(story_id) {
            None => Err(SessionError::NoSession),
            Some(session) => match &session.phase {
                EditPhase::Previewing { candidate } => Ok(PendingEdit {
                    range: session.range,
                    instruction: session.instruction.clone(),
                    candidate: candidate.clone(),
                }),
                _ => Err(SessionError::NoCandidate("apply")),
            },
        }
    }

    /// Discards the candidate and re-enters Generating with the same
    /// instruction.
    pub fn retry(&mut self, story_id: &str) -> Result<GenerationTicket, SessionError> {
        let session = self
            .sessions
            .get_mut(story_id)
            .ok_or(SessionError::NoSession)?;
        let instruction = match (&session.phase, &session.instruction) {
            (EditPhase::Previewing { .. }, Some(instruction)) => instruction.clone(),
            _ => return Err(SessionError::NoCandidate("retry")),
        };
        session.phase = EditPhase::AwaitingPrompt;
        self.start_generation(story_id, &instruction)
    }

    /// Drops the interaction. Any in-flight generation becomes stale.
    pub fn cancel(&mut self, story_id: &str) {
        self.sessions.remove(story_id);
    }

    /// Closes the session only while it still belongs to this
    /// generation. A failure resolving after the user has moved on to
    /// a new interaction must not tear that one down; stale tokens
    /// are a no-op here just like in `complete_generation`.
    pub fn cancel_generation(&mut self, story_id: &str, token: u64) {
        if let Some(session) = self.sessions.get(story_id) {
            if session.phase == (EditPhase::Generating { token }) {
                self.sessions.remove(story_id);
            }
        }
    }

    pub fn get(&self, story_id: &str) -> Option<&EditSession> {
        self.sessions.get(story_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, end: usize) -> EditedRange {
        EditedRange { start, end }
    }

    #[test]
    fn full_interaction_reaches_apply() {
        let mut sessions = EditSessions::default();
        sessions.begin("s1", range(4, 7), "cat".into());
        let ticket = sessions.start_generation("s1", "make it a dog").unwrap();
        assert_eq!(ticket.selected_text, "cat");
        assert!(sessions.complete_generation("s1", ticket.token, "dog".into()));

        let edit = sessions.pending_edit("s1").unwrap();
        assert_eq!(edit.candidate, "dog");
        assert_eq!(edit.range, range(4, 7));
        assert_eq!(edit.instruction.as_deref(), Some("make it a dog"));

        // The candidate survives until the caller closes the session
        // (it only does so after the version append commits).
        assert_eq!(sessions.pending_edit("s1").unwrap(), edit);
        sessions.cancel("s1");
        assert!(sessions.get("s1").is_none());
    }

    #[test]
    fn second_generation_while_in_flight_is_rejected() {
        let mut sessions = EditSessions::default();
        sessions.begin("s1", range(0, 3), "abc".into());
        sessions.start_generation("s1", "a").unwrap();
        assert_eq!(
            sessions.start_generation("s1", "b").unwrap_err(),
            SessionError::AlreadyGenerating
        );
    }

    #[test]
    fn stale_completion_after_cancel_is_dropped() {
        let mut sessions = EditSessions::default();
        sessions.begin("s1", range(0, 3), "abc".into());
        let ticket = sessions.start_generation("s1", "x").unwrap();
        sessions.cancel("s1");
        assert!(!sessions.complete_generation("s1", ticket.token, "late".into()));
        assert!(sessions.get("s1").is_none());
    }

    #[test]
    fn stale_completion_after_new_interaction_is_dropped() {
        let mut sessions = EditSessions::default();
        sessions.begin("s1", range(0, 3), "abc".into());
        let old = sessions.start_generation("s1", "x").unwrap();
        // User reselects and starts over before the old call returns.
        sessions.begin("s1", range(5, 9), "defg".into());
        let new = sessions.start_generation("s1", "y").unwrap();
        assert!(!sessions.complete_generation("s1", old.token, "stale".into()));
        assert!(sessions.complete_generation("s1", new.token, "fresh".into()));
        let edit = sessions.pending_edit("s1").unwrap();
        assert_eq!(edit.candidate, "fresh");
        assert_eq!(edit.range, range(5, 9));
    }

    #[test]
    fn stale_failure_leaves_replacement_session_alone() {
        let mut sessions = EditSessions::default();
        sessions.begin("s1", range(2, 2), "".into());
        let old = sessions.start_generation("s1", "insert a scene").unwrap();
        // User dismisses the slash flow and opens a fresh edit
        // interaction before the first request resolves.
        sessions.begin("s1", range(0, 3), "abc".into());
        let new = sessions.start_generation("s1", "rewrite").unwrap();

        // The stale failure must not tear down the new session.
        sessions.cancel_generation("s1", old.token);
        assert!(sessions.get("s1").is_some());
        assert!(sessions.complete_generation("s1", new.token, "fresh".into()));

        // A failure matching the live generation does close it.
        sessions.begin("s2", range(1, 1), "".into());
        let live = sessions.start_generation("s2", "x").unwrap();
        sessions.cancel_generation("s2", live.token);
        assert!(sessions.get("s2").is_none());
    }

    #[test]
    fn retry_discards_candidate_and_keeps_instruction() {
        let mut sessions = EditSessions::default();
        sessions.begin("s1", range(0, 3), "abc".into());
        let first = sessions.start_generation("s1", "shorter").unwrap();
        sessions.complete_generation("s1", first.token, "draft one".into());

        let second = sessions.retry("s1").unwrap();
        assert_eq!(second.instruction, "shorter");
        assert_ne!(second.token, first.token);
        // The old candidate is gone until the retry completes.
        assert!(sessions.pending_edit("s1").is_err());
        assert!(sessions.complete_generation("s1", second.token, "draft two".into()));
        assert_eq!(sessions.pending_edit("s1").unwrap().candidate, "draft two");
    }

    #[test]
    fn failed_generation_returns_to_awaiting_prompt() {
        let mut sessions = EditSessions::default();
        sessions.begin("s1", range(0, 3), "abc".into());
        let ticket = sessions.start_generation("s1", "x").unwrap();
        sessions.fail_generation("s1", ticket.token);
        assert_eq!(
            sessions.get("s1").unwrap().phase,
            EditPhase::AwaitingPrompt
        );
        // And the user can go again.
        assert!(sessions.start_generation("s1", "x").is_ok());
    }

    #[test]
    fn apply_without_candidate_is_an_error() {
        let mut sessions = EditSessions::default();
        assert_eq!(
            sessions.pending_edit("s1").unwrap_err(),
            SessionError::NoSession
        );
        sessions.begin("s1", range(0, 1), "a".into());
        assert!(matches!(
            sessions.pending_edit("s1").unwrap_err(),
            SessionError::NoCandidate(_)
        ));
    }
}
