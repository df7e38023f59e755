use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::conversation::{ENDED_MESSAGE, GREETING, InterviewState, Interviewer};
use crate::models::{ChatMessage, TOTAL_FIELDS};

/// One candidate conversation: interview state plus the full chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Local>,
    pub state: InterviewState,
    pub transcript: Vec<ChatMessage>,
}

impl Session {
    /// Starts a session with the greeting already in the transcript.
    pub fn new() -> Self {
        let started_at = Local::now();
        Self {
            id: session_id(&started_at),
            started_at,
            state: InterviewState::default(),
            transcript: vec![ChatMessage::assistant(GREETING)],
        }
    }

    /// Records the candidate's message, runs the turn and records the reply.
    /// An ended session is left untouched and only returns the ended notice.
    pub fn respond(&mut self, input: &str, interviewer: &Interviewer) -> String {
        if self.state.ended {
            return ENDED_MESSAGE.to_string();
        }
        self.transcript.push(ChatMessage::user(input));
        let reply = interviewer.respond(&mut self.state, input);
        self.transcript.push(ChatMessage::assistant(reply.clone()));
        debug!(session = %self.id, stage = self.state.stage.label(), "Turn complete");
        reply
    }

    pub fn is_ended(&self) -> bool {
        self.state.ended
    }

    pub fn profile_progress(&self) -> (usize, usize) {
        (self.state.candidate.filled_fields(), TOTAL_FIELDS)
    }

    pub fn assessment_progress(&self) -> Option<(usize, usize)> {
        if self.state.questions.is_empty() {
            None
        } else {
            Some((self.state.answers.len(), self.state.questions.len()))
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.state.ended {
            "Ended"
        } else {
            self.state.stage.label()
        }
    }

    /// Writes the session as pretty JSON. Export only; sessions are never reloaded.
    pub fn export_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize session")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// First 8 hex digits of the SHA-256 of the creation timestamp.
fn session_id(created: &DateTime<Local>) -> String {
    let stamp = created.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let digest = Sha256::digest(stamp.as_bytes());
    format!("{:x}", digest)[..8].to_string()
}

/// In-memory sessions keyed by id, created on first access.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh session and returns its id.
    pub fn create(&mut self) -> String {
        let mut session = Session::new();
        // Two sessions in the same nanosecond would share an id
        while self.sessions.contains_key(&session.id) {
            session = Session::new();
        }
        let id = session.id.clone();
        self.sessions.insert(id.clone(), session);
        id
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Returns the session under `id`, creating it if this is the first access.
    pub fn get_or_create(&mut self, id: &str) -> &mut Session {
        self.sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session = %id, "Creating session on first access");
            let mut session = Session::new();
            session.id = id.to_string();
            session
        })
    }

    pub fn remove(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
