use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::SessionConfig;

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
const DEFAULT_ID_LENGTH: usize = 20;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// What a login challenge carries while it is alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPayload {
    pub otp: String,
    pub email: String,
}

struct SessionEntry {
    payload: SessionPayload,
    expires_at: Instant,
}

/// In-memory, time-bounded store for short-lived login challenges.
///
/// A single coarse lock keeps create/get/end atomic with respect to the
/// expiry check; critical sections are map operations only, never I/O.
/// Entries expire lazily on first access past their deadline - no
/// background sweep. The store is an owned, injectable instance with no
/// global state.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    ttl: Duration,
    id_length: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: DEFAULT_TTL,
            id_length: DEFAULT_ID_LENGTH,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::from_secs(config.ttl_seconds),
            id_length: config.id_length,
        }
    }

    /// Store a payload under a fresh identifier with the default TTL.
    pub fn create(&self, payload: SessionPayload) -> String {
        self.create_with_ttl(payload, self.ttl)
    }

    /// Store a payload with an explicit TTL.
    pub fn create_with_ttl(&self, payload: SessionPayload, ttl: Duration) -> String {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Regenerate on collision against current live keys
        let mut id = generate_id(self.id_length);
        while sessions.contains_key(&id) {
            id = generate_id(self.id_length);
        }

        sessions.insert(
            id.clone(),
            SessionEntry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
        id
    }

    /// Look up a live session. An entry at or past its deadline is purged
    /// and reported as absent.
    pub fn get(&self, id: &str) -> Option<SessionPayload> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match sessions.get(id) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.payload.clone()),
            Some(_) => {
                sessions.remove(id);
                None
            }
            None => None,
        }
    }

    /// Remove a session unconditionally. Removing an absent id is a no-op.
    pub fn end(&self, id: &str) {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id);
    }
}

fn generate_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..ID_ALPHABET.len());
            ID_ALPHABET[idx] as char
        })
        .collect()
}
