use moka::future::Cache;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use crate::models::Candidate;

/// The step of the dialogue a user is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Idle,
    Browsing,
    WaitingSex,
    WaitingAge,
    WaitingCity,
}

/// Where a browse list stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<'a> {
    Rendering(usize, &'a Candidate),
    Exhausted,
}

/// Ordered search results with a cursor
///
/// `current` only ever points at the cursor, and only after the candidate
/// there was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Browser {
    candidates: Vec<Candidate>,
    cursor: usize,
    current: Option<usize>,
}

impl Browser {
    /// Start browsing; `None` for an empty result list
    pub fn new(candidates: Vec<Candidate>) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            candidates,
            cursor: 0,
            current: None,
        })
    }

    pub fn position(&self) -> Position<'_> {
        match self.candidates.get(self.cursor) {
            Some(candidate) => Position::Rendering(self.cursor, candidate),
            None => Position::Exhausted,
        }
    }

    /// Move past the candidate at the cursor
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.candidates.len());
        self.current = None;
    }

    /// Record that the candidate at the cursor has been shown
    pub fn mark_shown(&mut self) {
        if self.cursor < self.candidates.len() {
            self.current = Some(self.cursor);
        }
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.current.and_then(|i| self.candidates.get(i))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Per-user dialogue state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Idle,
    Browsing(Browser),
    WaitingSex,
    WaitingAge,
    WaitingCity,
}

impl Session {
    pub fn mode(&self) -> Mode {
        match self {
            Session::Idle => Mode::Idle,
            Session::Browsing(_) => Mode::Browsing,
            Session::WaitingSex => Mode::WaitingSex,
            Session::WaitingAge => Mode::WaitingAge,
            Session::WaitingCity => Mode::WaitingCity,
        }
    }

    /// Session waiting for the given field; `None` for non-waiting modes
    pub fn waiting(mode: Mode) -> Option<Self> {
        match mode {
            Mode::WaitingSex => Some(Session::WaitingSex),
            Mode::WaitingAge => Some(Session::WaitingAge),
            Mode::WaitingCity => Some(Session::WaitingCity),
            Mode::Idle | Mode::Browsing => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Session::Idle;
    }

    pub fn browser(&self) -> Option<&Browser> {
        match self {
            Session::Browsing(browser) => Some(browser),
            _ => None,
        }
    }

    pub fn browser_mut(&mut self) -> Option<&mut Browser> {
        match self {
            Session::Browsing(browser) => Some(browser),
            _ => None,
        }
    }

    pub fn current_candidate(&self) -> Option<&Candidate> {
        self.browser().and_then(Browser::current)
    }
}

/// Session table keyed by user id
///
/// Only sessions that are not Idle are kept, so a user with no stored
/// session is Idle. Stored sessions left alone for `idle_timeout` are
/// evicted, and when the table is full the least recently used go first.
///
/// Per-user exclusion is kept apart from the table: every user with an
/// event in flight holds an async mutex in `in_flight`, which capacity
/// eviction never touches. The mutex is dropped from the map once its last
/// holder or waiter lets go.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<i64, Session>,
    in_flight: Arc<StdMutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

/// Exclusive access to one user's session for the length of one event
///
/// Changes are kept only when the guard is handed back through
/// [`SessionStore::store`]; a dropped guard releases the user unchanged.
pub struct SessionGuard {
    user_id: i64,
    session: Session,
    slot: Arc<Mutex<()>>,
    lock: Option<OwnedMutexGuard<()>>,
    in_flight: Arc<StdMutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl SessionGuard {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

impl Deref for SessionGuard {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.lock.take());

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // The map and this guard are the only owners left
        if Arc::strong_count(&self.slot) == 2 {
            in_flight.remove(&self.user_id);
        }
    }
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle_timeout: Duration) -> Self {
        let sessions = moka::future::CacheBuilder::new(max_sessions)
            .time_to_idle(idle_timeout)
            .build();

        Self {
            sessions,
            in_flight: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Wait for exclusive access to a user's session, Idle when none is stored
    pub async fn lock(&self, user_id: i64) -> SessionGuard {
        let slot = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            in_flight
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let lock = slot.clone().lock_owned().await;
        let session = self.sessions.get(&user_id).await.unwrap_or_default();

        SessionGuard {
            user_id,
            session,
            slot,
            lock: Some(lock),
            in_flight: self.in_flight.clone(),
        }
    }

    /// Keep the guarded session and release the user
    ///
    /// An Idle session is removed from the table.
    pub async fn store(&self, mut guard: SessionGuard) {
        let session = std::mem::take(&mut guard.session);
        if session == Session::Idle {
            self.sessions.invalidate(&guard.user_id).await;
        } else {
            self.sessions.insert(guard.user_id, session).await;
        }
    }

    /// Copy of a user's stored session, Idle when there is none
    pub async fn snapshot(&self, user_id: i64) -> Session {
        self.sessions.get(&user_id).await.unwrap_or_default()
    }

    pub async fn mode(&self, user_id: i64) -> Mode {
        self.snapshot(user_id).await.mode()
    }

    /// Number of sessions that are not Idle
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply pending evictions and bookkeeping so `len` is current
    pub async fn sync(&self) {
        self.sessions.run_pending_tasks().await;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(30 * 60))
    }
}
