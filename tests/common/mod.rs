// In-memory collaborators for driving the dialogue router in tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use vkinder::core::{Collaborators, DialogueRouter, Keyboard, SessionStore};
use vkinder::models::{Candidate, FavoriteEntry, OutboundMessage, PhotoRef, Sex, UserInfo, UserProfile};
use vkinder::services::{
    CollaboratorError, CollaboratorResult, FavoritesGateway, PhotoService, ProfileGateway,
    SearchService, Transport, UserDirectory,
};

pub const USER: i64 = 1001;

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    pub fail: AtomicBool,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent().last().cloned()
    }

    pub fn last_text(&self) -> String {
        self.last().map(|m| m.text).unwrap_or_default()
    }

    pub fn last_keyboard(&self) -> Option<Keyboard> {
        self.last().and_then(|m| m.keyboard)
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> CollaboratorResult<()> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("transport down".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    users: Mutex<HashMap<i64, UserInfo>>,
    pub fail: AtomicBool,
}

impl FakeDirectory {
    pub fn with_user(info: UserInfo) -> Self {
        let directory = Self::default();
        directory.users.lock().unwrap().insert(info.id, info);
        directory
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn user_info(&self, user_id: i64) -> CollaboratorResult<Option<UserInfo>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("users.get failed".to_string()));
        }
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}

/// Profiles, favorites and the blacklist kept in memory
#[derive(Default)]
pub struct InMemoryGateway {
    profiles: Mutex<HashMap<i64, UserProfile>>,
    favorites: Mutex<Vec<FavoriteEntry>>,
    blacklist: Mutex<Vec<(i64, i64)>>,
    pub fail_writes: AtomicBool,
    pub fail_favorites: AtomicBool,
}

impl InMemoryGateway {
    pub fn put_profile(&self, profile: UserProfile) {
        self.profiles.lock().unwrap().insert(profile.user_id, profile);
    }

    pub fn profile(&self, user_id: i64) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(&user_id).cloned()
    }

    pub fn favorites_of(&self, user_id: i64) -> Vec<FavoriteEntry> {
        self.favorites
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn blacklist_of(&self, user_id: i64) -> Vec<i64> {
        self.blacklist
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, c)| *c)
            .collect()
    }

    fn check_writes(&self) -> CollaboratorResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("database unavailable".to_string()));
        }
        Ok(())
    }

    fn check_favorites(&self) -> CollaboratorResult<()> {
        if self.fail_favorites.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("database unavailable".to_string()));
        }
        Ok(())
    }

    fn update(&self, user_id: i64, apply: impl FnOnce(&mut UserProfile)) -> CollaboratorResult<()> {
        self.check_writes()?;
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| CollaboratorError::Other(format!("no profile {}", user_id)))?;
        apply(profile);
        Ok(())
    }
}

#[async_trait]
impl ProfileGateway for InMemoryGateway {
    async fn get_profile(&self, user_id: i64) -> CollaboratorResult<Option<UserProfile>> {
        Ok(self.profile(user_id))
    }

    async fn create_profile(&self, info: &UserInfo) -> CollaboratorResult<UserProfile> {
        self.check_writes()?;
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles.entry(info.id).or_insert_with(|| UserProfile {
            user_id: info.id,
            first_name: info.first_name.clone(),
            last_name: info.last_name.clone(),
            sex: info.sex,
            age: info.age,
            city: info.city.clone(),
            created_at: Some(Utc::now()),
        });
        profile.first_name = info.first_name.clone();
        profile.last_name = info.last_name.clone();
        Ok(profile.clone())
    }

    async fn update_sex(&self, user_id: i64, sex: Sex) -> CollaboratorResult<()> {
        self.update(user_id, |p| p.sex = sex)
    }

    async fn update_age(&self, user_id: i64, age: u8) -> CollaboratorResult<()> {
        self.update(user_id, |p| p.age = Some(age))
    }

    async fn update_city(&self, user_id: i64, city: &str) -> CollaboratorResult<()> {
        self.update(user_id, |p| p.city = Some(city.to_string()))
    }

    async fn health_check(&self) -> bool {
        !self.fail_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FavoritesGateway for InMemoryGateway {
    async fn add_favorite(
        &self,
        user_id: i64,
        candidate_id: i64,
        first_name: &str,
        last_name: &str,
    ) -> CollaboratorResult<bool> {
        self.check_favorites()?;
        let mut favorites = self.favorites.lock().unwrap();
        if favorites
            .iter()
            .any(|f| f.user_id == user_id && f.candidate_id == candidate_id)
        {
            return Ok(false);
        }
        favorites.push(FavoriteEntry {
            user_id,
            candidate_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            added_at: Some(Utc::now()),
        });
        Ok(true)
    }

    async fn list_favorites(&self, user_id: i64) -> CollaboratorResult<Vec<FavoriteEntry>> {
        self.check_favorites()?;
        Ok(self.favorites_of(user_id))
    }

    async fn clear_favorites(&self, user_id: i64) -> CollaboratorResult<()> {
        self.check_favorites()?;
        self.favorites.lock().unwrap().retain(|f| f.user_id != user_id);
        Ok(())
    }

    async fn add_blacklist(&self, user_id: i64, candidate_id: i64) -> CollaboratorResult<()> {
        self.check_favorites()?;
        let mut blacklist = self.blacklist.lock().unwrap();
        if !blacklist.contains(&(user_id, candidate_id)) {
            blacklist.push((user_id, candidate_id));
        }
        Ok(())
    }

    async fn excluded_candidate_ids(&self, user_id: i64) -> CollaboratorResult<Vec<i64>> {
        let mut ids: Vec<i64> = self.favorites_of(user_id).iter().map(|f| f.candidate_id).collect();
        ids.extend(self.blacklist_of(user_id));
        Ok(ids)
    }
}

/// Returns a fixed candidate list, minus whatever the gateway excludes
pub struct FakeSearch {
    candidates: Mutex<Vec<Candidate>>,
    lists: Arc<InMemoryGateway>,
    queries: Mutex<Vec<UserProfile>>,
    pub fail: AtomicBool,
}

impl FakeSearch {
    pub fn new(lists: Arc<InMemoryGateway>) -> Self {
        Self {
            candidates: Mutex::new(Vec::new()),
            lists,
            queries: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_candidates(&self, candidates: Vec<Candidate>) {
        *self.candidates.lock().unwrap() = candidates;
    }

    pub fn queries(&self) -> Vec<UserProfile> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchService for FakeSearch {
    async fn search(&self, profile: &UserProfile) -> CollaboratorResult<Vec<Candidate>> {
        self.queries.lock().unwrap().push(profile.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("users.search failed".to_string()));
        }
        let excluded = self.lists.excluded_candidate_ids(profile.user_id).await?;
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !excluded.contains(&c.id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakePhotos {
    pub fail: AtomicBool,
}

#[async_trait]
impl PhotoService for FakePhotos {
    async fn popular_photos(&self, candidate_id: i64) -> CollaboratorResult<Vec<PhotoRef>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("photos.get failed".to_string()));
        }
        Ok((1..=5)
            .map(|i| PhotoRef {
                owner_id: candidate_id,
                id: i,
                likes: (10 - i) as u32,
                comments: 0,
            })
            .collect())
    }
}

/// A router wired to fakes, with handles to every fake
pub struct Harness {
    pub router: DialogueRouter,
    pub transport: Arc<RecordingTransport>,
    pub directory: Arc<FakeDirectory>,
    pub gateway: Arc<InMemoryGateway>,
    pub search: Arc<FakeSearch>,
    pub photos: Arc<FakePhotos>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(SessionStore::default())
    }

    pub fn with_store(sessions: SessionStore) -> Self {
        let transport = Arc::new(RecordingTransport::default());
        let directory = Arc::new(FakeDirectory::with_user(user_info(USER)));
        let gateway = Arc::new(InMemoryGateway::default());
        let search = Arc::new(FakeSearch::new(gateway.clone()));
        let photos = Arc::new(FakePhotos::default());

        let collaborators = Collaborators {
            transport: transport.clone(),
            directory: directory.clone(),
            profiles: gateway.clone(),
            favorites: gateway.clone(),
            search: search.clone(),
            photos: photos.clone(),
        };

        Self {
            router: DialogueRouter::new(collaborators, sessions),
            transport,
            directory,
            gateway,
            search,
            photos,
        }
    }

    /// Harness whose user already ran /start with the given settings
    pub fn with_profile(sex: Sex, age: Option<u8>, city: Option<&str>) -> Self {
        let harness = Self::new();
        harness.put_profile(sex, age, city);
        harness
    }

    pub fn put_profile(&self, sex: Sex, age: Option<u8>, city: Option<&str>) {
        self.gateway.put_profile(UserProfile {
            user_id: USER,
            first_name: "Иван".to_string(),
            last_name: "Петров".to_string(),
            sex,
            age,
            city: city.map(str::to_string),
            created_at: Some(Utc::now()),
        });
    }

    pub async fn say(&self, text: &str) {
        self.router.handle(USER, text).await;
    }
}

pub fn user_info(id: i64) -> UserInfo {
    UserInfo {
        id,
        first_name: "Иван".to_string(),
        last_name: "Петров".to_string(),
        sex: Sex::Male,
        age: Some(25),
        city: Some("москва".to_string()),
    }
}

pub fn candidate(id: i64, first_name: &str) -> Candidate {
    Candidate {
        id,
        first_name: first_name.to_string(),
        last_name: "Смирнова".to_string(),
        age: Some(24),
        city: Some("москва".to_string()),
    }
}
