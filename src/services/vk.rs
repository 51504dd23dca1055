use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::core::settings_input::title_case;
use crate::core::Keyboard;
use crate::models::{
    age_from_bdate, Candidate, OutboundMessage, PhotoRef, Sex, UserInfo, UserProfile, MAX_AGE,
    MIN_AGE,
};
use crate::services::gateway::{
    CollaboratorResult, FavoritesGateway, PhotoService, SearchService, Transport, UserDirectory,
};

/// VK error codes meaning the photos are not visible to us
const PHOTOS_HIDDEN_CODES: [i64; 3] = [15, 30, 200];

/// Photos requested from the profile album before ranking
const PHOTOS_FETCHED: u32 = 50;

/// Errors that can occur when interacting with the VK API
#[derive(Debug, Error)]
pub enum VkError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("VK API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// VK API client
///
/// Group token calls deliver messages and look up callers; user token calls
/// search people and read their photos.
pub struct VkClient {
    base_url: String,
    api_version: String,
    group_token: String,
    user_token: String,
    client: Client,
}

#[derive(Debug, Clone, Deserialize)]
struct VkCity {
    title: String,
}

#[derive(Debug, Clone, Deserialize)]
struct VkUser {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    sex: i64,
    #[serde(default)]
    bdate: Option<String>,
    #[serde(default)]
    city: Option<VkCity>,
    #[serde(default)]
    is_closed: bool,
    #[serde(default)]
    can_access_closed: Option<bool>,
}

impl VkUser {
    fn age(&self) -> Option<u8> {
        let today = chrono::Utc::now().date_naive();
        self.bdate.as_deref().and_then(|b| age_from_bdate(b, today))
    }

    /// Age usable as a search setting; out-of-range ages count as unset
    fn profile_age(&self) -> Option<u8> {
        self.age().filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
    }

    fn city(&self) -> Option<String> {
        self.city.as_ref().map(|c| c.title.trim().to_lowercase())
    }

    fn is_visible(&self) -> bool {
        !self.is_closed || self.can_access_closed.unwrap_or(false)
    }

    fn into_user_info(self) -> UserInfo {
        UserInfo {
            id: self.id,
            sex: Sex::from_code(self.sex),
            age: self.profile_age(),
            city: self.city(),
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }

    fn into_candidate(self) -> Candidate {
        Candidate {
            id: self.id,
            age: self.age(),
            city: self.city(),
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VkCounter {
    #[serde(default)]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct VkPhoto {
    id: i64,
    owner_id: i64,
    #[serde(default)]
    likes: Option<VkCounter>,
    #[serde(default)]
    comments: Option<VkCounter>,
}

#[derive(Debug, Deserialize)]
struct VkList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

impl VkClient {
    /// Create a new VK client
    pub fn new(
        base_url: String,
        api_version: String,
        group_token: String,
        user_token: String,
        timeout: Duration,
    ) -> Result<Self, VkError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_version,
            group_token,
            user_token,
            client,
        })
    }

    /// Call an API method and unwrap the `response` envelope
    async fn call(
        &self,
        method: &str,
        token: &str,
        params: &[(&str, String)],
    ) -> Result<Value, VkError> {
        let url = format!("{}/method/{}", self.base_url.trim_end_matches('/'), method);

        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", token.to_string()));
        form.push(("v", self.api_version.clone()));

        tracing::debug!("Calling VK method {}", method);

        let response = self.client.post(&url).form(&form).send().await?;

        if !response.status().is_success() {
            return Err(VkError::InvalidResponse(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let json: Value = response.json().await?;
        unwrap_envelope(json)
    }

    /// Deliver a message through `messages.send`
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<(), VkError> {
        let mut params = vec![
            ("user_id", message.user_id.to_string()),
            ("message", message.text.clone()),
            ("random_id", random_id().to_string()),
        ];
        if let Some(keyboard) = message.keyboard {
            params.push(("keyboard", keyboard_json(keyboard).to_string()));
        }
        if let Some(attachment) = message.attachment_list() {
            params.push(("attachment", attachment));
        }

        self.call("messages.send", &self.group_token, &params).await?;
        Ok(())
    }

    /// Look a user up with `users.get`
    pub async fn get_user(&self, user_id: i64) -> Result<Option<UserInfo>, VkError> {
        let params = [
            ("user_ids", user_id.to_string()),
            ("fields", "sex,bdate,city".to_string()),
        ];

        let response = self.call("users.get", &self.group_token, &params).await?;
        let users: Vec<VkUser> = serde_json::from_value(response)
            .map_err(|e| VkError::InvalidResponse(format!("Failed to parse users: {}", e)))?;

        Ok(users.into_iter().next().map(VkUser::into_user_info))
    }

    /// Run `users.search`, skipping profiles whose photos we cannot see
    pub async fn search_users(&self, params: &[(&str, String)]) -> Result<Vec<Candidate>, VkError> {
        let response = self.call("users.search", &self.user_token, params).await?;
        let found: VkList<VkUser> = serde_json::from_value(response)
            .map_err(|e| VkError::InvalidResponse(format!("Failed to parse search: {}", e)))?;

        let candidates: Vec<Candidate> = found
            .items
            .into_iter()
            .filter(VkUser::is_visible)
            .map(VkUser::into_candidate)
            .collect();

        tracing::debug!("users.search returned {} visible profiles", candidates.len());

        Ok(candidates)
    }

    /// Profile photos ordered by likes plus comments
    ///
    /// Hidden albums and private profiles give an empty list.
    pub async fn profile_photos(&self, owner_id: i64) -> Result<Vec<PhotoRef>, VkError> {
        let params = [
            ("owner_id", owner_id.to_string()),
            ("album_id", "profile".to_string()),
            ("extended", "1".to_string()),
            ("count", PHOTOS_FETCHED.to_string()),
        ];

        let response = match self.call("photos.get", &self.user_token, &params).await {
            Ok(response) => response,
            Err(VkError::Api { code, message }) if PHOTOS_HIDDEN_CODES.contains(&code) => {
                tracing::debug!("Photos of {} are hidden: {}", owner_id, message);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let photos: VkList<VkPhoto> = serde_json::from_value(response)
            .map_err(|e| VkError::InvalidResponse(format!("Failed to parse photos: {}", e)))?;

        let mut photos: Vec<PhotoRef> = photos
            .items
            .into_iter()
            .map(|p| PhotoRef {
                owner_id: p.owner_id,
                id: p.id,
                likes: p.likes.map(|c| c.count).unwrap_or(0),
                comments: p.comments.map(|c| c.count).unwrap_or(0),
            })
            .collect();

        // Stable sort keeps album order among equally popular photos
        photos.sort_by(|a, b| b.popularity().cmp(&a.popularity()));

        Ok(photos)
    }
}

fn unwrap_envelope(json: Value) -> Result<Value, VkError> {
    if let Some(error) = json.get("error") {
        return Err(VkError::Api {
            code: error.get("error_code").and_then(Value::as_i64).unwrap_or(0),
            message: error
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    json.get("response")
        .cloned()
        .ok_or_else(|| VkError::InvalidResponse("Missing response field".into()))
}

/// `random_id` for `messages.send`, used by VK to drop duplicates
fn random_id() -> i32 {
    (uuid::Uuid::new_v4().as_u128() & 0x7fff_ffff) as i32
}

/// Keyboard payload with one text button per label
pub fn keyboard_json(keyboard: Keyboard) -> Value {
    let buttons: Vec<Vec<Value>> = keyboard
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|label| json!({ "action": { "type": "text", "label": label } }))
                .collect()
        })
        .collect();

    json!({ "one_time": keyboard.one_time(), "buttons": buttons })
}

/// `users.search` parameters for a profile
///
/// Looks for the opposite sex when known, within `age_spread` years of the
/// user's age, in their city.
pub fn search_params(profile: &UserProfile, count: u32, age_spread: u8) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("count", count.to_string()),
        ("has_photo", "1".to_string()),
        ("fields", "bdate,city".to_string()),
    ];

    let wanted = profile.sex.opposite();
    if wanted != Sex::Unspecified {
        params.push(("sex", wanted.code().to_string()));
    }

    if let Some(age) = profile.age {
        let from = age.saturating_sub(age_spread).max(MIN_AGE);
        let to = age.saturating_add(age_spread).min(MAX_AGE);
        params.push(("age_from", from.to_string()));
        params.push(("age_to", to.to_string()));
    }

    if let Some(city) = &profile.city {
        params.push(("hometown", title_case(city)));
    }

    params
}

#[async_trait]
impl Transport for VkClient {
    async fn send(&self, message: &OutboundMessage) -> CollaboratorResult<()> {
        Ok(self.send_message(message).await?)
    }
}

#[async_trait]
impl UserDirectory for VkClient {
    async fn user_info(&self, user_id: i64) -> CollaboratorResult<Option<UserInfo>> {
        Ok(self.get_user(user_id).await?)
    }
}

#[async_trait]
impl PhotoService for VkClient {
    async fn popular_photos(&self, candidate_id: i64) -> CollaboratorResult<Vec<PhotoRef>> {
        Ok(self.profile_photos(candidate_id).await?)
    }
}

/// Candidate search over `users.search`
pub struct VkSearch {
    client: Arc<VkClient>,
    lists: Arc<dyn FavoritesGateway>,
    count: u32,
    age_spread: u8,
}

impl VkSearch {
    pub fn new(client: Arc<VkClient>, lists: Arc<dyn FavoritesGateway>, count: u32, age_spread: u8) -> Self {
        Self {
            client,
            lists,
            count,
            age_spread,
        }
    }
}

#[async_trait]
impl SearchService for VkSearch {
    async fn search(&self, profile: &UserProfile) -> CollaboratorResult<Vec<Candidate>> {
        let excluded = self.lists.excluded_candidate_ids(profile.user_id).await?;
        let params = search_params(profile, self.count, self.age_spread);

        let candidates: Vec<Candidate> = self
            .client
            .search_users(&params)
            .await?
            .into_iter()
            .filter(|c| c.id != profile.user_id && !excluded.contains(&c.id))
            .collect();

        tracing::debug!(
            "Search for {} kept {} candidates ({} excluded ids)",
            profile.user_id,
            candidates.len(),
            excluded.len()
        );

        Ok(candidates)
    }
}
