//! Contracts between the dialogue core and the outside world.

use async_trait::async_trait;
use thiserror::Error;
use crate::models::{Candidate, FavoriteEntry, OutboundMessage, PhotoRef, Sex, UserInfo, UserProfile};
use crate::services::postgres::PostgresError;
use crate::services::vk::VkError;

/// Failure of anything the dialogue core calls out to
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Storage error: {0}")]
    Storage(#[from] PostgresError),

    #[error("VK error: {0}")]
    Vk(#[from] VkError),

    #[error("{0}")]
    Other(String),
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Delivers replies to users
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> CollaboratorResult<()>;
}

/// Looks up who is writing to the bot
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_info(&self, user_id: i64) -> CollaboratorResult<Option<UserInfo>>;
}

/// Stored profiles and their search settings
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    async fn get_profile(&self, user_id: i64) -> CollaboratorResult<Option<UserProfile>>;

    /// Create the profile, or refresh names of an existing one keeping its settings
    async fn create_profile(&self, info: &UserInfo) -> CollaboratorResult<UserProfile>;

    async fn update_sex(&self, user_id: i64, sex: Sex) -> CollaboratorResult<()>;

    async fn update_age(&self, user_id: i64, age: u8) -> CollaboratorResult<()>;

    async fn update_city(&self, user_id: i64, city: &str) -> CollaboratorResult<()>;

    /// Whether the backing store is reachable
    async fn health_check(&self) -> bool {
        true
    }
}

/// Favorites and blacklist of each user
#[async_trait]
pub trait FavoritesGateway: Send + Sync {
    /// `false` when the candidate is already a favorite
    async fn add_favorite(
        &self,
        user_id: i64,
        candidate_id: i64,
        first_name: &str,
        last_name: &str,
    ) -> CollaboratorResult<bool>;

    /// Favorites in the order they were added
    async fn list_favorites(&self, user_id: i64) -> CollaboratorResult<Vec<FavoriteEntry>>;

    async fn clear_favorites(&self, user_id: i64) -> CollaboratorResult<()>;

    async fn add_blacklist(&self, user_id: i64, candidate_id: i64) -> CollaboratorResult<()>;

    /// Ids a search must not return: favorites and blacklist together
    async fn excluded_candidate_ids(&self, user_id: i64) -> CollaboratorResult<Vec<i64>>;
}

/// Finds candidates for a profile
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Must leave out candidates the user favorited or blacklisted
    async fn search(&self, profile: &UserProfile) -> CollaboratorResult<Vec<Candidate>>;
}

/// Fetches a candidate's photos
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Most popular first
    async fn popular_photos(&self, candidate_id: i64) -> CollaboratorResult<Vec<PhotoRef>>;
}
