use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Youngest age accepted for a profile
pub const MIN_AGE: u8 = 18;

/// Oldest age accepted for a profile
pub const MAX_AGE: u8 = 80;

/// Sex as VK encodes it: 0 unspecified, 1 female, 2 male
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Unspecified,
    Female,
    Male,
}

impl Sex {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Sex::Female,
            2 => Sex::Male,
            _ => Sex::Unspecified,
        }
    }

    pub fn code(self) -> i16 {
        match self {
            Sex::Unspecified => 0,
            Sex::Female => 1,
            Sex::Male => 2,
        }
    }

    /// The sex a search for this user should look for
    pub fn opposite(self) -> Self {
        match self {
            Sex::Female => Sex::Male,
            Sex::Male => Sex::Female,
            Sex::Unspecified => Sex::Unspecified,
        }
    }

    /// Human-readable label used in settings replies
    pub fn label(self) -> &'static str {
        match self {
            Sex::Unspecified => "Не указан",
            Sex::Female => "Женский",
            Sex::Male => "Мужской",
        }
    }
}

/// Stored profile of a bot user, carrying their search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// What the user directory knows about a caller at `/start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub city: Option<String>,
}

/// A search result shown to the user one at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub city: Option<String>,
}

impl Candidate {
    pub fn profile_url(&self) -> String {
        profile_url(self.id)
    }
}

/// Reference to a VK photo usable as a message attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub owner_id: i64,
    pub id: i64,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: u32,
}

impl PhotoRef {
    pub fn new(owner_id: i64, id: i64) -> Self {
        Self { owner_id, id, likes: 0, comments: 0 }
    }

    pub fn popularity(&self) -> u32 {
        self.likes.saturating_add(self.comments)
    }

    /// Attachment string in the `photo{owner}_{id}` form
    pub fn attachment(&self) -> String {
        format!("photo{}_{}", self.owner_id, self.id)
    }
}

/// A candidate saved to a user's favorites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub user_id: i64,
    pub candidate_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub added_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl FavoriteEntry {
    pub fn profile_url(&self) -> String {
        profile_url(self.candidate_id)
    }
}

pub fn profile_url(user_id: i64) -> String {
    format!("https://vk.com/id{}", user_id)
}

/// Age in whole years for a VK birth date string
///
/// VK returns `D.M.YYYY` when the year is public and `D.M` otherwise;
/// only the full form yields an age.
pub fn age_from_bdate(bdate: &str, today: NaiveDate) -> Option<u8> {
    let born = NaiveDate::parse_from_str(bdate.trim(), "%d.%m.%Y").ok()?;
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    u8::try_from(years).ok()
}
