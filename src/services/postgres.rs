use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use crate::models::{FavoriteEntry, Sex, UserInfo, UserProfile};
use crate::services::gateway::{CollaboratorResult, FavoritesGateway, ProfileGateway};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// PostgreSQL store for profiles, favorites and the blacklist
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    pub async fn fetch_profile(&self, user_id: i64) -> Result<Option<UserProfile>, PostgresError> {
        let query = r#"
            SELECT user_id, first_name, last_name, sex, age, city, created_at
            FROM users
            WHERE user_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    /// Insert a profile, or refresh the names of an existing one
    ///
    /// Search settings of an existing profile are left as they are.
    pub async fn upsert_profile(&self, info: &UserInfo) -> Result<UserProfile, PostgresError> {
        let query = r#"
            INSERT INTO users (user_id, first_name, last_name, sex, age, city)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id)
            DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name
            RETURNING user_id, first_name, last_name, sex, age, city, created_at
        "#;

        let row = sqlx::query(query)
            .bind(info.id)
            .bind(&info.first_name)
            .bind(&info.last_name)
            .bind(info.sex.code())
            .bind(info.age.map(i16::from))
            .bind(&info.city)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Upserted profile {}", info.id);

        Ok(profile_from_row(&row))
    }

    pub async fn set_sex(&self, user_id: i64, sex: Sex) -> Result<(), PostgresError> {
        let result = sqlx::query("UPDATE users SET sex = $1 WHERE user_id = $2")
            .bind(sex.code())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        ensure_updated(result.rows_affected(), user_id)
    }

    pub async fn set_age(&self, user_id: i64, age: u8) -> Result<(), PostgresError> {
        let result = sqlx::query("UPDATE users SET age = $1 WHERE user_id = $2")
            .bind(i16::from(age))
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        ensure_updated(result.rows_affected(), user_id)
    }

    /// Store a city, expected lower-cased
    pub async fn set_city(&self, user_id: i64, city: &str) -> Result<(), PostgresError> {
        let result = sqlx::query("UPDATE users SET city = $1 WHERE user_id = $2")
            .bind(city)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("City of user {} set to '{}'", user_id, city);

        ensure_updated(result.rows_affected(), user_id)
    }

    /// Save a favorite; `false` if the pair already exists
    pub async fn insert_favorite(
        &self,
        user_id: i64,
        candidate_id: i64,
        first_name: &str,
        last_name: &str,
    ) -> Result<bool, PostgresError> {
        let query = r#"
            INSERT INTO favorites (user_id, candidate_id, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, candidate_id) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(user_id)
            .bind(candidate_id)
            .bind(first_name)
            .bind(last_name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn fetch_favorites(&self, user_id: i64) -> Result<Vec<FavoriteEntry>, PostgresError> {
        let query = r#"
            SELECT user_id, candidate_id, first_name, last_name, added_at
            FROM favorites
            WHERE user_id = $1
            ORDER BY added_at, id
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let favorites = rows
            .iter()
            .map(|row| FavoriteEntry {
                user_id: row.get("user_id"),
                candidate_id: row.get("candidate_id"),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                added_at: row.get("added_at"),
            })
            .collect();

        Ok(favorites)
    }

    pub async fn delete_favorites(&self, user_id: i64) -> Result<u64, PostgresError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Cleared {} favorites for user {}", result.rows_affected(), user_id);

        Ok(result.rows_affected())
    }

    pub async fn insert_blacklist(&self, user_id: i64, candidate_id: i64) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO blacklist (user_id, candidate_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, candidate_id) DO NOTHING
        "#;

        sqlx::query(query)
            .bind(user_id)
            .bind(candidate_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Blacklisted {} for user {}", candidate_id, user_id);

        Ok(())
    }

    /// Candidate ids the user has favorited or blacklisted
    pub async fn fetch_excluded_ids(&self, user_id: i64) -> Result<Vec<i64>, PostgresError> {
        let query = r#"
            SELECT candidate_id FROM favorites WHERE user_id = $1
            UNION
            SELECT candidate_id FROM blacklist WHERE user_id = $1
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(|row| row.get("candidate_id")).collect())
    }

    /// Health check for the database connection
    pub async fn ping(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn ensure_updated(rows_affected: u64, user_id: i64) -> Result<(), PostgresError> {
    if rows_affected == 0 {
        return Err(PostgresError::NotFound(format!("Profile not found for user {}", user_id)));
    }
    Ok(())
}

fn profile_from_row(row: &PgRow) -> UserProfile {
    let sex: i16 = row.get("sex");
    let age: Option<i16> = row.get("age");

    UserProfile {
        user_id: row.get("user_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        sex: Sex::from_code(i64::from(sex)),
        age: age.and_then(|a| u8::try_from(a).ok()),
        city: row.get("city"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ProfileGateway for PostgresClient {
    async fn get_profile(&self, user_id: i64) -> CollaboratorResult<Option<UserProfile>> {
        Ok(self.fetch_profile(user_id).await?)
    }

    async fn create_profile(&self, info: &UserInfo) -> CollaboratorResult<UserProfile> {
        Ok(self.upsert_profile(info).await?)
    }

    async fn update_sex(&self, user_id: i64, sex: Sex) -> CollaboratorResult<()> {
        Ok(self.set_sex(user_id, sex).await?)
    }

    async fn update_age(&self, user_id: i64, age: u8) -> CollaboratorResult<()> {
        Ok(self.set_age(user_id, age).await?)
    }

    async fn update_city(&self, user_id: i64, city: &str) -> CollaboratorResult<()> {
        Ok(self.set_city(user_id, city).await?)
    }

    async fn health_check(&self) -> bool {
        self.ping().await.unwrap_or(false)
    }
}

#[async_trait]
impl FavoritesGateway for PostgresClient {
    async fn add_favorite(
        &self,
        user_id: i64,
        candidate_id: i64,
        first_name: &str,
        last_name: &str,
    ) -> CollaboratorResult<bool> {
        Ok(self.insert_favorite(user_id, candidate_id, first_name, last_name).await?)
    }

    async fn list_favorites(&self, user_id: i64) -> CollaboratorResult<Vec<FavoriteEntry>> {
        Ok(self.fetch_favorites(user_id).await?)
    }

    async fn clear_favorites(&self, user_id: i64) -> CollaboratorResult<()> {
        self.delete_favorites(user_id).await?;
        Ok(())
    }

    async fn add_blacklist(&self, user_id: i64, candidate_id: i64) -> CollaboratorResult<()> {
        Ok(self.insert_blacklist(user_id, candidate_id).await?)
    }

    async fn excluded_candidate_ids(&self, user_id: i64) -> CollaboratorResult<Vec<i64>> {
        Ok(self.fetch_excluded_ids(user_id).await?)
    }
}
