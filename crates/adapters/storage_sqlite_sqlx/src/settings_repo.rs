//! `SQLite` implementation of [`SettingsRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use modhub_app::ports::SettingsRepository;
use modhub_domain::error::ModHubError;
use modhub_domain::setting::Setting;

use crate::codec::{decode_json, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(Setting);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let key: String = row.try_get("key")?;
        let value: String = row.try_get("value")?;
        let last_changed: String = row.try_get("last_changed")?;

        Ok(Self(Setting {
            key,
            value: decode_json(&value)?,
            last_changed: decode_timestamp(&last_changed)?,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO settings (key, value, last_changed) VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, last_changed = excluded.last_changed
";

/// `SQLite`-backed settings repository.
pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>, ModHubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn get_all(&self) -> Result<Vec<Setting>, ModHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn put(&self, setting: Setting) -> Result<Setting, ModHubError> {
        let value = serde_json::to_string(&setting.value).map_err(StorageError::from)?;

        sqlx::query(UPSERT)
            .bind(&setting.key)
            .bind(value)
            .bind(encode_timestamp(setting.last_changed))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(setting)
    }
}
