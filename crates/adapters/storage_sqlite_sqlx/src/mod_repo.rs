//! `SQLite` implementation of [`ModRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use modhub_app::ports::ModRepository;
use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::id::ModId;
use modhub_domain::mods::Mod;

use crate::codec::{decode_id, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(Mod);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let description: Option<String> = row.try_get("description")?;
        let active: bool = row.try_get("active")?;
        let last_changed: String = row.try_get("last_changed")?;

        Ok(Self(Mod {
            id: decode_id(&id)?,
            name,
            description,
            active,
            last_changed: decode_timestamp(&last_changed)?,
        }))
    }
}

/// `SQLite`-backed mod repository.
pub struct SqliteModRepository {
    pool: SqlitePool,
}

impl SqliteModRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ModRepository for SqliteModRepository {
    async fn create(&self, m: Mod) -> Result<Mod, ModHubError> {
        sqlx::query(
            "INSERT INTO mods (id, name, description, active, last_changed) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(m.id.to_string())
        .bind(&m.name)
        .bind(&m.description)
        .bind(m.active)
        .bind(encode_timestamp(m.last_changed))
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(m)
    }

    async fn get_by_id(&self, id: ModId) -> Result<Option<Mod>, ModHubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM mods WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn get_all(&self) -> Result<Vec<Mod>, ModHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM mods ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_target(&self, target: &str) -> Result<Option<Mod>, ModHubError> {
        let target = target.trim();
        if let Ok(id) = target.parse::<ModId>()
            && let Some(m) = self.get_by_id(id).await?
        {
            return Ok(Some(m));
        }

        // lower() folds ASCII only, like the name comparison on `Mod`.
        let row: Option<Wrapper> = sqlx::query_as(
            "SELECT * FROM mods WHERE lower(trim(name)) = lower(?) ORDER BY id LIMIT 1",
        )
        .bind(target)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn update(&self, m: Mod) -> Result<Mod, ModHubError> {
        let result = sqlx::query(
            "UPDATE mods SET name = ?, description = ?, active = ?, last_changed = ? WHERE id = ?",
        )
        .bind(&m.name)
        .bind(&m.description)
        .bind(m.active)
        .bind(encode_timestamp(m.last_changed))
        .bind(m.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "Mod",
                id: m.id.to_string(),
            }
            .into());
        }
        Ok(m)
    }

    async fn delete(&self, id: ModId) -> Result<(), ModHubError> {
        sqlx::query("DELETE FROM mods WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
