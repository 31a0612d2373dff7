use std::str::FromStr;

use chrono::Utc;
use sqlx::{
    Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::models::Note;

const CREATE_NOTES_TABLE: &str = "CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(255) NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
)";

const CREATE_TITLE_INDEX: &str = "CREATE INDEX IF NOT EXISTS ix_notes_title ON notes (title)";

/// Owns the connection pool and hands out per-request units of work.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Opens a pool for `database_url`, creating the database file if needed.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(Self::from_pool(pool))
    }

    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the `notes` table and its index if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_NOTES_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_TITLE_INDEX).execute(&self.pool).await?;

        tracing::info!("DB schema is ready");

        Ok(())
    }

    /// Begins a unit of work. Dropping the session without calling
    /// [`Session::commit`] rolls back everything done through it.
    pub async fn session(&self) -> Result<Session, sqlx::Error> {
        let tx = self.pool.begin().await?;

        Ok(Session { tx })
    }

    /// Like [`Repository::session`], but takes SQLite's write lock up front
    /// so a read followed by a write cannot fail to upgrade under contention.
    pub async fn write_session(&self) -> Result<Session, sqlx::Error> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        Ok(Session { tx })
    }
}

pub struct Session {
    tx: Transaction<'static, Sqlite>,
}

impl Session {
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    pub async fn create_note(&mut self, title: String, content: String) -> Result<Note, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, Note>(
            "INSERT INTO notes (title, content, created_at, updated_at) VALUES (?, ?, ?, ?) \
             RETURNING id, title, content, created_at, updated_at",
        )
        .bind(title)
        .bind(content)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
    }

    pub async fn get_note(&mut self, id: i64) -> Result<Option<Note>, sqlx::Error> {
        sqlx::query_as::<_, Note>(
            "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
    }

    /// Notes in insertion order. `skip` and `limit` are used as given.
    pub async fn list_notes(&mut self, skip: i64, limit: i64) -> Result<Vec<Note>, sqlx::Error> {
        sqlx::query_as::<_, Note>(
            "SELECT id, title, content, created_at, updated_at FROM notes \
             ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.tx)
        .await
    }

    /// Overwrites the fields that are `Some` and refreshes `updated_at`.
    pub async fn update_note(
        &mut self,
        existing: Note,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<Note, sqlx::Error> {
        let mut note = existing;

        if let Some(title) = title {
            note.title = title;
        }
        if let Some(content) = content {
            note.content = content;
        }
        note.updated_at = Utc::now().max(note.created_at);

        sqlx::query_as::<_, Note>(
            "UPDATE notes SET title = ?, content = ?, updated_at = ? WHERE id = ? \
             RETURNING id, title, content, created_at, updated_at",
        )
        .bind(note.title)
        .bind(note.content)
        .bind(note.updated_at)
        .bind(note.id)
        .fetch_one(&mut *self.tx)
        .await
    }

    /// Returns `false` when the row was already gone.
    pub async fn delete_note(&mut self, existing: &Note) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(existing.id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
