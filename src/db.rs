use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::config::AppConfig;
use crate::models::{ChatMessage, Sender, SessionSummary};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.data_dir).await?;

        let options = SqliteConnectOptions::from_str(&config.sqlite_dsn())?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Single-connection in-memory database; every pooled connection to
    /// `sqlite::memory:` would otherwise see its own empty schema.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                sender TEXT NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create_session(&self, title: &str) -> Result<SessionSummary> {
        let created_at = Utc::now();
        let result = sqlx::query("INSERT INTO sessions (title, created_at) VALUES (?, ?)")
            .bind(title)
            .bind(created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(SessionSummary {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            created_at,
            last_message: String::new(),
        })
    }

    pub async fn session_exists(&self, session_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.title, s.created_at,
                   COALESCE(
                       (SELECT m.text FROM messages m
                        WHERE m.session_id = s.id
                        ORDER BY m.id DESC
                        LIMIT 1),
                       ''
                   ) AS last_message
            FROM sessions s
            ORDER BY s.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SessionSummary {
                id: r.get("id"),
                title: r.get("title"),
                created_at: parse_timestamp(&r.get::<String, _>("created_at")),
                last_message: r.get("last_message"),
            })
            .collect())
    }

    pub async fn session_messages(&self, session_id: i64) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sender, text, created_at
            FROM messages
            WHERE session_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_message).collect())
    }

    pub async fn save_message(&self, session_id: i64, sender: Sender, text: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (session_id, sender, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(sender.as_str())
        .bind(text)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_message(row: SqliteRow) -> ChatMessage {
    ChatMessage {
        id: row.get("id"),
        sender: Sender::from_db(&row.get::<String, _>("sender")),
        text: row.get("text"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at")),
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_list_newest_first_with_last_message() {
        let db = Database::in_memory().await.unwrap();
        let first = db.create_session("first").await.unwrap();
        let second = db.create_session("second").await.unwrap();

        db.save_message(first.id, Sender::User, "hello").await.unwrap();
        db.save_message(first.id, Sender::Assistant, "hi there")
            .await
            .unwrap();

        let sessions = db.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, second.id);
        assert_eq!(sessions[0].last_message, "");
        assert_eq!(sessions[1].last_message, "hi there");
    }

    #[tokio::test]
    async fn messages_come_back_in_insertion_order() {
        let db = Database::in_memory().await.unwrap();
        let session = db.create_session("chat").await.unwrap();
        db.save_message(session.id, Sender::User, "one").await.unwrap();
        db.save_message(session.id, Sender::Assistant, "two")
            .await
            .unwrap();

        let messages = db.session_messages(session.id).await.unwrap();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert!(db.session_exists(session.id).await.unwrap());
        assert!(!db.session_exists(session.id + 100).await.unwrap());
    }
}
