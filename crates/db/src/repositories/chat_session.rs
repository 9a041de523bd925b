use sqlx::{Row, Sqlite, Transaction};

use tourbook_core::domain::chat::{ChatRole, ChatSession, ChatTurn};
use tourbook_core::domain::preferences::Preferences;

use super::{ChatSessionRepository, RepositoryError};
use crate::{timestamp_now, DbPool};

pub struct SqlChatSessionRepository {
    pool: DbPool,
}

impl SqlChatSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_preferences(raw: &str) -> Result<Preferences, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn encode_preferences(preferences: &Preferences) -> Result<String, RepositoryError> {
    serde_json::to_string(preferences).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<ChatSession, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let preferences_json: String =
        row.try_get("preferences_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ChatSession { id, preferences: parse_preferences(&preferences_json)?, created_at, updated_at })
}

async fn merge_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: &str,
    preferences: &Preferences,
    now: &str,
) -> Result<ChatSession, RepositoryError> {
    let existing = sqlx::query(
        "SELECT id, preferences_json, created_at, updated_at FROM chat_session WHERE id = ?",
    )
    .bind(session_id)
    .fetch_optional(&mut **tx)
    .await?;

    let (stored, created_at) = match existing {
        Some(ref row) => {
            let session = row_to_session(row)?;
            (session.preferences, session.created_at)
        }
        None => (Preferences::default(), now.to_owned()),
    };
    let merged = stored.merged(preferences);

    sqlx::query(
        "INSERT INTO chat_session (id, preferences_json, created_at, updated_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             preferences_json = excluded.preferences_json,
             updated_at = excluded.updated_at",
    )
    .bind(session_id)
    .bind(encode_preferences(&merged)?)
    .bind(&created_at)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(ChatSession {
        id: session_id.to_owned(),
        preferences: merged,
        created_at,
        updated_at: now.to_owned(),
    })
}

#[async_trait::async_trait]
impl ChatSessionRepository for SqlChatSessionRepository {
    async fn load(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, preferences_json, created_at, updated_at FROM chat_session WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_session(r)?)),
            None => Ok(None),
        }
    }

    async fn save_preferences(
        &self,
        session_id: &str,
        preferences: &Preferences,
    ) -> Result<Preferences, RepositoryError> {
        let now = timestamp_now();
        let mut tx = self.pool.begin().await?;
        let session = merge_in_tx(&mut tx, session_id, preferences, &now).await?;
        tx.commit().await?;
        Ok(session.preferences)
    }

    async fn record_exchange(
        &self,
        session_id: &str,
        preferences: &Preferences,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<ChatSession, RepositoryError> {
        let now = timestamp_now();
        let mut tx = self.pool.begin().await?;
        let session = merge_in_tx(&mut tx, session_id, preferences, &now).await?;

        for (role, message) in
            [(ChatRole::User, user_message), (ChatRole::Assistant, assistant_message)]
        {
            sqlx::query(
                "INSERT INTO chat_turn (session_id, role, message, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(session_id)
            .bind(role.as_str())
            .bind(message)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(session)
    }

    async fn history(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, message, created_at FROM (
                 SELECT id, role, message, created_at FROM chat_turn
                 WHERE session_id = ?
                 ORDER BY id DESC
                 LIMIT ?
             ) ORDER BY id ASC",
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let role: String =
                    row.try_get("role").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                let role = ChatRole::parse(&role)
                    .ok_or_else(|| RepositoryError::Decode(format!("unknown chat role `{role}`")))?;
                Ok(ChatTurn {
                    role,
                    message: row
                        .try_get("message")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    created_at: row
                        .try_get("created_at")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                })
            })
            .collect()
    }
}
