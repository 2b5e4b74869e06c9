//! SQLite memory repository implementation.
//!
//! Implements `MemoryRepository` from `colloquy-core`. Timestamps are stored
//! as integer microseconds so that "strictly greater than the previous
//! message" can be enforced inside the append transaction.

use chrono::{DateTime, Utc};
use colloquy_core::repository::memory::MemoryRepository;
use colloquy_types::agent::AgentId;
use colloquy_types::error::{MemoryError, ReferenceError, RepositoryError};
use colloquy_types::memory::{MemoryMessage, Role};
use sqlx::Row;

use super::agent::format_datetime;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `MemoryRepository`.
#[derive(Clone)]
pub struct SqliteMemoryRepository {
    pool: DatabasePool,
}

impl SqliteMemoryRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MessageRow {
    id: i64,
    agent_id: String,
    role: String,
    content: String,
    created_at: i64,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            agent_id: row.try_get("agent_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<MemoryMessage, RepositoryError> {
        let agent_id = self
            .agent_id
            .parse::<AgentId>()
            .map_err(|e| RepositoryError::Query(format!("invalid agent id: {e}")))?;
        let role: Role = self.role.parse().map_err(RepositoryError::Query)?;

        Ok(MemoryMessage {
            id: self.id,
            agent_id,
            role,
            content: self.content,
            created_at: from_micros(self.created_at)?,
        })
    }
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| RepositoryError::Query(format!("invalid timestamp: {micros}")))
}

fn query_err(e: sqlx::Error) -> MemoryError {
    MemoryError::Storage(RepositoryError::Query(e.to_string()))
}

/// Next timestamp for an agent: now, or one microsecond past the last entry
/// when the clock has not advanced (or went backwards).
fn next_timestamp(last: Option<i64>, now: i64) -> i64 {
    match last {
        Some(last) if last >= now => last + 1,
        _ => now,
    }
}

impl MemoryRepository for SqliteMemoryRepository {
    async fn append(
        &self,
        agent_id: &AgentId,
        role: Role,
        content: &str,
    ) -> Result<MemoryMessage, MemoryError> {
        let id_str = agent_id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM agents WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?;
        if exists.is_none() {
            return Err(ReferenceError::UnknownAgent(*agent_id).into());
        }

        let last: Option<i64> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM messages WHERE agent_id = ?")
                .bind(&id_str)
                .fetch_one(&mut *tx)
                .await
                .map_err(query_err)?;
        let now = Utc::now();
        let created_at = next_timestamp(last, now.timestamp_micros());

        let result = sqlx::query(
            "INSERT INTO messages (agent_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id_str)
        .bind(role.to_string())
        .bind(content)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        if role == Role::Assistant {
            sqlx::query("UPDATE agents SET last_active_at = ? WHERE id = ?")
                .bind(format_datetime(&now))
                .bind(&id_str)
                .execute(&mut *tx)
                .await
                .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;

        Ok(MemoryMessage {
            id: result.last_insert_rowid(),
            agent_id: *agent_id,
            role,
            content: content.to_string(),
            created_at: from_micros(created_at)?,
        })
    }

    async fn read_tail(
        &self,
        agent_id: &AgentId,
        limit: Option<u32>,
        role: Option<Role>,
    ) -> Result<Vec<MemoryMessage>, MemoryError> {
        let role_filter = if role.is_some() { " AND role = ?" } else { "" };
        let sql = format!(
            "SELECT * FROM (
                 SELECT id, agent_id, role, content, created_at FROM messages
                 WHERE agent_id = ?{role_filter}
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?
             ) ORDER BY created_at ASC, id ASC"
        );

        let mut query = sqlx::query(&sql).bind(agent_id.to_string());
        if let Some(role) = role {
            query = query.bind(role.to_string());
        }
        // LIMIT -1 means unbounded in SQLite.
        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows = query
            .bind(limit)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row = MessageRow::from_row(row).map_err(query_err)?;
            messages.push(message_row.into_message()?);
        }
        Ok(messages)
    }

    async fn clear(&self, agent_id: &AgentId) -> Result<u64, MemoryError> {
        let id_str = agent_id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM agents WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?;
        if exists.is_none() {
            return Err(ReferenceError::UnknownAgent(*agent_id).into());
        }

        let result = sqlx::query("DELETE FROM messages WHERE agent_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;
        Ok(result.rows_affected())
    }

    async fn count(&self, agent_id: &AgentId) -> Result<u64, MemoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE agent_id = ?")
            .bind(agent_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;
        Ok(count as u64)
    }
}
