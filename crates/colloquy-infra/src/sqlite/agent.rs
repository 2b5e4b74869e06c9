//! SQLite agent repository implementation.
//!
//! Implements `AgentRepository` from `colloquy-core` using sqlx with split read/write pools.

use chrono::{DateTime, Utc};
use colloquy_core::repository::agent::AgentRepository;
use colloquy_types::agent::{Agent, AgentId};
use colloquy_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `AgentRepository`.
#[derive(Clone)]
pub struct SqliteAgentRepository {
    pool: DatabasePool,
}

impl SqliteAgentRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Agent.
struct AgentRow {
    id: String,
    name: String,
    persona: String,
    created_at: String,
    last_active_at: Option<String>,
}

impl AgentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            persona: row.try_get("persona")?,
            created_at: row.try_get("created_at")?,
            last_active_at: row.try_get("last_active_at")?,
        })
    }

    fn into_agent(self) -> Result<Agent, RepositoryError> {
        let id = self
            .id
            .parse::<AgentId>()
            .map_err(|e| RepositoryError::Query(format!("invalid agent id: {e}")))?;

        let created_at = parse_datetime(&self.created_at)?;
        let last_active_at = self
            .last_active_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;

        Ok(Agent {
            id,
            name: self.name,
            persona: self.persona,
            created_at,
            last_active_at,
        })
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn map_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Agent>, RepositoryError> {
    let mut agents = Vec::with_capacity(rows.len());
    for row in rows {
        let agent_row =
            AgentRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        agents.push(agent_row.into_agent()?);
    }
    Ok(agents)
}

impl AgentRepository for SqliteAgentRepository {
    async fn insert_if_absent(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        sqlx::query(
            "INSERT OR IGNORE INTO agents (id, name, persona, created_at, last_active_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(agent.id.to_string())
        .bind(&agent.name)
        .bind(&agent.persona)
        .bind(format_datetime(&agent.created_at))
        .bind(agent.last_active_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Read back through the writer so the row is visible immediately.
        let row = sqlx::query("SELECT * FROM agents WHERE name = ?")
            .bind(&agent.name)
            .fetch_one(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        AgentRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_agent()
    }

    async fn get_by_id(&self, id: &AgentId) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let agent_row =
                    AgentRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(agent_row.into_agent()?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let agent_row =
                    AgentRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(agent_row.into_agent()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Agent>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM agents ORDER BY name ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        let agent = Agent::new("Alice", "A witty merchant.");

        let stored = repo.insert_if_absent(&agent).await.unwrap();
        assert_eq!(stored.id, agent.id);
        assert_eq!(stored.persona, "A witty merchant.");

        let by_id = repo.get_by_id(&agent.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Alice");
        let by_name = repo.get_by_name("Alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, agent.id);
    }

    #[tokio::test]
    async fn test_insert_existing_name_returns_original() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        let first = repo
            .insert_if_absent(&Agent::new("Bob", "A blacksmith."))
            .await
            .unwrap();
        let second = repo
            .insert_if_absent(&Agent::new("Bob", "A baker."))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.persona, "A blacksmith.");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        assert!(repo.get_by_id(&AgentId::new()).await.unwrap().is_none());
        assert!(repo.get_by_name("Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let repo = SqliteAgentRepository::new(test_pool().await);
        for name in ["Charlie", "Alice", "Bob"] {
            repo.insert_if_absent(&Agent::new(name, "Someone."))
                .await
                .unwrap();
        }
        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);
    }
}
