//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! The registry and turn engine are generic over repository/backend traits;
//! AppState pins them to the SQLite and HTTP implementations.

use std::path::PathBuf;
use std::sync::Arc;

use colloquy_core::conversation::engine::{EngineSettings, TurnEngine};
use colloquy_core::persona::PersonaRegistry;
use colloquy_infra::config::{load_global_config, resolve_data_dir};
use colloquy_infra::llm::HttpBackendAdapter;
use colloquy_infra::sqlite::agent::SqliteAgentRepository;
use colloquy_infra::sqlite::memory::SqliteMemoryRepository;
use colloquy_infra::sqlite::pool::{DatabasePool, database_url};
use colloquy_types::config::GlobalConfig;

use crate::jobs::ConversationJobs;

pub type ConcreteRegistry = PersonaRegistry<SqliteAgentRepository>;

pub type ConcreteEngine = TurnEngine<SqliteMemoryRepository, HttpBackendAdapter>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConcreteRegistry>,
    pub engine: Arc<ConcreteEngine>,
    pub config: Arc<GlobalConfig>,
    pub conversations: ConversationJobs,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        Ok(Self::from_parts(db_pool, config, data_dir))
    }

    /// Wire services over an existing pool and config.
    pub fn from_parts(db_pool: DatabasePool, config: GlobalConfig, data_dir: PathBuf) -> Self {
        let registry = PersonaRegistry::new(SqliteAgentRepository::new(db_pool.clone()));
        let engine = TurnEngine::new(
            SqliteMemoryRepository::new(db_pool.clone()),
            HttpBackendAdapter::new(),
            EngineSettings::from(&config),
        );

        Self {
            registry: Arc::new(registry),
            engine: Arc::new(engine),
            config: Arc::new(config),
            conversations: ConversationJobs::new(),
            data_dir,
        }
    }
}
