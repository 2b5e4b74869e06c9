//! Test fixtures for CLI and HTTP handler tests.

use colloquy_infra::sqlite::pool::DatabasePool;
use colloquy_types::config::GlobalConfig;
use colloquy_types::llm::BackendOverrides;

use crate::state::AppState;

/// AppState over a throwaway database.
///
/// The Ollama backend points at the discard port so every turn fails fast
/// with a connection error instead of reaching a real daemon.
pub async fn test_state() -> AppState {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let data_dir = dir.path().to_path_buf();
    // Leak tempdir so it lives for the test
    std::mem::forget(dir);

    let mut config = GlobalConfig::default();
    config.backends.ollama = Some(BackendOverrides {
        base_url: Some("http://127.0.0.1:9".to_string()),
        timeout_secs: Some(5),
        ..Default::default()
    });

    let pool = DatabasePool::new(&url).await.unwrap();
    AppState::from_parts(pool, config, data_dir)
}
