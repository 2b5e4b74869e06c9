//! Query parameter extractors for list endpoints.

use serde::Deserialize;

use colloquy_types::memory::Role;

use crate::http::error::AppError;

/// Query parameters for the memory endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct MemoryQuery {
    /// Most recent N messages. Omitted means the whole log.
    pub limit: Option<u32>,
    /// Only messages with this role (system, user, assistant, gm).
    pub role: Option<String>,
}

impl MemoryQuery {
    pub fn role(&self) -> Result<Option<Role>, AppError> {
        self.role
            .as_deref()
            .map(|r| r.parse::<Role>().map_err(AppError::Validation))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        let query = MemoryQuery {
            limit: Some(5),
            role: Some("GM".to_string()),
        };
        assert_eq!(query.role().unwrap(), Some(Role::Gm));

        let none = MemoryQuery::default();
        assert_eq!(none.role().unwrap(), None);

        let bad = MemoryQuery {
            limit: None,
            role: Some("narrator".to_string()),
        };
        assert!(matches!(bad.role(), Err(AppError::Validation(_))));
    }
}
