use color_eyre::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::queries::{delete_value, get_value, put_value};

/// Fixed name the credential is persisted under
pub const CREDENTIAL_KEY: &str = "key";

/// Owns the single API key credential.
///
/// `credential()` is the reactive state the UI is composed from: absent means
/// the login view, present means the explorer. Without a database the store
/// still works for the current session, it just forgets the key on exit.
#[derive(Debug, Default)]
pub struct SessionStore {
    pool: Option<SqlitePool>,
    api_key: Option<String>,
}

impl SessionStore {
    pub const fn new(pool: Option<SqlitePool>) -> Self {
        Self {
            pool,
            api_key: None,
        }
    }

    pub fn attach_pool(&mut self, pool: SqlitePool) {
        self.pool = Some(pool);
    }

    pub const fn has_storage(&self) -> bool {
        self.pool.is_some()
    }

    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub const fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    /// Reads the persisted credential into the reactive state
    pub async fn get_credential(&mut self) -> Result<Option<&str>> {
        if let Some(pool) = &self.pool {
            let stored = get_value(pool, CREDENTIAL_KEY)
                .await?
                .filter(|key| !key.trim().is_empty());
            debug!(found = stored.is_some(), "loaded stored credential");
            if stored.is_some() {
                self.api_key = stored;
            }
        }
        Ok(self.credential())
    }

    /// Stores `token` and switches the reactive state to authenticated. The
    /// in-memory state is updated even if persisting fails.
    pub async fn set_credential(&mut self, token: &str) -> Result<()> {
        let token = token.trim().to_string();
        self.api_key = Some(token.clone());

        if let Some(pool) = &self.pool {
            put_value(pool, CREDENTIAL_KEY, &token).await?;
        }
        info!("API key stored");
        Ok(())
    }

    /// Forgets the credential. The reactive state is reset before touching
    /// storage so the UI reverts to the login view regardless.
    pub async fn clear_credential(&mut self) -> Result<()> {
        self.api_key = None;

        if let Some(pool) = &self.pool {
            delete_value(pool, CREDENTIAL_KEY).await?;
        }
        info!("API key cleared");
        Ok(())
    }
}
