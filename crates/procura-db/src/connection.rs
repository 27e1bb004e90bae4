//! SurrealDB connection management.

use surrealdb::{Connection, Surreal};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "procura".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Process-lifetime handle to the store.
///
/// Constructed once at startup, cloned into every repository, and
/// closed explicitly on shutdown.
pub struct DbManager<C: Connection = Client> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for DbManager<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl DbManager<Client> {
    /// Open the WebSocket connection, sign in as root and select the
    /// marketplace namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace).use_db(&config.database).await?;

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Store connected"
        );
        Ok(Self { db })
    }
}

impl<C: Connection> DbManager<C> {
    /// Wrap a client that is already connected and scoped to a database.
    pub fn from_client(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Shared client; clone it into each repository.
    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }

    /// Round-trip a trivial query to verify the store is reachable.
    pub async fn ping(&self) -> Result<(), DbError> {
        self.db
            .query("RETURN true")
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    /// Sign the session out and drop this handle.
    ///
    /// The WebSocket connection is shared by every clone of the client and
    /// only shuts down once the last clone is dropped, so drop the
    /// repositories before calling this.
    pub async fn close(self) -> Result<(), DbError> {
        self.db.invalidate().await?;
        drop(self.db);
        info!("SurrealDB session closed");
        Ok(())
    }
}
