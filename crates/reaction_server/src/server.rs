use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;
use log::info;
use reaction_core::db::open_db;
use tokio::net::TcpListener;

/// Reaction ledger HTTP server.
pub struct ReactionServer {
    config: ServerConfig,
}

impl ReactionServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Builds the router over the configured database (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        Ok(build_router(AppState::from_config(&self.config)?))
    }

    /// Prepares the database and starts serving requests.
    ///
    /// Migrations run once here, before the listener accepts connections.
    pub async fn serve(self) -> ServerResult<()> {
        if let Some(log_dir) = &self.config.log_dir {
            let log_dir = log_dir.to_str().ok_or_else(|| {
                ServerError::Config("log_dir must be valid UTF-8".to_string())
            })?;
            reaction_core::init_logging(&self.config.log_level, log_dir)?;
        }

        let db_path = self.config.db_path.clone();
        tokio::task::spawn_blocking(move || open_db(db_path).map(drop))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))??;

        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            "event=server_start module=http status=ok bind_addr={}",
            self.config.bind_addr
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
