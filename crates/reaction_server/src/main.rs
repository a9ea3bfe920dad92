use reaction_server::{ReactionServer, ServerConfig, ServerResult};

/// Usage: `reaction-server [config.toml]`; `REACTION_*` variables override
/// the file.
#[tokio::main]
async fn main() -> ServerResult<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    ReactionServer::new(config.with_env_overrides()?)
        .serve()
        .await
}
