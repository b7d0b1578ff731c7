//! Entry point: load config, wire dependencies, and run the server.

use portal::auth::PasswordVerifier;
use portal::config::Config;
use portal::db::{self, memory, JobQueue, PgJobQueue, PgUserRepository, SessionStore, UserRepository};
use portal::repositories::RedisSessionStore;
use portal::{create_app, AppState, CookieSigner, Mailer};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (users, jobs, sessions): (
        Arc<dyn UserRepository>,
        Arc<dyn JobQueue>,
        Arc<dyn SessionStore>,
    ) = if config.env.uses_memory_backends() {
        tracing::warn!("using in-memory stores; data is lost on exit");
        (
            Arc::new(memory::MemoryUserRepository::new()) as Arc<dyn UserRepository>,
            Arc::new(memory::MemoryJobQueue::new()) as Arc<dyn JobQueue>,
            Arc::new(memory::MemorySessionStore::new()) as Arc<dyn SessionStore>,
        )
    } else {
        let db_pool = db::create_pool(&config.database_url).await?;
        db::migrate(&db_pool).await?;
        (
            Arc::new(PgUserRepository::new(db_pool.clone())) as Arc<dyn UserRepository>,
            Arc::new(PgJobQueue::new(db_pool)) as Arc<dyn JobQueue>,
            Arc::new(RedisSessionStore::new(&config.redis_url)?) as Arc<dyn SessionStore>,
        )
    };

    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        users: users.clone(),
        sessions,
        credentials: Arc::new(PasswordVerifier::new(users)),
        mailer: Mailer::new(jobs, &config),
        signer: CookieSigner::new(&config.session.key),
    };

    let app = create_app(state).nest_service("/assets", ServeDir::new("public"));

    tracing::info!(addr = %config.server_addr, env = ?config.env, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
