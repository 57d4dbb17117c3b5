use anyhow::{self, Error as AnyhowError};
use db::DBService;
use server::{AppState, file_logging, routes};
use services::services::config::{ConfigError, load_config_from_file, save_config_to_file};
use sqlx::Error as SqlxError;
use strip_ansi_escapes::strip;
use thiserror::Error;
use utils::assets::{asset_dir, config_path};

#[derive(Debug, Error)]
pub enum TaskboardError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), TaskboardError> {
    dotenvy::dotenv().ok();

    // The guard flushes file logs on drop and must outlive the server.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _file_log_guard = file_logging::init_logging(&log_level);

    let assets = asset_dir();
    if !assets.exists() {
        std::fs::create_dir_all(&assets)?;
    }

    let config_path = config_path();
    let mut config = load_config_from_file(&config_path).await;
    config.apply_env_overrides();
    config.validate()?;
    if let Err(e) = save_config_to_file(&config, &config_path).await {
        tracing::warn!("Failed to save config to {}: {}", config_path.display(), e);
    }

    let db = DBService::new().await?;

    let port = std::env::var("BACKEND_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|s| {
            let cleaned = String::from_utf8_lossy(&strip(s.as_bytes())).into_owned();
            cleaned.trim().parse::<u16>().ok()
        })
        .unwrap_or_else(|| {
            tracing::info!("No PORT environment variable set, using port 0 for auto-assignment");
            0
        });

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    let actual_port = listener.local_addr()?.port();

    let public_url = config
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://{host}:{actual_port}"));
    let state = AppState::with_default_storage(db, config, &public_url);
    let app_router = routes::router(state.clone());

    tracing::info!("Server running on http://{host}:{actual_port}");

    axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    perform_cleanup_actions(&state).await;
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
            } else {
                tracing::error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}

/// Flush the WAL into the main database file and close the pool.
pub async fn perform_cleanup_actions(state: &AppState) {
    tracing::info!("Running final WAL checkpoint...");
    match state.db.checkpoint().await {
        Ok(()) => tracing::info!("Final WAL checkpoint completed"),
        Err(e) => tracing::warn!(
            "Final WAL checkpoint failed (data may still be in WAL): {}",
            e
        ),
    }

    tracing::info!("Closing database connection pool...");
    state.pool().close().await;
    tracing::info!("Database connection pool closed");
}
