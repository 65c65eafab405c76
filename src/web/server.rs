//! Web server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::auth::SessionManager;
use crate::config::Config;
use crate::{MmivError, Result};

use super::router::{create_health_router, create_router, create_static_router};
use super::state::AppState;

/// Web server for the board.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    cors_origins: Vec<String>,
    static_path: Option<String>,
    cleanup_interval: Duration,
}

impl WebServer {
    /// Create a server for `config` around prepared state.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| MmivError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins: config.web.cors_origins.clone(),
            static_path: config
                .web
                .serve_static
                .then(|| config.web.static_path.clone()),
            cleanup_interval: Duration::from_secs(config.session.cleanup_interval_secs.max(1)),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The complete application router.
    pub fn router(&self) -> Router {
        let mut router = create_router(self.app_state.clone(), &self.cors_origins)
            .merge(create_health_router());

        if let Some(path) = &self.static_path {
            if let Some(static_router) = create_static_router(path) {
                router = router.merge(static_router);
            }
        }
        router
    }

    /// Periodically drop expired sessions.
    fn start_session_cleanup_task(sessions: SessionManager, every: Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;
                let removed = sessions.cleanup();
                if removed > 0 {
                    tracing::info!(removed, "Cleaned up expired sessions");
                } else {
                    tracing::debug!("No expired sessions to clean up");
                }
            }
        });
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        Self::start_session_cleanup_task(self.app_state.sessions.clone(), self.cleanup_interval);
        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the bound address.
    ///
    /// Useful for tests binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        Self::start_session_cleanup_task(self.app_state.sessions.clone(), self.cleanup_interval);
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_server() -> (WebServer, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.port = 0;
        config.uploads.path = dir.path().join("uploads").to_string_lossy().into_owned();

        let db = Database::open_in_memory().await.unwrap();
        let state = AppState::from_config(&config, db).unwrap();
        (WebServer::new(&config, state).unwrap(), dir)
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let (server, _dir) = test_server().await;
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let mut config = Config::default();
        config.server.host = "not an address".to_string();
        let dir = tempfile::tempdir().unwrap();
        config.uploads.path = dir.path().to_string_lossy().into_owned();

        let db = Database::open_in_memory().await.unwrap();
        let state = AppState::from_config(&config, db).unwrap();
        assert!(matches!(
            WebServer::new(&config, state),
            Err(MmivError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let (server, _dir) = test_server().await;
        let addr = server.run_with_addr().await.unwrap();
        assert_ne!(addr.port(), 0);

        // Raw HTTP/1.0 request to keep the test free of an HTTP client.
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.0\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.") && response.contains(" 200 "), "{response}");
        assert!(response.ends_with("OK"));
    }
}
