//! Network module with deferred startup lifecycle.
//!
//! `new()` assembles shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the shutdown signal fires.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    contribute_to_goal, create_budget, create_goal, create_transaction, current_user,
    delete_budget, delete_goal, delete_transaction, health_handler, list_budgets, list_goals,
    list_transactions, liveness_handler, login, logout, readiness_handler, register_user,
    update_budget, update_transaction, AppState,
};
use super::identity::identity_middleware;
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::app::App;

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` -- allocates shared state (shutdown controller, handler state)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- accepts connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a new network module for `app` without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, app: &App) -> Self {
        let state = AppState {
            dispatcher: Arc::clone(&app.dispatcher),
            tokens: Arc::clone(&app.tokens),
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(config.clone()),
            start_time: Instant::now(),
        };
        Self {
            config,
            listener: None,
            state,
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured
    /// port when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves, then drains in-flight
    /// requests and transitions to Stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, if TLS material
    /// cannot be loaded, or on a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = build_router(self.state.clone(), &self.config);
        let shutdown_ctrl = Arc::clone(&self.state.shutdown);

        shutdown_ctrl.set_ready();

        let served = if let Some(ref tls_config) = self.config.tls {
            serve_tls(listener, router, tls_config, Arc::clone(&shutdown_ctrl), shutdown).await
        } else {
            serve_plain(listener, router, Arc::clone(&shutdown_ctrl), shutdown).await
        };

        drain(&shutdown_ctrl, &self.config).await;
        served
    }
}

fn build_router(state: AppState, config: &NetworkConfig) -> Router {
    let api = Router::new()
        .route("/api/users", post(register_user))
        .route("/api/users/me", get(current_user))
        .route("/api/sessions", post(login).delete(logout))
        .route(
            "/api/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/api/transactions/{id}",
            put(update_transaction).delete(delete_transaction),
        )
        .route("/api/budgets", get(list_budgets).post(create_budget))
        .route("/api/budgets/{id}", put(update_budget).delete(delete_budget))
        .route("/api/goals", get(list_goals).post(create_goal))
        .route("/api/goals/{id}", delete(delete_goal))
        .route("/api/goals/{id}/contributions", post(contribute_to_goal))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .merge(api)
        .layer(build_http_layers(config))
        .with_state(state)
}

/// Serves plain HTTP connections using axum's built-in server.
async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown_ctrl: Arc<ShutdownController>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("Serving plain HTTP connections");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            shutdown_ctrl.trigger_shutdown();
        })
        .await?;
    Ok(())
}

/// Serves TLS connections using `axum-server` with rustls.
///
/// Reuses the pre-bound TCP listener by converting it to a `std::net::TcpListener`.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls_config: &TlsConfig,
    shutdown_ctrl: Arc<ShutdownController>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls_config.cert_path, &tls_config.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_ctrl.trigger_shutdown();
        shutdown_handle.graceful_shutdown(None);
    });

    info!("Serving TLS connections on {}", addr);

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

/// Waits for in-flight requests, then reports how the drain went.
async fn drain(shutdown_ctrl: &ShutdownController, config: &NetworkConfig) {
    shutdown_ctrl.trigger_shutdown();
    if shutdown_ctrl.wait_for_drain(config.drain_timeout).await {
        info!("All in-flight requests drained");
    } else {
        warn!(
            in_flight = shutdown_ctrl.in_flight_count(),
            "Drain timeout expired with in-flight requests remaining"
        );
    }
}
