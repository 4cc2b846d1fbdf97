use crate::adapters::AdapterRegistry;
use crate::audit::AuditLog;
use crate::auth::{bearer_token, HttpIntrospector, TokenIntrospector};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Caller;
use crate::service::GatewayService;
use axum::http::HeaderMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Application state shared across all request handlers.
///
/// The registry is built once here and never mutated; handlers only read it.
pub struct AppState {
    pub service: GatewayService,
    pub registry: Arc<AdapterRegistry>,
    pub audit: Arc<AuditLog>,
    pub introspector: Arc<dyn TokenIntrospector>,
    /// Flag indicating the service is ready (adapters registered)
    pub ready: AtomicBool,
    pub config: Arc<Config>,
    /// Flips to `true` once; open event streams end when it does.
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Build the HTTP clients, adapter registry and audit log from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let upstream = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .build()?;
        let auth_client = reqwest::Client::builder()
            .timeout(config.introspection_timeout())
            .build()?;

        let registry = AdapterRegistry::from_config(&config, upstream);
        let introspector = HttpIntrospector::new(auth_client, &config.auth_service_url);

        Ok(Self::with_components(config, registry, Arc::new(introspector)))
    }

    /// Assemble state from already-built collaborators.
    pub fn with_components(
        config: Config,
        registry: AdapterRegistry,
        introspector: Arc<dyn TokenIntrospector>,
    ) -> Self {
        let registry = Arc::new(registry);
        let audit = Arc::new(AuditLog::new(config.audit_max_len));
        let service = GatewayService::new(Arc::clone(&registry), Arc::clone(&audit));

        tracing::info!(
            platforms = ?registry.platforms(),
            audit_max_len = config.audit_max_len,
            "Gateway state initialized"
        );

        Self {
            service,
            registry,
            audit,
            introspector,
            ready: AtomicBool::new(true),
            config: Arc::new(config),
            shutdown: watch::channel(false).0,
        }
    }

    /// Resolve the caller from the `Authorization` header via the auth service.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Caller> {
        let token = bearer_token(headers)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
        let user = self.introspector.introspect(token).await?;
        Ok(Caller {
            token: token.to_string(),
            user,
        })
    }

    /// Check if the service is ready to handle requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst) && !self.registry.is_empty()
    }

    /// Stop reporting ready and end every open event stream.
    pub fn begin_shutdown(&self) {
        self.ready.store(false, Ordering::SeqCst);
        if !self.shutdown.send_replace(true) {
            tracing::info!("Shutdown started, closing event streams");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Resolves once [`AppState::begin_shutdown`] has been called.
    pub async fn shutdown_requested(&self) {
        let mut shutdown = self.shutdown_receiver();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = shutdown.wait_for(|stop| *stop).await;
    }
}
