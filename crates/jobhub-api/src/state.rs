//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use jobhub_auth::WebhookAuthenticator;
use jobhub_core::config::AppConfig;
use jobhub_core::traits::JobBroker;
use jobhub_database::Stores;
use jobhub_service::{CompletionDispatcher, NotificationService, StatusService, SubmissionService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Job broker
    pub broker: Arc<dyn JobBroker>,
    /// Subject and notification stores
    pub stores: Stores,

    // ── Auth ─────────────────────────────────────────────────
    /// Completion webhook authenticator
    pub authenticator: Arc<WebhookAuthenticator>,

    // ── Services ─────────────────────────────────────────────
    /// Job submission
    pub submissions: Arc<SubmissionService>,
    /// Job status and statistics
    pub status: Arc<StatusService>,
    /// Completion event dispatcher
    pub dispatcher: Arc<CompletionDispatcher>,
    /// Notification log
    pub notifications: NotificationService,

    /// When the process started serving
    pub started_at: Instant,
}

impl AppState {
    /// Wire the services on top of a broker, stores and authenticator.
    pub fn new(
        config: AppConfig,
        broker: Arc<dyn JobBroker>,
        stores: Stores,
        authenticator: WebhookAuthenticator,
    ) -> Self {
        let notifications = NotificationService::new(
            Arc::clone(&stores.notifications),
            Arc::clone(&stores.completions),
        );
        let dispatcher = CompletionDispatcher::new(notifications.clone());

        Self {
            config: Arc::new(config),
            submissions: Arc::new(SubmissionService::new(Arc::clone(&broker))),
            status: Arc::new(StatusService::new(Arc::clone(&broker))),
            dispatcher: Arc::new(dispatcher),
            notifications,
            authenticator: Arc::new(authenticator),
            broker,
            stores,
            started_at: Instant::now(),
        }
    }
}
