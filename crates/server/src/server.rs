use axum::{
    Router, middleware,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{
    LogNotifier, NotificationSettings, Notifier, TokenSigner, auth, expenses, labels, reports,
    views,
};
use engine::{Engine, LabelKind};

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: TokenSigner,
    pub notifier: Arc<dyn Notifier>,
    pub notifications: NotificationSettings,
}

impl ServerState {
    /// State logging notifications instead of pushing them.
    pub fn new(engine: Engine, tokens: TokenSigner) -> Self {
        Self {
            engine: Arc::new(engine),
            tokens,
            notifier: Arc::new(LogNotifier),
            notifications: NotificationSettings::default(),
        }
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn notifications(mut self, notifications: NotificationSettings) -> Self {
        self.notifications = notifications;
        self
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(labels::routes(LabelKind::PayMethod))
        .merge(labels::routes(LabelKind::Category))
        .route("/expenses/", get(expenses::list).post(expenses::create))
        .route(
            "/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        .route("/charts/", get(reports::charts))
        .route("/monthly_update/", get(reports::monthly_update))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::auth))
        .route("/", get(views::home))
        .route("/login/", post(views::login))
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}
