use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::DashboardConfig;
use crate::location::LocationProvider;
use crate::models::ConnectionState;
use crate::render::Renderer;
use crate::store::NotificationStore;

pub type SharedState = Arc<DashboardState>;

/// Everything one dashboard client owns: built once at startup and handed by
/// reference to the connection task and the pull calls.
pub struct DashboardState {
    pub config: DashboardConfig,
    pub connection: RwLock<ConnectionState>,
    pub notifications: NotificationStore,
    pub renderer: Arc<dyn Renderer>,
    pub location: Arc<dyn LocationProvider>,
    pub http_client: reqwest::Client,
}

impl DashboardState {
    pub fn new(
        config: DashboardConfig,
        renderer: Arc<dyn Renderer>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(4)
            .build()
            .expect("Failed to create HTTP client");
        let notifications = NotificationStore::new(config.notification_capacity);
        Self {
            config,
            connection: RwLock::new(ConnectionState::Idle),
            notifications,
            renderer,
            location,
            http_client,
        }
    }

    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection.read().await
    }

    pub async fn set_connection_state(&self, next: ConnectionState) {
        *self.connection.write().await = next;
    }
}
