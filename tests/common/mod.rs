#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crash_alert_client::config::DashboardConfig;
use crash_alert_client::location::{
    LocationError, LocationProvider, PermissionStatus, PositionOptions,
};
use crash_alert_client::models::{AdvisoryResult, AlertRecord, HistoryRecord, LocationCoordinate};
use crash_alert_client::render::{Control, Renderer, StatusArea};
use crash_alert_client::state::{DashboardState, SharedState};

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[derive(Default)]
pub struct RecordingRenderer {
    pub notifications: Mutex<Vec<AlertRecord>>,
    pub history_tables: Mutex<Vec<Vec<HistoryRecord>>>,
    pub advisories: Mutex<Vec<AdvisoryResult>>,
    pub advisory_errors: Mutex<Vec<String>>,
    pub statuses: Mutex<Vec<(StatusArea, String)>>,
    pub controls: Mutex<HashMap<Control, bool>>,
    pub control_log: Mutex<Vec<(Control, bool)>>,
}

impl RecordingRenderer {
    pub fn statuses_for(&self, area: StatusArea) -> Vec<String> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| *a == area)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn last_status(&self, area: StatusArea) -> Option<String> {
        self.statuses_for(area).pop()
    }

    pub fn control_enabled(&self, control: Control) -> Option<bool> {
        self.controls.lock().unwrap().get(&control).copied()
    }
}

impl Renderer for RecordingRenderer {
    fn render_notification(&self, record: &AlertRecord) {
        self.notifications.lock().unwrap().push(record.clone());
    }

    fn render_history_table(&self, records: &[HistoryRecord]) {
        self.history_tables.lock().unwrap().push(records.to_vec());
    }

    fn render_advisory(&self, advisory: &AdvisoryResult) {
        self.advisories.lock().unwrap().push(advisory.clone());
    }

    fn render_advisory_error(&self, message: &str) {
        self.advisory_errors.lock().unwrap().push(message.to_string());
    }

    fn render_status(&self, area: StatusArea, text: &str) {
        self.statuses.lock().unwrap().push((area, text.to_string()));
    }

    fn set_control_enabled(&self, control: Control, enabled: bool) {
        self.controls.lock().unwrap().insert(control, enabled);
        self.control_log.lock().unwrap().push((control, enabled));
    }
}

pub enum PositionBehavior {
    Fixed(LocationCoordinate),
    Fails,
    Hangs,
}

/// Scripted permission/position facility.
pub struct FakeLocation {
    pub available: bool,
    pub permission: Result<PermissionStatus, ()>,
    pub position: PositionBehavior,
    pub position_calls: Mutex<Vec<PositionOptions>>,
}

impl FakeLocation {
    pub fn granted(lat: f64, lon: f64) -> Self {
        Self {
            available: true,
            permission: Ok(PermissionStatus::Granted),
            position: PositionBehavior::Fixed(LocationCoordinate::new(lat, lon)),
            position_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_permission(status: PermissionStatus) -> Self {
        Self {
            permission: Ok(status),
            ..Self::granted(0.0, 0.0)
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::granted(0.0, 0.0)
        }
    }
}

#[async_trait]
impl LocationProvider for FakeLocation {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        self.permission
            .map_err(|_| LocationError::Position("permission plugin failed".to_string()))
    }

    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> Result<LocationCoordinate, LocationError> {
        self.position_calls.lock().unwrap().push(options);
        match &self.position {
            PositionBehavior::Fixed(c) => Ok(*c),
            PositionBehavior::Fails => Err(LocationError::Position("no fix".to_string())),
            PositionBehavior::Hangs => std::future::pending().await,
        }
    }
}

pub fn make_state(
    server: &str,
    renderer: Arc<RecordingRenderer>,
    location: Arc<dyn LocationProvider>,
) -> SharedState {
    let config = DashboardConfig::for_server(server).unwrap();
    Arc::new(DashboardState::new(config, renderer, location))
}

pub fn make_state_with_config(
    config: DashboardConfig,
    renderer: Arc<RecordingRenderer>,
    location: Arc<dyn LocationProvider>,
) -> SharedState {
    Arc::new(DashboardState::new(config, renderer, location))
}
