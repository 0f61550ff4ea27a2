use async_trait::async_trait;
use std::time::Duration;

use crate::models::LocationCoordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    /// Granted with restrictions (e.g. approximate location only).
    Limited,
    Prompt,
    Denied,
}

impl PermissionStatus {
    pub fn allows_position(self) -> bool {
        matches!(self, PermissionStatus::Granted | PermissionStatus::Limited)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("location services unavailable")]
    Unavailable,

    #[error("location permission not granted ({0:?})")]
    PermissionDenied(PermissionStatus),

    #[error("position request timed out after {0:?}")]
    Timeout(Duration),

    #[error("position unavailable: {0}")]
    Position(String),
}

/// Platform permission and positioning facility.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn is_available(&self) -> bool;
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError>;
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> Result<LocationCoordinate, LocationError>;
}

/// Provider backed by command-line settings: reports a fixed position, denies
/// permission when asked to, and is unavailable when no position is configured.
pub struct StaticLocationProvider {
    position: Option<LocationCoordinate>,
    deny: bool,
}

impl StaticLocationProvider {
    pub fn new(position: Option<LocationCoordinate>, deny: bool) -> Self {
        Self { position, deny }
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    fn is_available(&self) -> bool {
        self.position.is_some() || self.deny
    }

    async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        if self.deny {
            Ok(PermissionStatus::Denied)
        } else {
            Ok(PermissionStatus::Granted)
        }
    }

    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<LocationCoordinate, LocationError> {
        self.position
            .ok_or_else(|| LocationError::Position("no position configured".to_string()))
    }
}
