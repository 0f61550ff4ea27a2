//! Road advisory: location acquisition followed by the weather conditions call.
//!
//! Location is a chain of fallible steps (availability, permission, position).
//! The first failing step ends the chain and the advisory is requested for the
//! server's default location instead; the endpoint is always called.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};
use url::Url;

use crate::config::DashboardConfig;
use crate::error::ClientError;
use crate::location::{LocationError, LocationProvider, PositionOptions};
use crate::models::{AdvisoryResult, LocationCoordinate};
use crate::render::{Control, ControlGuard, StatusArea};
use crate::state::SharedState;

pub const DEFAULT_LOCATION_TEXT: &str = "Location unavailable. Using default location.";

pub struct AdvisoryFetcher {
    client: reqwest::Client,
    url: String,
    location: Arc<dyn LocationProvider>,
    position_timeout: Duration,
}

impl AdvisoryFetcher {
    pub fn new(
        client: reqwest::Client,
        config: &DashboardConfig,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            client,
            url: config.advisory_url(),
            location,
            position_timeout: config.position_timeout,
        }
    }

    pub fn from_state(state: &SharedState) -> Self {
        Self::new(
            state.http_client.clone(),
            &state.config,
            state.location.clone(),
        )
    }

    pub async fn acquire_location(&self) -> Result<LocationCoordinate, LocationError> {
        if !self.location.is_available() {
            return Err(LocationError::Unavailable);
        }

        let status = self.location.request_permission().await?;
        if !status.allows_position() {
            return Err(LocationError::PermissionDenied(status));
        }

        let options = PositionOptions {
            high_accuracy: false,
            timeout: self.position_timeout,
        };
        timeout(self.position_timeout, self.location.current_position(options))
            .await
            .map_err(|_| LocationError::Timeout(self.position_timeout))?
    }

    /// Call the advisory endpoint; without coordinates the server picks its default location.
    pub async fn fetch(
        &self,
        coords: Option<LocationCoordinate>,
    ) -> Result<AdvisoryResult, ClientError> {
        let url = advisory_request_url(&self.url, coords)?;
        let response = ClientError::check_status(self.client.get(url).send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Endpoint URL with `lat`/`lon` appended when a position is known.
/// Coordinates keep their decimal point (`37.0`, not `37`).
pub fn advisory_request_url(
    base: &str,
    coords: Option<LocationCoordinate>,
) -> Result<Url, ClientError> {
    let mut url =
        Url::parse(base).map_err(|e| ClientError::InvalidConfig(format!("advisory URL: {}", e)))?;
    if let Some(c) = coords {
        url.query_pairs_mut()
            .append_pair("lat", &format!("{:?}", c.latitude))
            .append_pair("lon", &format!("{:?}", c.longitude));
    }
    Ok(url)
}

/// Acquire a location (or fall back to the default), fetch the advisory and
/// render it. The advisory button is disabled for the whole chain.
pub async fn acquire_location_then_fetch(
    state: &SharedState,
) -> Result<AdvisoryResult, ClientError> {
    let renderer = state.renderer.as_ref();
    let _guard = ControlGuard::disable(renderer, Control::AdvisoryButton);
    let fetcher = AdvisoryFetcher::from_state(state);

    renderer.render_status(StatusArea::Advisory, "Requesting location...");
    let coords = match fetcher.acquire_location().await {
        Ok(c) => {
            info!(lat = c.latitude, lon = c.longitude, "Location acquired");
            Some(c)
        }
        Err(e) => {
            info!("Falling back to default location: {}", e);
            renderer.render_status(StatusArea::Advisory, DEFAULT_LOCATION_TEXT);
            None
        }
    };

    renderer.render_status(StatusArea::Advisory, "Fetching road conditions...");
    match fetcher.fetch(coords).await {
        Ok(advisory) => {
            info!(
                location = %advisory.location_used,
                safe_speed_kmh = advisory.safe_speed_kmh,
                "Advisory updated"
            );
            renderer.render_advisory(&advisory);
            renderer.render_status(
                StatusArea::Advisory,
                &format!("Conditions for {}", advisory.location_used),
            );
            Ok(advisory)
        }
        Err(e) => {
            error!(status = ?e.status(), "Failed to fetch advisory: {}", e);
            let message = format!("Error fetching conditions: {}", e);
            renderer.render_advisory_error(&message);
            renderer.render_status(StatusArea::Advisory, &message);
            Err(e)
        }
    }
}
