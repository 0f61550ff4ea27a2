use tracing::{error, info};
use url::Url;

use crate::config::DashboardConfig;
use crate::error::ClientError;
use crate::models::HistoryRecord;
use crate::render::{Control, ControlGuard, StatusArea};
use crate::state::SharedState;

pub const NO_HISTORY_TEXT: &str = "No crash history found.";

/// Pulls the durable crash log. Nothing is cached between calls.
pub struct HistoryFetcher {
    client: reqwest::Client,
    url: String,
    skip: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    Loaded(usize),
    Empty,
    Failed(String),
}

impl HistoryFetcher {
    pub fn new(client: reqwest::Client, config: &DashboardConfig) -> Self {
        Self {
            client,
            url: config.history_url(),
            skip: config.history_skip,
            limit: config.history_limit,
        }
    }

    pub fn from_state(state: &SharedState) -> Self {
        Self::new(state.http_client.clone(), &state.config)
    }

    pub async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, ClientError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| ClientError::InvalidConfig(format!("history URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(skip) = self.skip {
                query.append_pair("skip", &skip.to_string());
            }
            if let Some(limit) = self.limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let response = ClientError::check_status(self.client.get(url).send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Reload the history table. The history button stays disabled until the
/// call has finished, however it finished.
pub async fn load_history(state: &SharedState) -> HistoryOutcome {
    let renderer = state.renderer.as_ref();
    let _guard = ControlGuard::disable(renderer, Control::HistoryButton);
    renderer.render_status(StatusArea::History, "Loading history...");

    match HistoryFetcher::from_state(state).fetch_all().await {
        Ok(records) if records.is_empty() => {
            info!("Crash history is empty");
            renderer.render_history_table(&[]);
            renderer.render_status(StatusArea::History, NO_HISTORY_TEXT);
            HistoryOutcome::Empty
        }
        Ok(records) => {
            info!(count = records.len(), "Crash history loaded");
            renderer.render_history_table(&records);
            renderer.render_status(
                StatusArea::History,
                &format!("Loaded {} crash records.", records.len()),
            );
            HistoryOutcome::Loaded(records.len())
        }
        Err(e) => {
            error!(status = ?e.status(), "Failed to load crash history: {}", e);
            let message = format!("Error loading history: {}", e);
            renderer.render_history_table(&[]);
            renderer.render_status(StatusArea::History, &message);
            HistoryOutcome::Failed(message)
        }
    }
}
