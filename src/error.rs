#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error! status: {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Push channel is already running")]
    AlreadyRunning,
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(" - {}", d),
        _ => String::new(),
    }
}

impl ClientError {
    /// Pass 2xx responses through; turn anything else into `Status`, keeping the
    /// server's `detail` field when the body carries one.
    pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| match body.get("detail") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) if !other.is_null() => Some(other.to_string()),
                _ => None,
            });
        Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
