//! Remote action gateway.
//!
//! Turns domain actions into HTTP calls and maps every transport/HTTP
//! outcome into exactly one [`DomainError`]. The mapping is total and never
//! panics; callers recover by retrying through the offline queue or by
//! prompting the user.

use std::future::Future;

use reqwest::Client;

use crate::action::DoseAction;
use crate::error::DomainError;

/// Anything that can deliver a [`DoseAction`] to the remote service. The
/// offline queue and dispatcher are generic over this seam so tests can
/// substitute a scripted gateway.
pub trait ActionGateway: Send + Sync {
    fn submit(
        &self,
        action: &DoseAction,
    ) -> impl Future<Output = Result<(), DomainError>> + Send;
}

/// HTTP gateway to the companion backend.
pub struct RemoteActionGateway {
    client: Client,
    base_url: String,
    device_token: String,
}

impl RemoteActionGateway {
    pub fn new(base_url: &str, device_token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            device_token: device_token.to_string(),
        }
    }
}

impl ActionGateway for RemoteActionGateway {
    async fn submit(&self, action: &DoseAction) -> Result<(), DomainError> {
        let url = format!("{}/v1/dose-actions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Device-Token", &self.device_token)
            .json(action)
            .send()
            .await
            .map_err(|e| DomainError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DomainError::Decoding(e.to_string()))?;
        map_response(status, &body)
    }
}

/// Map an HTTP status and response body to the domain outcome. Total: every
/// (status, body) combination produces exactly one result.
pub fn map_response(status: u16, body: &[u8]) -> Result<(), DomainError> {
    match status {
        200..=299 => Ok(()),
        300..=399 => Err(DomainError::InvalidResponse),
        401 => Err(DomainError::DeviceNotRegistered),
        409 => Err(DomainError::AlreadyTaken),
        422 => Err(map_unprocessable(body)),
        429 => Err(DomainError::RateLimit),
        other => Err(DomainError::Unknown(format!("HTTP {other}"))),
    }
}

/// Disambiguate a 422 by the `error_code` field in the body. A malformed or
/// missing body falls back to `WindowExceeded` -- the documented default,
/// deliberately not `Unknown`, so the caller always gets a dosing-relevant
/// rejection even from a truncated response.
fn map_unprocessable(body: &[u8]) -> DomainError {
    let code = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error_code")
                .and_then(|code| code.as_str())
                .map(str::to_owned)
        });
    match code.as_deref() {
        Some("snooze_limit") => DomainError::SnoozeLimit,
        Some("dose1_required") => DomainError::Dose1Required,
        _ => DomainError::WindowExceeded,
    }
}
